use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 跑完整條管線，回傳 JSON 文字；致命錯誤直接中止
    pub fn run(&self) -> Result<String> {
        tracing::info!("Starting rollup process...");

        // Extract
        let raw_data = self.pipeline.extract()?;
        tracing::info!("Extracted {} records", raw_data.len());
        self.monitor.log_stats("Extract");

        // Transform
        let transform_result = self.pipeline.transform(raw_data)?;
        tracing::info!(
            "Aggregated into {} categories ({} rows dropped)",
            transform_result.rows.len(),
            transform_result.dropped_records
        );
        self.monitor.log_stats("Transform");

        // Load
        let json = self.pipeline.load(transform_result)?;
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(json)
    }
}
