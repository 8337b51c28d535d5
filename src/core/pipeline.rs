use crate::core::{
    AggregateRow, AggregateValue, ConfigProvider, Pipeline, RawRecord, Storage, TransformResult,
};
use crate::utils::error::{Result, RollupError};
use std::collections::BTreeMap;

pub struct RollupPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> RollupPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

impl<S: Storage, C: ConfigProvider> Pipeline for RollupPipeline<S, C> {
    fn extract(&self) -> Result<Vec<RawRecord>> {
        let input_path = self.config.input_path();
        tracing::info!("🚀 Starting extraction from: {}", input_path);

        let data = self.storage.read_file(input_path).map_err(|e| match e {
            RollupError::IoError(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                RollupError::SourceNotFound {
                    path: input_path.to_string(),
                }
            }
            other => other,
        })?;

        let mut reader = csv::ReaderBuilder::new().from_reader(data.as_slice());

        // 先驗證表頭再碰任何資料列，欄名區分大小寫
        let headers = reader.headers()?.clone();
        let category_idx = headers
            .iter()
            .position(|h| h == "Category")
            .ok_or_else(|| RollupError::SchemaError {
                column: "Category".to_string(),
            })?;
        let value_idx = headers
            .iter()
            .position(|h| h == "Value")
            .ok_or_else(|| RollupError::SchemaError {
                column: "Value".to_string(),
            })?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            // 其他欄位一律忽略
            records.push(RawRecord {
                category: row.get(category_idx).unwrap_or_default().to_string(),
                value: row.get(value_idx).unwrap_or_default().to_string(),
            });
        }

        tracing::debug!("Extracted {} raw records", records.len());
        Ok(records)
    }

    fn transform(&self, data: Vec<RawRecord>) -> Result<TransformResult> {
        let input_records = data.len();
        tracing::info!("🔧 Cleaning and aggregating {} records", input_records);

        // 清洗：解析失敗的列丟棄並計數，不視為錯誤
        let mut clean_records = Vec::with_capacity(input_records);
        for raw in &data {
            match raw.clean() {
                Some(clean) => clean_records.push(clean),
                None => {
                    tracing::debug!(
                        "Dropping row with non-numeric Value: category='{}', value='{}'",
                        raw.category,
                        raw.value
                    );
                }
            }
        }
        let dropped_records = input_records - clean_records.len();
        if dropped_records > 0 {
            tracing::warn!(
                "⚠️ Dropped {} row(s) with non-numeric Value",
                dropped_records
            );
        }

        // 分組加總；BTreeMap 保證分類遞增排序
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for record in clean_records {
            *totals.entry(record.category).or_insert(0.0) += record.value;
        }

        let rows = totals
            .into_iter()
            .map(|(category, value)| {
                // 清洗後的資料加總不可能出現 NaN
                debug_assert!(!value.is_nan());
                AggregateRow {
                    category,
                    value: AggregateValue::Number(value),
                }
            })
            .collect();

        Ok(TransformResult {
            rows,
            input_records,
            dropped_records,
        })
    }

    fn load(&self, result: TransformResult) -> Result<String> {
        let json = serde_json::to_string_pretty(&result.rows)?;

        if let Some(output_path) = self.config.output_path() {
            self.storage.write_file(output_path, json.as_bytes())?;
            tracing::info!("💾 Aggregate saved to: {}", output_path);
        }

        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockStorage {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Mutex::new(HashMap::new()),
            }
        }

        fn with_file(path: &str, content: &str) -> Self {
            let storage = Self::new();
            storage
                .files
                .lock()
                .unwrap()
                .insert(path.to_string(), content.as_bytes().to_vec());
            storage
        }

        fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().unwrap().get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
                RollupError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        input_path: String,
        output_path: Option<String>,
    }

    impl MockConfig {
        fn new(input_path: &str) -> Self {
            Self {
                input_path: input_path.to_string(),
                output_path: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            &self.input_path
        }

        fn output_path(&self) -> Option<&str> {
            self.output_path.as_deref()
        }
    }

    fn pipeline_over(content: &str) -> RollupPipeline<MockStorage, MockConfig> {
        let storage = MockStorage::with_file("data.csv", content);
        RollupPipeline::new(storage, MockConfig::new("data.csv"))
    }

    #[test]
    fn test_extract_reads_rows_in_order() {
        let pipeline = pipeline_over("Category,Value\nA,100\nB,150\nA,50\n");

        let records = pipeline.extract().unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].category, "A");
        assert_eq!(records[0].value, "100");
        assert_eq!(records[1].category, "B");
        assert_eq!(records[2].value, "50");
    }

    #[test]
    fn test_extract_missing_source_file() {
        let storage = MockStorage::new();
        let pipeline = RollupPipeline::new(storage, MockConfig::new("missing.csv"));

        let err = pipeline.extract().unwrap_err();

        assert!(matches!(
            err,
            RollupError::SourceNotFound { ref path } if path == "missing.csv"
        ));
    }

    #[test]
    fn test_extract_missing_category_column() {
        let pipeline = pipeline_over("Name,Value\nA,100\n");

        let err = pipeline.extract().unwrap_err();

        assert!(matches!(
            err,
            RollupError::SchemaError { ref column } if column == "Category"
        ));
    }

    #[test]
    fn test_extract_missing_value_column() {
        let pipeline = pipeline_over("Category,Amount\nA,100\n");

        let err = pipeline.extract().unwrap_err();

        assert!(matches!(
            err,
            RollupError::SchemaError { ref column } if column == "Value"
        ));
    }

    #[test]
    fn test_extract_column_names_are_case_sensitive() {
        let pipeline = pipeline_over("category,value\nA,100\n");

        let err = pipeline.extract().unwrap_err();

        assert!(matches!(err, RollupError::SchemaError { .. }));
    }

    #[test]
    fn test_extract_ignores_extra_columns() {
        let pipeline = pipeline_over("Id,Category,Notes,Value\n1,A,first,100\n2,B,second,150\n");

        let records = pipeline.extract().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category, "A");
        assert_eq!(records[0].value, "100");
        assert_eq!(records[1].category, "B");
        assert_eq!(records[1].value, "150");
    }

    #[test]
    fn test_extract_malformed_csv_is_a_parse_error() {
        // 欄位數不一致的資料列
        let pipeline = pipeline_over("Category,Value\nA,100,extra\n");

        let err = pipeline.extract().unwrap_err();

        assert!(matches!(err, RollupError::CsvError(_)));
    }

    #[test]
    fn test_transform_groups_and_sums_by_category() {
        let pipeline = pipeline_over("");
        let data = vec![
            raw("A", "100"),
            raw("B", "150"),
            raw("A", "50"),
            raw("C", "200"),
            raw("B", "75"),
        ];

        let result = pipeline.transform(data).unwrap();

        assert_eq!(result.input_records, 5);
        assert_eq!(result.dropped_records, 0);
        assert_eq!(result.rows.len(), 3);
        assert_row(&result.rows[0], "A", 150.0);
        assert_row(&result.rows[1], "B", 225.0);
        assert_row(&result.rows[2], "C", 200.0);
    }

    #[test]
    fn test_transform_orders_categories_ascending() {
        let pipeline = pipeline_over("");
        let data = vec![raw("zeta", "1"), raw("alpha", "2"), raw("mid", "3")];

        let result = pipeline.transform(data).unwrap();

        let categories: Vec<&str> = result.rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_transform_drops_non_numeric_rows() {
        let pipeline = pipeline_over("");
        let data = vec![raw("A", "100"), raw("D", "abc"), raw("B", "150")];

        let result = pipeline.transform(data).unwrap();

        assert_eq!(result.input_records, 3);
        assert_eq!(result.dropped_records, 1);
        assert!(result.rows.iter().all(|r| r.category != "D"));
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_transform_dropped_count_matches_row_difference() {
        let pipeline = pipeline_over("");
        let data = vec![
            raw("A", "1"),
            raw("A", "x"),
            raw("B", "y"),
            raw("B", "2"),
            raw("C", ""),
        ];

        let result = pipeline.transform(data).unwrap();

        // 丟棄數 = 輸入列數 - 清洗後列數（2 列存活：A 一列、B 一列）
        assert_eq!(result.input_records, 5);
        assert_eq!(result.dropped_records, 3);
        assert_row(&result.rows[0], "A", 1.0);
        assert_row(&result.rows[1], "B", 2.0);
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_transform_empty_input() {
        let pipeline = pipeline_over("");

        let result = pipeline.transform(Vec::new()).unwrap();

        assert_eq!(result.rows.len(), 0);
        assert_eq!(result.input_records, 0);
        assert_eq!(result.dropped_records, 0);
    }

    #[test]
    fn test_transform_sums_decimals_and_negatives() {
        let pipeline = pipeline_over("");
        let data = vec![raw("A", "10.5"), raw("A", "-0.5"), raw("A", "2")];

        let result = pipeline.transform(data).unwrap();

        assert_row(&result.rows[0], "A", 12.0);
    }

    #[test]
    fn test_transform_never_emits_null_or_nan() {
        let pipeline = pipeline_over("");
        let data = vec![
            raw("A", "1e308"),
            raw("A", "-1e308"),
            raw("B", "NaN"),
            raw("B", "5"),
        ];

        let result = pipeline.transform(data).unwrap();

        for row in &result.rows {
            match &row.value {
                AggregateValue::Number(v) => assert!(!v.is_nan()),
                AggregateValue::Null => panic!("aggregation must not produce null"),
            }
        }
    }

    #[test]
    fn test_load_serializes_pretty_json_with_stable_keys() {
        let pipeline = pipeline_over("");
        let result = TransformResult {
            rows: vec![
                AggregateRow {
                    category: "A".to_string(),
                    value: AggregateValue::Number(150.0),
                },
                AggregateRow {
                    category: "B".to_string(),
                    value: AggregateValue::Number(225.0),
                },
            ],
            input_records: 4,
            dropped_records: 0,
        };

        let json = pipeline.load(result).unwrap();

        let expected = "[\n  {\n    \"Category\": \"A\",\n    \"Value\": 150\n  },\n  {\n    \"Category\": \"B\",\n    \"Value\": 225\n  }\n]";
        assert_eq!(json, expected);
    }

    #[test]
    fn test_load_empty_rows_is_empty_json_array() {
        let pipeline = pipeline_over("");
        let result = TransformResult {
            rows: Vec::new(),
            input_records: 0,
            dropped_records: 0,
        };

        let json = pipeline.load(result).unwrap();

        assert_eq!(json, "[]");
    }

    #[test]
    fn test_load_writes_output_file_when_configured() {
        let storage = MockStorage::new();
        let config = MockConfig {
            input_path: "data.csv".to_string(),
            output_path: Some("aggregate.json".to_string()),
        };
        let pipeline = RollupPipeline::new(storage, config);
        let result = TransformResult {
            rows: vec![AggregateRow {
                category: "A".to_string(),
                value: AggregateValue::Number(1.0),
            }],
            input_records: 1,
            dropped_records: 0,
        };

        let json = pipeline.load(result).unwrap();

        let written = pipeline.storage.get_file("aggregate.json").unwrap();
        assert_eq!(written, json.as_bytes());
    }

    #[test]
    fn test_full_pipeline_end_to_end() {
        let pipeline = pipeline_over("Category,Value\nA,100\nB,150\nA,50\nC,200\nB,75\n");

        let records = pipeline.extract().unwrap();
        let result = pipeline.transform(records).unwrap();
        let json = pipeline.load(result).unwrap();

        let rows: Vec<AggregateRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(rows.len(), 3);
        assert_row(&rows[0], "A", 150.0);
        assert_row(&rows[1], "B", 225.0);
        assert_row(&rows[2], "C", 200.0);
    }

    fn raw(category: &str, value: &str) -> RawRecord {
        RawRecord {
            category: category.to_string(),
            value: value.to_string(),
        }
    }

    fn assert_row(row: &AggregateRow, category: &str, value: f64) {
        assert_eq!(row.category, category);
        assert_eq!(row.value, AggregateValue::Number(value));
    }
}
