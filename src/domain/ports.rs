use crate::domain::model::{RawRecord, TransformResult};
use crate::utils::error::Result;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> Option<&str>;
}

pub trait Pipeline {
    fn extract(&self) -> Result<Vec<RawRecord>>;
    fn transform(&self, data: Vec<RawRecord>) -> Result<TransformResult>;
    fn load(&self, result: TransformResult) -> Result<String>;
}
