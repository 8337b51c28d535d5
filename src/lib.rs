pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use crate::core::{etl::EtlEngine, pipeline::RollupPipeline};
pub use utils::error::{Result, RollupError};
