use thiserror::Error;

#[derive(Error, Debug)]
pub enum RollupError {
    #[error("Source file not found: {path}")]
    SourceNotFound { path: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required column: {column}")]
    SchemaError { column: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Schema,
    Config,
    Io,
    Serialization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RollupError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RollupError::SourceNotFound { .. } | RollupError::CsvError(_) => ErrorCategory::Input,
            RollupError::SchemaError { .. } => ErrorCategory::Schema,
            RollupError::InvalidConfigValueError { .. } => ErrorCategory::Config,
            RollupError::IoError(_) => ErrorCategory::Io,
            RollupError::SerializationError(_) => ErrorCategory::Serialization,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RollupError::SourceNotFound { .. }
            | RollupError::CsvError(_)
            | RollupError::SchemaError { .. } => ErrorSeverity::High,
            RollupError::InvalidConfigValueError { .. } => ErrorSeverity::Medium,
            RollupError::IoError(_) | RollupError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RollupError::SourceNotFound { path } => {
                format!("Check that '{}' exists, or pass a different input path", path)
            }
            RollupError::CsvError(_) => {
                "Check that the input is comma-separated UTF-8 text with a consistent column count"
                    .to_string()
            }
            RollupError::SchemaError { column } => format!(
                "Add a '{}' column to the input header (names are case-sensitive)",
                column
            ),
            RollupError::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' argument and retry", field)
            }
            RollupError::IoError(_) => "Check filesystem permissions and free space".to_string(),
            RollupError::SerializationError(_) => {
                "Re-run with --verbose and report the log output".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RollupError::SourceNotFound { path } => format!("Input file '{}' was not found", path),
            RollupError::CsvError(e) => format!("The input could not be parsed as CSV: {}", e),
            RollupError::SchemaError { column } => {
                format!("The input is missing the required '{}' column", column)
            }
            RollupError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid '{}' argument: {}", field, reason)
            }
            RollupError::IoError(e) => format!("A file operation failed: {}", e),
            RollupError::SerializationError(e) => format!("Could not serialize the result: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, RollupError>;
