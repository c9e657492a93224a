use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage {operation} failed for {location}: {message}")]
    StorageError {
        operation: String,
        location: String,
        message: String,
    },

    #[error("Trigger event could not be decoded: {message}")]
    TriggerError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("No valid last_review date among {survivors} price-filter survivors; cannot impute missing dates")]
    NoValidDateAnchor { survivors: usize },

    #[error("Malformed record at row {row}, field '{field}': {reason}")]
    MalformedRecord {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("Batch reached {rows} rows, exceeding the limit of {limit}")]
    BatchTooLarge { rows: usize, limit: usize },

    #[error("Batch {batch_id} failed: {source}")]
    BatchFailed {
        batch_id: String,
        #[source]
        source: Box<EtlError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Storage,
    Trigger,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    /// Wraps a normalization failure with the identifier of the batch it came from.
    pub fn for_batch(self, batch_id: impl Into<String>) -> Self {
        match self {
            EtlError::BatchFailed { .. } => self,
            other => EtlError::BatchFailed {
                batch_id: batch_id.into(),
                source: Box::new(other),
            },
        }
    }

    /// The error this one wraps, or itself.
    pub fn root(&self) -> &EtlError {
        match self {
            EtlError::BatchFailed { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::StorageError { .. } => ErrorCategory::Storage,
            EtlError::TriggerError { .. } => ErrorCategory::Trigger,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::NoValidDateAnchor { .. }
            | EtlError::MalformedRecord { .. }
            | EtlError::BatchTooLarge { .. } => ErrorCategory::Data,
            EtlError::IoError(_) => ErrorCategory::System,
            EtlError::BatchFailed { source, .. } => source.category(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Transient: the same batch may succeed on retry
            EtlError::StorageError { .. } => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            EtlError::BatchFailed { source, .. } => source.severity(),
            _ => ErrorSeverity::High,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.root() {
            EtlError::CsvError(_) => {
                "Check that the input is a UTF-8 CSV file with a header row".to_string()
            }
            EtlError::IoError(_) => "Check file permissions and available disk space".to_string(),
            EtlError::SerializationError(_) => "Check the JSON payload structure".to_string(),
            EtlError::StorageError { location, .. } => format!(
                "Verify that {} exists and that the credentials in use can access it",
                location
            ),
            EtlError::TriggerError { .. } => {
                "Send an S3 event notification or a payload with 'bucket' and 'key'".to_string()
            }
            EtlError::ConfigError { .. } | EtlError::ConfigValidationError { .. } => {
                "Review the configuration file and environment variables".to_string()
            }
            EtlError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            EtlError::NoValidDateAnchor { .. } => {
                "Ensure at least one listing with a positive price has a last_review in the configured date format".to_string()
            }
            EtlError::MalformedRecord { row, field, .. } => {
                format!("Fix the '{}' value in data row {} of the source file", field, row)
            }
            EtlError::BatchTooLarge { limit, .. } => format!(
                "Split the file into batches of at most {} rows or raise max_batch_rows",
                limit
            ),
            EtlError::BatchFailed { .. } => "Inspect the logs for this batch".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::BatchFailed { batch_id, source } => {
                format!("Batch {}: {}", batch_id, source.user_friendly_message())
            }
            EtlError::NoValidDateAnchor { .. } => {
                "No listing has a usable last_review date, so missing dates cannot be filled"
                    .to_string()
            }
            EtlError::MalformedRecord { row, field, .. } => {
                format!("Row {} has an unusable '{}' value", row, field)
            }
            EtlError::StorageError {
                operation,
                location,
                ..
            } => format!("Could not {} {}", operation, location),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_batch_wraps_once() {
        let err = EtlError::NoValidDateAnchor { survivors: 3 }
            .for_batch("s3://raw/listings.csv")
            .for_batch("other");

        match &err {
            EtlError::BatchFailed { batch_id, source } => {
                assert_eq!(batch_id, "s3://raw/listings.csv");
                assert!(matches!(**source, EtlError::NoValidDateAnchor { survivors: 3 }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.to_string().contains("s3://raw/listings.csv"));
    }

    #[test]
    fn test_storage_errors_are_retryable() {
        let err = EtlError::StorageError {
            operation: "read".to_string(),
            location: "s3://raw/listings.csv".to_string(),
            message: "timeout".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert!(err.recovery_suggestion().contains("s3://raw/listings.csv"));
    }
}
