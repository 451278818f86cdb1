use crate::domain::ports::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("A batch submission is already in progress")]
    SubmissionInProgress,
}

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Export,
    Concurrency,
}

/// 錯誤嚴重程度，CLI 依此決定退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl BulkError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BulkError::ConfigError { .. }
            | BulkError::InvalidConfigValueError { .. }
            | BulkError::MissingConfigError { .. }
            | BulkError::TomlError(_) => ErrorCategory::Configuration,
            BulkError::Transport(_) => ErrorCategory::Network,
            BulkError::ZipError(_)
            | BulkError::CsvError(_)
            | BulkError::IoError(_)
            | BulkError::SerializationError(_) => ErrorCategory::Export,
            BulkError::SubmissionInProgress => ErrorCategory::Concurrency,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Concurrency => ErrorSeverity::Medium,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Export => ErrorSeverity::Critical,
        }
    }

    /// 0 保留給成功的批次
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BulkError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            BulkError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            BulkError::SubmissionInProgress => {
                "Another batch is still being submitted".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the configuration file and command line flags",
            ErrorCategory::Network => "Check the backend URL and network connectivity",
            ErrorCategory::Export => "Check that the record directory exists and is writable",
            ErrorCategory::Concurrency => "Wait for the running batch to finish, then submit again",
        }
    }
}

pub type Result<T> = std::result::Result<T, BulkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = BulkError::MissingConfigError {
            field: "backend.base_url".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("backend.base_url"));
    }

    #[test]
    fn test_concurrent_submit_is_retryable() {
        let err = BulkError::SubmissionInProgress;
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.recovery_suggestion().contains("Wait"));
    }

    #[test]
    fn test_errors_never_exit_with_success_code() {
        let errors = [
            BulkError::SubmissionInProgress,
            BulkError::MissingConfigError {
                field: "backend.base_url".to_string(),
            },
            BulkError::Transport(TransportError::Timeout),
            BulkError::IoError(std::io::Error::other("disk full")),
        ];
        let codes: Vec<i32> = errors.iter().map(BulkError::exit_code).collect();
        assert_eq!(codes, vec![2, 1, 2, 3]);
    }
}
