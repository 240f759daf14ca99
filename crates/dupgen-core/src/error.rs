//! Error types and exit codes for dupgen
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (transport, packaging, I/O)
//! - 2: Usage error (bad flags/args, invalid request)
//! - 3: Data/configuration error (missing or invalid config, unreadable input)
//!
//! Per-class fetch failures are not errors at this level: they are recovered
//! and reported through [`crate::source::FetchReport`].

mod macros;

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/configuration error (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during dupgen operations
#[derive(Error, Debug)]
pub enum DupError {
    // Usage errors (exit code 2)
    #[error("--format may only be specified once")]
    DuplicateFormat,

    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    // Data/configuration errors (exit code 3)
    #[error("invalid configuration in {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("invalid request file {path:?}: {reason}")]
    InvalidRequest { path: PathBuf, reason: String },

    #[error("invalid records file {path:?}: {reason}")]
    InvalidRecords { path: PathBuf, reason: String },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("failed to build package: {0}")]
    Packaging(String),

    #[error("failed to {operation}: {reason}")]
    FailedOperation { operation: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl DupError {
    /// Create an error for an invalid value or argument
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        DupError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for a failed HTTP exchange
    pub fn transport(url: impl Into<String>, error: impl std::fmt::Display) -> Self {
        DupError::Transport {
            url: url.into(),
            reason: error.to_string(),
        }
    }

    /// Create an error for a failed archive operation
    pub fn packaging(operation: &str, error: impl std::fmt::Display) -> Self {
        DupError::Packaging(format!("{}: {}", operation, error))
    }

    /// Create an error for a failed operation
    pub fn failed(operation: &str, error: impl std::fmt::Display) -> Self {
        DupError::FailedOperation {
            operation: operation.to_string(),
            reason: error.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            DupError::DuplicateFormat
            | DupError::UsageError(_)
            | DupError::InvalidValue { .. } => ExitCode::Usage,

            DupError::InvalidConfig { .. }
            | DupError::MissingConfig(_)
            | DupError::InvalidRequest { .. }
            | DupError::InvalidRecords { .. } => ExitCode::Data,

            DupError::Io(_)
            | DupError::Json(_)
            | DupError::Auth(_)
            | DupError::Transport { .. }
            | DupError::Packaging(_)
            | DupError::FailedOperation { .. }
            | DupError::Other(_) => ExitCode::Failure,
        }
    }

    /// Stable error type identifier used in JSON output
    pub fn error_type(&self) -> &'static str {
        match self {
            DupError::DuplicateFormat => "duplicate_format",
            DupError::UsageError(_) => "usage_error",
            DupError::InvalidValue { .. } => "invalid_value",
            DupError::InvalidConfig { .. } => "invalid_config",
            DupError::MissingConfig(_) => "missing_config",
            DupError::InvalidRequest { .. } => "invalid_request",
            DupError::InvalidRecords { .. } => "invalid_records",
            DupError::Io(_) => "io_error",
            DupError::Json(_) => "json_error",
            DupError::Auth(_) => "auth_failed",
            DupError::Transport { .. } => "transport_error",
            DupError::Packaging(_) => "packaging_failed",
            DupError::FailedOperation { .. } => "failed_operation",
            DupError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for dupgen operations
pub type Result<T> = std::result::Result<T, DupError>;
