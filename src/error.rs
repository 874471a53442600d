//! Error types for td
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, rejected import)
//! - 4: Operation failed (storage, serialization, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the td CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for td operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Import rejected: {0}")]
    ImportRejected(String),

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("No data directory available on this platform")]
    NoDataDir,

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::ImportRejected(_)
            | Error::ConfirmationRequired(_)
            | Error::NoDataDir => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output, where an error has any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::LockFailed(path) => Some(serde_json::json!({
                "lock_path": path.to_string_lossy(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for td operations
pub type Result<T> = std::result::Result<T, Error>;
