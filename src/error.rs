//! Error types for timing and interception
//!
//! Misuse of the toolkit fails fast: a stamp that was never started, a
//! wrapped slot that had no original, or a slot that does not exist are all
//! surfaced to the caller instead of being recovered.

use thiserror::Error;

/// Errors raised by the tracker, runner, method tables and interceptor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VlugError {
    #[error("stamp_end(\"{id}\") called without a matching stamp_start")]
    MissingStart { id: String },

    #[error("{object}.{method} is not callable (it did not exist when it was intercepted)")]
    NotCallable { object: String, method: String },

    #[error("{object} has no method named {method}")]
    MethodNotFound { object: String, method: String },

    #[error("iterations must be a positive integer, got {0}")]
    InvalidIterations(u64),

    #[error("invalid argument for {method}: {reason}")]
    InvalidArgument { method: String, reason: String },
}

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, VlugError>;
