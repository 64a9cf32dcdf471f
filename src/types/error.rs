use anyhow::Error;
use thiserror::Error;

use crate::types::DeletionOutcome;

/// Application-level error types for s3cleaner-rs.
///
/// Errors travel inside `anyhow::Error` and are recovered with
/// `downcast_ref`. Listing failures attach `List` as context so the
/// underlying SDK error stays in the chain.
///
/// ## Exit Codes
///
/// - 0: Cancelled (declined confirmation, Ctrl-C)
/// - 1: Auth, List, DeleteItem, ConnectionLost, InputUnavailable
/// - 2: InvalidConfig
/// - 3: PartialFailure (some objects deleted, some failed)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum S3cleanerError {
    /// Credential or session establishment failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Enumeration of a bucket failed; no partial inventory is returned.
    #[error("Unable to list objects from bucket {bucket}")]
    List { bucket: String },

    /// A single object failed to delete.
    #[error("{code}: {message}")]
    DeleteItem { code: String, message: String },

    /// Credentials stopped working in the middle of a deletion batch.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Invalid arguments or configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation cancelled by user.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// An answer was required but no one can give it (no terminal, closed
    /// stdin).
    #[error("Interactive input unavailable: {0}")]
    InputUnavailable(String),

    /// Some deletions failed.
    #[error("Partial failure: {deleted} deleted, {failed} failed")]
    PartialFailure { deleted: u64, failed: u64 },
}

impl S3cleanerError {
    pub fn exit_code(&self) -> i32 {
        match self {
            S3cleanerError::Cancelled => 0,
            S3cleanerError::InvalidConfig(_) => 2,
            S3cleanerError::PartialFailure { .. } => 3,
            _ => 1,
        }
    }

    /// Whether this error ends a deletion batch early.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(
            self,
            S3cleanerError::ConnectionLost(_) | S3cleanerError::Cancelled
        )
    }

    /// Whether the service reported the object (or version) as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            S3cleanerError::DeleteItem { code, .. } => is_not_found_code(code),
            _ => false,
        }
    }
}

const NOT_FOUND_ERROR_CODES: &[&str] = &["NoSuchKey", "NoSuchVersion", "NotFound"];

pub fn is_not_found_code(code: &str) -> bool {
    NOT_FOUND_ERROR_CODES.contains(&code)
}

/// A deletion batch stopped before every item was attempted.
///
/// `completed` holds the outcome of every item that was attempted, in input
/// order. Items that were never started have no outcome.
#[derive(Error, Debug)]
#[error("deletion batch aborted after {} item(s): {cause}", .completed.len())]
pub struct BatchAborted {
    pub cause: S3cleanerError,
    pub completed: Vec<DeletionOutcome>,
}

pub fn is_cancelled_error(e: &Error) -> bool {
    if let Some(err) = e.downcast_ref::<S3cleanerError>() {
        return *err == S3cleanerError::Cancelled;
    }
    if let Some(aborted) = e.downcast_ref::<BatchAborted>() {
        return aborted.cause == S3cleanerError::Cancelled;
    }
    false
}

/// Extract the exit code from an anyhow::Error, defaulting to 1.
pub fn exit_code_from_error(e: &Error) -> i32 {
    if let Some(err) = e.downcast_ref::<S3cleanerError>() {
        return err.exit_code();
    }
    if let Some(aborted) = e.downcast_ref::<BatchAborted>() {
        return aborted.cause.exit_code();
    }
    1
}
