//! Error types for SeqLog
//!
//! Provides a unified error type for all operations. A key that does not
//! exist is never an error: lookups report it as `Ok(None)`.

use thiserror::Error;

/// Result type alias using SeqLogError
pub type Result<T> = std::result::Result<T, SeqLogError>;

/// Unified error type for SeqLog operations
#[derive(Debug, Error)]
pub enum SeqLogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An append failed and truncating back to the previous end of the log
    /// failed as well. The log file needs external repair.
    #[error("Append failed ({write}) and rollback to previous length failed ({truncate})")]
    Rollback {
        write: std::io::Error,
        truncate: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: String },

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The last record already holds `u64::MAX`; no further key exists.
    #[error("Key space exhausted after key {last}")]
    KeySpaceExhausted { last: u64 },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SeqLogError {
    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        SeqLogError::MalformedRecord {
            offset,
            reason: reason.into(),
        }
    }
}
