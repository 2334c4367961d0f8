//! Error types for redline
//!
//! Provides a unified error type for all operations.
//!
//! ## Propagation
//! - Connection-fatal: `Io`, `Connection`, `Protocol`, `Correlation`.
//!   The connection is torn down and every pending command fails with
//!   `ConnectionClosed`.
//! - Command-local: `Server`, `Transcoder`, `Timeout`. Only the one
//!   command's result slot sees them.

use thiserror::Error;

/// Result type alias using RedlineError
pub type Result<T> = std::result::Result<T, RedlineError>;

/// Unified error type for redline operations
#[derive(Debug, Error)]
pub enum RedlineError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    /// Connect, AUTH or SELECT failed while establishing the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// The connection went away before this command received its reply
    #[error("Connection closed")]
    ConnectionClosed,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Inbound bytes do not form a valid reply
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A reply arrived with no outstanding command to match it
    #[error("Correlation error: {0}")]
    Correlation(String),

    // -------------------------------------------------------------------------
    // Per-command Errors
    // -------------------------------------------------------------------------
    /// The server answered with an error reply
    #[error("Server error: {0}")]
    Server(String),

    /// The reply payload could not be decoded by the selected transcoder
    #[error("Transcoder error: {0}")]
    Transcoder(String),

    /// Waiting on a result slot exceeded its deadline
    #[error("Timed out waiting for reply")]
    Timeout,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RedlineError {
    /// Whether this error ends all processing on the connection that raised it
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            RedlineError::Io(_)
                | RedlineError::Connection(_)
                | RedlineError::Protocol(_)
                | RedlineError::Correlation(_)
        )
    }
}

impl From<bincode::Error> for RedlineError {
    fn from(err: bincode::Error) -> Self {
        RedlineError::Transcoder(err.to_string())
    }
}
