//! Error types for mtkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for mtkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Malformed request: {0}")]
    Parse(#[from] ParseError),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Store error: {0}")]
    Store(String),

    #[error("Store header could not be encoded: {0}")]
    Header(#[from] bincode::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Error in {op}. Cause: {source}")]
    Network {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// Wrap a socket-level failure with the name of the operation that failed
    pub fn network(op: &'static str, source: std::io::Error) -> Self {
        KvError::Network { op, source }
    }
}

/// Reasons a request message is rejected by the parser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown operation {0:?}")]
    UnknownOperation(String),

    #[error("missing key")]
    MissingKey,

    #[error("missing value")]
    MissingValue,
}
