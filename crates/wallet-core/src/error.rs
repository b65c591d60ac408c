//! Error types for wallet operations

use thiserror::Error;

/// Result type alias for wallet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during wallet operations
#[derive(Debug, Error)]
pub enum Error {
    // ============ Key Material Errors ============
    /// Wrong passphrase or tampered envelope. Deliberately carries no
    /// detail so callers cannot distinguish which one it was.
    #[error("Authentication failed")]
    Authentication,

    // ============ Input Errors ============
    /// Malformed account identifier, non-positive amount, unbalanced
    /// transfer legs and similar caller mistakes.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation attempted in a state that does not allow it, e.g.
    /// signing with no active session.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    // ============ Network Errors ============
    /// Transport-level failure against the ledger's endpoints. Ledger
    /// rejections are not errors; they come back as a status code.
    #[error("Network error: {0}")]
    Network(String),

    // ============ Storage Errors ============
    /// Persistent store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    // ============ Serialization Errors ============
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Validation(e.to_string())
    }
}
