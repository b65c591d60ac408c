//! Error types for the bridge

use thiserror::Error;

/// Bridge errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Method not on the allow-list
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// A hop's channel closed while a request was in flight
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// No response arrived within the caller's deadline
    #[error("Timed out waiting for response to request {0}")]
    Timeout(String),

    /// Malformed request or response payload
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The wallet rejected or failed the operation
    #[error("Wallet error: {0}")]
    Wallet(String),
}

impl BridgeError {
    /// Stable error code reported to the page. Pages match on these
    /// strings, so they are part of the wire contract.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::UnsupportedMethod(_) => "UnsupportedMethodError",
            BridgeError::ChannelClosed(_) => "ChannelClosedError",
            BridgeError::Timeout(_) => "TimeoutError",
            BridgeError::Serialization(_) => "SerializationError",
            BridgeError::Wallet(_) => "WalletError",
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl From<hedera_wallet_core::Error> for BridgeError {
    fn from(err: hedera_wallet_core::Error) -> Self {
        BridgeError::Wallet(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BridgeError>;
