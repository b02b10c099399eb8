//! Error types for fedstats.

use thiserror::Error;

/// Result type alias for fedstats operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a federated statistics round.
#[derive(Error, Debug)]
pub enum Error {
    // Node-local errors
    #[error("feature '{0}' not found in local dataset")]
    FeatureNotFound(String),

    #[error("aggregation method '{0}' is not supported")]
    UnsupportedMethod(String),

    // Round errors
    #[error("no valid replies received from nodes")]
    NoValidReplies,

    #[error("insufficient data for '{feature}' {method} calculation")]
    InsufficientData { feature: String, method: String },

    #[error("invalid round configuration: {0}")]
    InvalidConfig(String),

    // Wait-loop errors
    #[error("timed out waiting for {required} nodes to connect")]
    WaitTimedOut { required: usize },

    #[error("round cancelled by caller")]
    RoundCancelled,

    // Transport errors
    #[error("message exchange failed: {0}")]
    ExchangeFailed(String),

    // Serialization errors
    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    // Generic errors
    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
