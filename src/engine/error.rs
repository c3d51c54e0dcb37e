//! Error types for engine round-trips

use crate::error::AppError;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors raised while talking to the search engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The request never produced a response (connection, timeout, TLS)
    #[error("Engine transport failed: {0}")]
    Transport(String),

    /// The engine answered with a non-success status
    #[error("Engine returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Engine response could not be decoded: {0}")]
    Decode(String),

    /// Client could not be built from configuration
    #[error("Invalid engine configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EngineError::Decode(err.to_string())
        } else {
            EngineError::Transport(err.to_string())
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            EngineError::Transport(msg) if msg.contains("timed out") => AppError::Timeout(msg),
            other => AppError::Engine(other.to_string()),
        }
    }
}
