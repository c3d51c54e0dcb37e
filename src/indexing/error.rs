//! Error types for index synchronization

use crate::engine::EngineError;
use crate::error::AppError;

/// Result type for indexing operations
pub type IndexingResult<T> = std::result::Result<T, IndexingError>;

#[derive(Debug, thiserror::Error)]
pub enum IndexingError {
    /// Another full or incremental run holds the guard
    #[error("An indexing run is already in progress")]
    AlreadyRunning,

    /// No enabled indexer claims the resource type
    #[error("No indexer for resource type {0}")]
    UnknownResourceType(String),

    /// An indexer could not produce documents
    #[error("Document extraction failed: {0}")]
    Extraction(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Action queue persistence failed
    #[error("Action queue error: {0}")]
    Store(String),
}

impl From<AppError> for IndexingError {
    fn from(err: AppError) -> Self {
        IndexingError::Store(err.to_string())
    }
}

impl From<IndexingError> for AppError {
    fn from(err: IndexingError) -> Self {
        match err {
            IndexingError::AlreadyRunning => AppError::Conflict(err.to_string()),
            IndexingError::UnknownResourceType(_) => AppError::Validation(err.to_string()),
            IndexingError::Engine(err) => err.into(),
            IndexingError::Extraction(_) | IndexingError::Store(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
