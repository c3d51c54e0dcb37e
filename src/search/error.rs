//! Error types for search operations

use crate::engine::EngineError;
use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Engine rejected or failed the query
    #[error("Search execution failed: {0}")]
    SearchFailed(#[from] EngineError),

    /// Request could not be turned into a query
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    /// Request named a profile that is not configured
    #[error("Unknown search profile: {0}")]
    UnknownProfile(String),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::SearchFailed(err) => err.into(),
            SearchError::InvalidRequest(msg) => AppError::Validation(msg),
            SearchError::UnknownProfile(name) => {
                AppError::NotFound(format!("Search profile {}", name))
            }
        }
    }
}
