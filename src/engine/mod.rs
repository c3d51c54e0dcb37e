//! Boundary to the external search engine.
//!
//! The engine is consumed purely as a query/response protocol: queries are
//! ordered parameter lists, responses are decoded into [`EngineResponse`], and
//! writes are add / delete-by-query / commit / optimize commands. Ranking and
//! storage belong to the engine.

mod error;
mod query;
mod response;
mod solr;

pub use error::{EngineError, EngineResult};
pub use query::{escape_query_chars, params, EngineQuery, MATCH_ALL};
pub use response::{
    flat_pairs, value_text, DocList, EngineDocument, EngineResponse, FacetCounts, GroupedField,
    PivotNode, RangeFacet,
};
pub use solr::SolrClient;

use async_trait::async_trait;

/// Query and write operations the service needs from the engine
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Run a select query
    async fn query(&self, query: &EngineQuery) -> EngineResult<EngineResponse>;

    /// Add or replace documents (matched on uid)
    async fn add(&self, documents: Vec<EngineDocument>) -> EngineResult<()>;

    /// Delete every document matching `query`
    async fn delete_by_query(&self, query: &str) -> EngineResult<()>;

    /// Make pending writes visible
    async fn commit(&self) -> EngineResult<()>;

    /// Merge index segments
    async fn optimize(&self) -> EngineResult<()>;
}
