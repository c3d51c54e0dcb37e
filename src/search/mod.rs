//! Faceted search over the external engine
//!
//! A request goes through three stages:
//!
//! ```text
//! SearchRequest ──► QueryBuilder ──► engine (probe, then page) ──► ResultAggregator ──► FacetedResult
//!                      ▲                                               ▲
//!                      └──────── Field / Intersection snapshots ───────┘
//! ```
//!
//! - Every facet-enabled field becomes a facet dimension; date fields become
//!   range facets with empty buckets kept.
//! - Selected `"field:value"` facets become one filter query per field,
//!   combined according to the field's operator.
//! - Free text runs in weighted multi-field mode using each field's weight.
//! - A zero-row probe fixes the reported count before the page is fetched.
//!
//! # Example
//!
//! ```no_run
//! use cms_search::search::{SearchRequest, SearchService};
//!
//! async fn run(service: &SearchService) {
//!     let request = SearchRequest::new("budget")
//!         .with_facet("category:finance")
//!         .with_page(1, 20);
//!
//!     let result = service.search(&request).await;
//!     println!("Found {} documents", result.count);
//! }
//! ```

mod aggregator;
mod builder;
mod config;
mod error;
mod query;
mod service;

pub use aggregator::{
    DateBucket, FacetTreeNode, FacetValue, FacetedResult, Highlight, ResultAggregator, ResultItem,
};
pub use builder::{PreparedQuery, QueryBuilder};
pub use config::{QueryProfile, SearchConfig, SearchConfigBuilder};
pub use error::{SearchError, SearchResult};
pub use query::{
    bucket_selections, build_clause, filter_query, parse_selection, FieldSelection, SearchRequest,
    SortOrder,
};
pub use service::SearchService;
