//! Main search service implementation

use crate::engine::SearchEngine;
use crate::metrics::{ERRORS_TOTAL, SEARCH_DURATION_SECONDS, SEARCH_QUERIES_TOTAL};
use crate::registry::Registries;
use crate::search::aggregator::{FacetedResult, ResultAggregator};
use crate::search::builder::QueryBuilder;
use crate::search::config::SearchConfig;
use crate::search::error::SearchResult;
use crate::search::query::SearchRequest;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Runs faceted searches against the engine.
///
/// Every call works on one snapshot of the registries, so a concurrent reload
/// affects only later calls.
pub struct SearchService {
    engine: Arc<dyn SearchEngine>,
    registries: Arc<Registries>,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        registries: Arc<Registries>,
        config: SearchConfig,
    ) -> Self {
        Self {
            engine,
            registries,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search, degrading to an empty result when the query cannot be run
    pub async fn search(&self, request: &SearchRequest) -> FacetedResult {
        match self.try_search(request).await {
            Ok(result) => result,
            Err(e) => {
                error!(query = %request.query, error = %e, "Search failed, returning empty result");
                FacetedResult::empty()
            }
        }
    }

    /// Search, surfacing engine and request errors
    pub async fn try_search(&self, request: &SearchRequest) -> SearchResult<FacetedResult> {
        let start = Instant::now();

        match self.execute(request).await {
            Ok((mode, result)) => {
                SEARCH_QUERIES_TOTAL.with_label_values(&["success"]).inc();
                SEARCH_DURATION_SECONDS
                    .with_label_values(&[mode])
                    .observe(start.elapsed().as_secs_f64());
                Ok(result)
            }
            Err(e) => {
                SEARCH_QUERIES_TOTAL.with_label_values(&["failure"]).inc();
                ERRORS_TOTAL.with_label_values(&["search", "query_failed"]).inc();
                Err(e)
            }
        }
    }

    async fn execute(&self, request: &SearchRequest) -> SearchResult<(&'static str, FacetedResult)> {
        let (fields, intersections) = self.registries.snapshot();
        let prepared = QueryBuilder::new(&self.config, &fields, &intersections).build(request)?;

        let probe = self.engine.query(&prepared.probe()).await?;
        let matched = match &prepared.group_field {
            Some(field) => probe.group_count(field),
            None => probe.num_found(),
        };
        let count = prepared.capped_count(matched);

        // The probe already carries the facets when no documents are wanted
        let (mode, response) = if prepared.browse_only {
            ("browse", probe)
        } else {
            ("search", self.engine.query(&prepared.page()).await?)
        };

        debug!(
            query = %request.query,
            matched = matched,
            count = count,
            page_index = prepared.page_index,
            "Search executed"
        );

        let result = ResultAggregator::new(&intersections).aggregate(&prepared, count, response);
        Ok((mode, result))
    }
}
