//! HTTP client for a Solr-compatible engine core

use crate::config::EngineConfig;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::query::EngineQuery;
use crate::engine::response::{EngineDocument, EngineResponse};
use crate::engine::SearchEngine;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Engine client speaking the select/update JSON protocol
#[derive(Clone)]
pub struct SolrClient {
    client: Client,
    base_url: String,
}

impl SolrClient {
    /// Create a new client for the core at `base_url`
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                EngineError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        Self::new(config.url.clone(), config.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: Response) -> EngineResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["error"]["msg"].as_str().map(str::to_string))
            .unwrap_or(body);

        warn!(status = status.as_u16(), message = %message, "Engine request rejected");
        Err(EngineError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn update(&self, body: Value) -> EngineResult<()> {
        let url = format!("{}/update", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("wt", "json")])
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl SearchEngine for SolrClient {
    async fn query(&self, query: &EngineQuery) -> EngineResult<EngineResponse> {
        let url = format!("{}/select", self.base_url);
        debug!(q = %query.q(), params = query.params().len(), "Sending engine query");

        let response = self
            .client
            .get(&url)
            .query(query.params())
            .query(&[("wt", "json")])
            .send()
            .await?;

        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| EngineError::Decode(e.to_string()))
    }

    async fn add(&self, documents: Vec<EngineDocument>) -> EngineResult<()> {
        if documents.is_empty() {
            return Ok(());
        }
        debug!(count = documents.len(), "Adding documents");
        self.update(Value::from(documents.into_iter().map(Value::Object).collect::<Vec<_>>()))
            .await
    }

    async fn delete_by_query(&self, query: &str) -> EngineResult<()> {
        debug!(query = %query, "Deleting by query");
        self.update(json!({ "delete": { "query": query } })).await
    }

    async fn commit(&self) -> EngineResult<()> {
        self.update(json!({ "commit": {} })).await
    }

    async fn optimize(&self) -> EngineResult<()> {
        self.update(json!({ "optimize": {} })).await
    }
}
