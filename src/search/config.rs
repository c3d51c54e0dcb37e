//! Search configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named query profile selected by a request's `conf` parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryProfile {
    /// Extra filter query added to every request using this profile
    pub filter_query: Option<String>,

    /// Engine field list (`fl`)
    pub field_list: Option<String>,

    /// Template name echoed back in the result
    pub template: Option<String>,
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default cap on the reported count and on rows per page
    pub max_results: usize,

    /// Page size when the request does not carry one
    pub default_page_size: usize,

    /// Compute facets only, never return documents
    pub facets_only: bool,

    /// Date range facet start (engine date math)
    pub date_facet_start: String,

    /// Date range facet gap
    pub date_facet_gap: String,

    /// Date range facet end
    pub date_facet_end: String,

    /// Enable highlighting
    pub enable_highlighting: bool,

    /// Fields highlighted when highlighting is on
    pub highlight_fields: Vec<String>,

    /// Snippets per highlighted field
    pub highlight_snippets: u32,

    /// Highlight fragment size in characters
    pub highlight_fragsize: u32,

    /// Named query profiles
    pub profiles: HashMap<String, QueryProfile>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 1000,
            default_page_size: 10,
            facets_only: false,
            date_facet_start: "NOW/YEAR-10YEARS".to_string(),
            date_facet_gap: "+1YEAR".to_string(),
            date_facet_end: "NOW".to_string(),
            enable_highlighting: true,
            highlight_fields: vec!["title".to_string(), "summary".to_string(), "content".to_string()],
            highlight_snippets: 3,
            highlight_fragsize: 150,
            profiles: HashMap::new(),
        }
    }
}

impl SearchConfig {
    pub fn profile(&self, name: Option<&str>) -> Option<&QueryProfile> {
        name.and_then(|name| self.profiles.get(name))
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn default_page_size(mut self, size: usize) -> Self {
        self.config.default_page_size = size;
        self
    }

    pub fn facets_only(mut self, enabled: bool) -> Self {
        self.config.facets_only = enabled;
        self
    }

    pub fn date_facet_range(
        mut self,
        start: impl Into<String>,
        gap: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        self.config.date_facet_start = start.into();
        self.config.date_facet_gap = gap.into();
        self.config.date_facet_end = end.into();
        self
    }

    pub fn enable_highlighting(mut self, enabled: bool) -> Self {
        self.config.enable_highlighting = enabled;
        self
    }

    pub fn highlight_fields(mut self, fields: Vec<String>) -> Self {
        self.config.highlight_fields = fields;
        self
    }

    pub fn profile(mut self, name: impl Into<String>, profile: QueryProfile) -> Self {
        self.config.profiles.insert(name.into(), profile);
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
