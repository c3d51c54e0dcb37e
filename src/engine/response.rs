//! Raw engine response, as decoded from the select handler's JSON output

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// A stored document as returned by the engine
pub type EngineDocument = Map<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineResponse {
    #[serde(default)]
    pub response: Option<DocList>,

    /// Present when the query ran in group mode, keyed by group field
    #[serde(default)]
    pub grouped: BTreeMap<String, GroupedField>,

    #[serde(default)]
    pub facet_counts: Option<FacetCounts>,

    /// Engine document id → field → snippets
    #[serde(default)]
    pub highlighting: HashMap<String, HashMap<String, Vec<String>>>,

    #[serde(default)]
    pub spellcheck: Option<Value>,
}

impl EngineResponse {
    /// Number of documents matched by a non-grouped query
    pub fn num_found(&self) -> u64 {
        self.response.as_ref().map(|r| r.num_found).unwrap_or(0)
    }

    /// Number of distinct groups, falling back to matches when the engine omits it
    pub fn group_count(&self, field: &str) -> u64 {
        self.grouped
            .get(field)
            .map(|g| g.ngroups.unwrap_or(g.matches))
            .unwrap_or(0)
    }

    /// Documents of the page, whichever mode the query ran in
    pub fn documents(&self) -> &[EngineDocument] {
        if let Some(response) = &self.response {
            return &response.docs;
        }
        self.grouped
            .values()
            .find_map(|g| g.doclist.as_ref())
            .map(|d| d.docs.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocList {
    #[serde(rename = "numFound", default)]
    pub num_found: u64,

    #[serde(default)]
    pub start: u64,

    #[serde(default)]
    pub docs: Vec<EngineDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupedField {
    #[serde(default)]
    pub matches: u64,

    #[serde(default)]
    pub ngroups: Option<u64>,

    /// Flattened group members (`group.format=simple`)
    #[serde(default)]
    pub doclist: Option<DocList>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacetCounts {
    /// Field → flat `[value, count, value, count, ...]` list
    #[serde(default)]
    pub facet_fields: BTreeMap<String, Vec<Value>>,

    #[serde(default)]
    pub facet_ranges: BTreeMap<String, RangeFacet>,

    /// `"field1,field2"` → first-level nodes
    #[serde(default)]
    pub facet_pivot: BTreeMap<String, Vec<PivotNode>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeFacet {
    /// Flat `[bucket start, count, ...]` list
    #[serde(default)]
    pub counts: Vec<Value>,

    #[serde(default)]
    pub gap: Option<Value>,

    #[serde(default)]
    pub start: Option<Value>,

    #[serde(default)]
    pub end: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotNode {
    pub field: String,
    pub value: Value,
    pub count: u64,
    #[serde(default)]
    pub pivot: Vec<PivotNode>,
}

/// Render a scalar JSON value as facet text (strings without quotes)
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decode a flat `[value, count, ...]` list into pairs, ignoring a dangling tail
pub fn flat_pairs(values: &[Value]) -> Vec<(String, u64)> {
    values
        .chunks_exact(2)
        .map(|pair| (value_text(&pair[0]), pair[1].as_u64().unwrap_or(0)))
        .collect()
}
