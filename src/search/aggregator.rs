//! Reshapes raw engine responses into faceted results

use crate::engine::{flat_pairs, value_text, EngineDocument, EngineResponse, PivotNode};
use crate::models::document::fields;
use crate::models::FacetPair;
use crate::search::builder::PreparedQuery;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Field name → snippets
pub type Highlight = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

impl FacetValue {
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// One bucket of a date range facet, keyed by its start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBucket {
    pub start: String,
    pub count: u64,
}

/// First-level value of a facet intersection with its second-level counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetTreeNode {
    pub value: String,
    pub count: u64,
    pub children: Vec<FacetValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub date: Option<String>,
    pub site: String,
    pub role: String,
    pub highlight: Option<Highlight>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetedResult {
    /// Match count (or group count), capped at the caller limit
    pub count: usize,
    pub items: Vec<ResultItem>,
    pub facets: BTreeMap<String, Vec<FacetValue>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub date_facets: BTreeMap<String, Vec<DateBucket>>,
    pub facet_trees: BTreeMap<String, Vec<FacetTreeNode>>,
    pub spellcheck: Option<Value>,
    pub highlights: HashMap<String, Highlight>,
    pub page_index: usize,
    pub page_size: usize,
    pub template: Option<String>,
}

impl FacetedResult {
    /// Result returned when the query could not be run
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 && self.items.is_empty()
    }
}

/// Maps engine responses for one snapshot of the intersection registry
pub struct ResultAggregator<'a> {
    intersections: &'a [FacetPair],
}

impl<'a> ResultAggregator<'a> {
    pub fn new(intersections: &'a [FacetPair]) -> Self {
        Self { intersections }
    }

    pub fn aggregate(
        &self,
        prepared: &PreparedQuery,
        count: usize,
        response: EngineResponse,
    ) -> FacetedResult {
        let mut result = FacetedResult {
            count,
            page_index: prepared.page_index,
            page_size: prepared.page_size,
            template: prepared.template.clone(),
            ..Default::default()
        };

        if !prepared.browse_only {
            result.items = response
                .documents()
                .iter()
                .map(|doc| Self::item(doc, &response.highlighting))
                .collect();
        }

        if let Some(counts) = &response.facet_counts {
            for (field, values) in &counts.facet_fields {
                let values = flat_pairs(values)
                    .into_iter()
                    .map(|(value, count)| FacetValue::new(value, count))
                    .collect();
                result.facets.insert(field.clone(), values);
            }

            for (field, range) in &counts.facet_ranges {
                let buckets: Vec<DateBucket> = flat_pairs(&range.counts)
                    .into_iter()
                    .map(|(start, count)| DateBucket { start, count })
                    .collect();
                if !buckets.is_empty() {
                    result.date_facets.insert(field.clone(), buckets);
                }
            }

            for pair in self.intersections {
                let name = pair.pair_name();
                if let Some(nodes) = counts.facet_pivot.get(&name) {
                    result.facet_trees.insert(name, Self::tree(nodes));
                }
            }
        }

        result.spellcheck = response.spellcheck;
        result.highlights = response.highlighting;
        result
    }

    fn tree(nodes: &[PivotNode]) -> Vec<FacetTreeNode> {
        nodes
            .iter()
            .map(|node| FacetTreeNode {
                value: value_text(&node.value),
                count: node.count,
                children: node
                    .pivot
                    .iter()
                    .map(|child| FacetValue::new(value_text(&child.value), child.count))
                    .collect(),
            })
            .collect()
    }

    fn item(doc: &EngineDocument, highlighting: &HashMap<String, Highlight>) -> ResultItem {
        let text = |name: &str| doc.get(name).map(first_text).unwrap_or_default();
        let id = text(fields::UID);

        ResultItem {
            highlight: highlighting.get(&id).cloned(),
            doc_type: text(fields::TYPE),
            title: text(fields::TITLE),
            summary: text(fields::SUMMARY),
            url: text(fields::URL),
            date: doc.get(fields::DATE).map(first_text),
            site: text(fields::SITE),
            role: text(fields::ROLE),
            id,
        }
    }
}

/// Stored fields may come back multi-valued
fn first_text(value: &Value) -> String {
    match value {
        Value::Array(values) => values.first().map(value_text).unwrap_or_default(),
        other => value_text(other),
    }
}
