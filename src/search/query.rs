//! Search requests and facet filter clauses

use crate::models::{Field, FieldOperator};
use crate::registry::FieldSnapshot;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// Sort direction requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// One faceted search call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SearchRequest {
    /// Free text; blank means browse
    pub query: String,

    /// Raw `"field:value"` selections, in the order the user made them
    pub facets: Vec<String>,

    pub sort_field: Option<String>,

    pub sort_order: SortOrder,

    /// 1-based page index
    pub page_index: usize,

    #[validate(range(min = 1, max = 10000))]
    pub page_size: Option<usize>,

    pub group: bool,

    pub group_field: Option<String>,

    pub spellcheck: bool,

    /// Named query profile
    pub conf: Option<String>,

    /// Caller cap on the reported count and on page rows
    #[validate(range(min = 1))]
    pub limit: Option<usize>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            facets: Vec::new(),
            sort_field: None,
            sort_order: SortOrder::default(),
            page_index: 1,
            page_size: None,
            group: false,
            group_field: None,
            spellcheck: false,
            conf: None,
            limit: None,
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_facet(mut self, selection: impl Into<String>) -> Self {
        self.facets.push(selection.into());
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = order;
        self
    }

    pub fn with_page(mut self, page_index: usize, page_size: usize) -> Self {
        self.page_index = page_index;
        self.page_size = Some(page_size);
        self
    }

    pub fn grouped_by(mut self, field: impl Into<String>) -> Self {
        self.group = true;
        self.group_field = Some(field.into());
        self
    }

    pub fn with_spellcheck(mut self) -> Self {
        self.spellcheck = true;
        self
    }

    pub fn with_profile(mut self, conf: impl Into<String>) -> Self {
        self.conf = Some(conf.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Grouping field, only when group mode is on
    pub fn effective_group_field(&self) -> Option<&str> {
        if !self.group {
            return None;
        }
        self.group_field
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty())
    }
}

/// Split a `"field:value"` selection at its first colon.
///
/// Returns `None` when either side is blank.
pub fn parse_selection(raw: &str) -> Option<(&str, &str)> {
    let (field, value) = raw.split_once(':')?;
    let field = field.trim();
    if field.is_empty() || value.trim().is_empty() {
        return None;
    }
    Some((field, value))
}

/// Selected values grouped under their owning field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelection<'a> {
    pub field: &'a Field,
    pub values: Vec<String>,
}

/// Bucket raw selections by field, in order of each field's first selection.
///
/// Field names match case-insensitively; selections naming an unknown field
/// are dropped.
pub fn bucket_selections<'a>(fields: &'a FieldSnapshot, raw: &[String]) -> Vec<FieldSelection<'a>> {
    let mut buckets: Vec<FieldSelection<'a>> = Vec::new();

    for (name, value) in raw.iter().filter_map(|s| parse_selection(s)) {
        let Some(field) = fields.find(name) else {
            continue;
        };
        match buckets.iter_mut().find(|b| std::ptr::eq(b.field, field)) {
            Some(bucket) => bucket.values.push(value.to_string()),
            None => buckets.push(FieldSelection {
                field,
                values: vec![value.to_string()],
            }),
        }
    }

    buckets
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

/// Combine the selected values of one field into a filter clause.
///
/// Date values are never quoted; any quotes they carry are dropped.
pub fn build_clause(field: &Field, values: &[String]) -> Option<String> {
    let date = field.is_date();
    let term = |value: &str| -> String {
        if date {
            value.replace('"', "")
        } else {
            quote(value)
        }
    };

    let clause = match field.operator {
        FieldOperator::And | FieldOperator::Or => {
            let mut distinct: Vec<&str> = Vec::new();
            for value in values {
                if !distinct.contains(&value.as_str()) {
                    distinct.push(value);
                }
            }
            if distinct.is_empty() {
                return None;
            }

            let separator = format!(" {} ", field.operator);
            let joined = distinct
                .iter()
                .map(|value| term(*value))
                .collect::<Vec<_>>()
                .join(&separator);
            if distinct.len() > 1 {
                format!("({})", joined)
            } else {
                joined
            }
        }
        FieldOperator::Switch => term(values.last()?.as_str()),
        FieldOperator::In if date => term(values.last()?.as_str()),
        FieldOperator::In => values.last()?.clone(),
    };

    Some(clause)
}

/// Filter query for one field: `name:clause`
pub fn filter_query(field: &Field, values: &[String]) -> Option<String> {
    build_clause(field, values).map(|clause| format!("{}:{}", field.name, clause))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_selection_splits_at_first_colon() {
        assert_eq!(parse_selection("date:[2020 TO *]"), Some(("date", "[2020 TO *]")));
        assert_eq!(parse_selection("url:http://x"), Some(("url", "http://x")));
        assert_eq!(parse_selection("type:"), None);
        assert_eq!(parse_selection(":news"), None);
        assert_eq!(parse_selection("no separator"), None);
    }

    #[test]
    fn test_or_clause_is_parenthesized_and_quoted() {
        let field = Field::new("category").with_operator(FieldOperator::Or);
        assert_eq!(
            build_clause(&field, &values(&["a", "b"])).unwrap(),
            r#"("a" OR "b")"#
        );
    }

    #[test]
    fn test_single_value_is_not_parenthesized() {
        let field = Field::new("type");
        assert_eq!(build_clause(&field, &values(&["news"])).unwrap(), r#""news""#);
    }

    #[test]
    fn test_and_clause_dedupes_and_escapes_quotes() {
        let field = Field::new("tag");
        assert_eq!(
            build_clause(&field, &values(&["x", r#"say "hi""#, "x"])).unwrap(),
            r#"("x" AND "say \"hi\"")"#
        );
        assert_eq!(build_clause(&field, &values(&["x", "x"])).unwrap(), r#""x""#);
    }

    #[test]
    fn test_switch_keeps_only_last_value() {
        let field = Field::new("lang").with_operator(FieldOperator::Switch);
        for selections in [vec!["fr"], vec!["en", "fr"], vec!["de", "en", "fr"]] {
            let clause = build_clause(&field, &values(&selections)).unwrap();
            assert_eq!(clause, r#""fr""#);
            assert!(!clause.contains(" OR ") && !clause.contains(" AND "));
        }
    }

    #[test]
    fn test_in_keeps_last_value_verbatim() {
        let field = Field::new("price_long").with_operator(FieldOperator::In);
        assert_eq!(
            build_clause(&field, &values(&["[0 TO 10]", "[10 TO 50]"])).unwrap(),
            "[10 TO 50]"
        );
    }

    #[test]
    fn test_date_clause_strips_quotes() {
        let field = Field::new("date");
        assert_eq!(build_clause(&field, &values(&["2020"])).unwrap(), "2020");
        assert_eq!(build_clause(&field, &values(&["\"2020\""])).unwrap(), "2020");
        assert_eq!(
            build_clause(&field, &values(&["2020", "2021"])).unwrap(),
            "(2020 AND 2021)"
        );
        assert_eq!(
            filter_query(&Field::new("publish_date"), &values(&["[NOW-1YEAR TO NOW]"])).unwrap(),
            "publish_date:[NOW-1YEAR TO NOW]"
        );
    }

    #[test]
    fn test_bucket_selections_drops_unknown_fields() {
        let fields = FieldSnapshot::new(vec![Field::new("Category").facet(), Field::new("type").facet()]);

        let raw = values(&["category:a", "unknown:x", "TYPE:news", "category:b", "category:"]);
        let buckets = bucket_selections(&fields, &raw);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].field.name, "Category");
        assert_eq!(buckets[0].values, values(&["a", "b"]));
        assert_eq!(buckets[1].field.name, "type");
        assert_eq!(buckets[1].values, values(&["news"]));
    }

    #[test]
    fn test_effective_group_field_requires_flag() {
        let mut request = SearchRequest::new("x");
        request.group_field = Some("type".to_string());
        assert_eq!(request.effective_group_field(), None);
        assert_eq!(SearchRequest::new("x").grouped_by("type").effective_group_field(), Some("type"));
        assert_eq!(SearchRequest::new("x").grouped_by("  ").effective_group_field(), None);
    }
}
