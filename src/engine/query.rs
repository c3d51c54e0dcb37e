//! Engine query parameters

use serde::Serialize;

/// Query that matches every document
pub const MATCH_ALL: &str = "*:*";

/// Parameter names understood by the engine
pub mod params {
    pub const Q: &str = "q";
    pub const FQ: &str = "fq";
    pub const FL: &str = "fl";
    pub const SORT: &str = "sort";
    pub const START: &str = "start";
    pub const ROWS: &str = "rows";
    pub const DEF_TYPE: &str = "defType";
    pub const QF: &str = "qf";
    pub const FACET: &str = "facet";
    pub const FACET_FIELD: &str = "facet.field";
    pub const FACET_RANGE: &str = "facet.range";
    pub const FACET_PIVOT: &str = "facet.pivot";
    pub const FACET_MINCOUNT: &str = "facet.mincount";
    pub const GROUP: &str = "group";
    pub const GROUP_FIELD: &str = "group.field";
    pub const GROUP_NGROUPS: &str = "group.ngroups";
    pub const GROUP_FORMAT: &str = "group.format";
    pub const HL: &str = "hl";
    pub const HL_FL: &str = "hl.fl";
    pub const HL_SNIPPETS: &str = "hl.snippets";
    pub const HL_FRAGSIZE: &str = "hl.fragsize";
    pub const SPELLCHECK: &str = "spellcheck";
    pub const SPELLCHECK_Q: &str = "spellcheck.q";
    pub const SPELLCHECK_COLLATE: &str = "spellcheck.collate";

    /// Per-field override, e.g. `f.category.facet.mincount`
    pub fn per_field(field: &str, param: &str) -> String {
        format!("f.{}.{}", field, param)
    }
}

/// Ordered, multi-valued parameter list sent to the engine's select handler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineQuery {
    params: Vec<(String, String)>,
}

impl EngineQuery {
    pub fn new(q: impl Into<String>) -> Self {
        let mut query = Self::default();
        query.set(params::Q, q);
        query
    }

    /// Replace every value of `key` with a single value
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.remove(key);
        self.params.push((key.to_string(), value.into()));
        self
    }

    /// Append a value to a multi-valued parameter
    pub fn add(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.params.retain(|(k, _)| k != key);
        self
    }

    /// First value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn q(&self) -> &str {
        self.get(params::Q).unwrap_or(MATCH_ALL)
    }

    pub fn set_rows(&mut self, rows: usize) -> &mut Self {
        self.set(params::ROWS, rows.to_string())
    }

    pub fn set_start(&mut self, start: usize) -> &mut Self {
        self.set(params::START, start.to_string())
    }

    pub fn rows(&self) -> Option<usize> {
        self.get(params::ROWS).and_then(|v| v.parse().ok())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Backslash-escape every character with a meaning in the engine's query syntax
pub fn escape_query_chars(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '\\' | '+' | '-' | '!' | '(' | ')' | ':' | '^' | '[' | ']' | '"' | '{' | '}' | '~'
                | '*' | '?' | '|' | '&' | ';' | '/'
        ) || c.is_whitespace()
        {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_and_add_appends() {
        let mut query = EngineQuery::new("budget");
        query.add(params::FQ, "type:\"news\"");
        query.add(params::FQ, "category:\"finance\"");
        query.set_rows(0);
        query.set_rows(10);

        assert_eq!(query.q(), "budget");
        assert_eq!(query.get_all(params::FQ).len(), 2);
        assert_eq!(query.get_all(params::ROWS), vec!["10"]);
        assert_eq!(query.rows(), Some(10));
    }

    #[test]
    fn test_escape_query_chars() {
        assert_eq!(escape_query_chars("site_42"), "site_42");
        assert_eq!(escape_query_chars("a:b c"), "a\\:b\\ c");
        assert_eq!(escape_query_chars("42&7"), "42\\&7");
    }

    #[test]
    fn test_per_field_param() {
        assert_eq!(
            params::per_field("category", params::FACET_MINCOUNT),
            "f.category.facet.mincount"
        );
    }
}
