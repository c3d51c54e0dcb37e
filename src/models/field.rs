use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

/// How several selected values of one facet field are combined into a filter
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(from = "String", into = "String")]
pub enum FieldOperator {
    /// Every selected value must occur
    #[default]
    And,
    /// Any selected value may occur
    Or,
    /// Single-choice facet: the latest selection replaces the previous one
    Switch,
    /// Raw passthrough of a precomputed range or IN expression
    In,
}

impl FieldOperator {
    /// Parse an operator name, falling back to `And` for anything unrecognized
    pub fn parse(value: &str) -> Self {
        value.trim().parse().unwrap_or_default()
    }

    /// Minimum facet count implied by the operator.
    ///
    /// `And` means a value must occur so empty buckets are useless; every other
    /// operator still has to surface zero-count values.
    pub fn facet_min_count(self) -> u32 {
        match self {
            FieldOperator::And => 1,
            FieldOperator::Or | FieldOperator::Switch | FieldOperator::In => 0,
        }
    }
}

impl From<String> for FieldOperator {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<FieldOperator> for String {
    fn from(operator: FieldOperator) -> Self {
        operator.to_string()
    }
}

fn default_weight() -> f64 {
    1.0
}

/// A searchable, facetable or sortable attribute of indexed documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Field {
    /// Store-assigned identifier (0 until persisted)
    #[serde(default)]
    pub id: u64,

    /// Engine-side field name
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// Free text description
    #[serde(default)]
    pub description: String,

    /// The field can be used as a facet
    #[serde(default)]
    pub is_facet: bool,

    /// Faceting has been switched on for this field
    #[serde(default)]
    pub enable_facet: bool,

    /// The field can be used for sorting
    #[serde(default)]
    pub is_sort: bool,

    /// Sorting has been switched on for this field
    #[serde(default)]
    pub enable_sort: bool,

    /// Used as the sort field when a request does not name one
    #[serde(default)]
    pub default_sort: bool,

    /// Query-time relevance boost
    #[serde(default = "default_weight")]
    #[validate(range(min = 0.0))]
    pub weight: f64,

    /// Multi-value composition operator
    #[serde(default)]
    pub operator: FieldOperator,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: 0,
            label: name.clone(),
            name,
            description: String::new(),
            is_facet: false,
            enable_facet: false,
            is_sort: false,
            enable_sort: false,
            default_sort: false,
            weight: default_weight(),
            operator: FieldOperator::And,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the field as facetable and enable faceting on it
    pub fn facet(mut self) -> Self {
        self.is_facet = true;
        self.enable_facet = true;
        self
    }

    /// Mark the field as sortable and enable sorting on it
    pub fn sortable(mut self) -> Self {
        self.is_sort = true;
        self.enable_sort = true;
        self
    }

    pub fn with_default_sort(mut self, default_sort: bool) -> Self {
        self.default_sort = default_sort;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_operator(mut self, operator: FieldOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Set the operator from its textual name (unknown names become `AND`)
    pub fn set_operator_name(&mut self, name: &str) {
        self.operator = FieldOperator::parse(name);
    }

    pub fn facet_min_count(&self) -> u32 {
        self.operator.facet_min_count()
    }

    pub fn is_facet_enabled(&self) -> bool {
        self.is_facet && self.enable_facet
    }

    pub fn is_sort_enabled(&self) -> bool {
        self.is_sort && self.enable_sort
    }

    /// Date attributes get range facets and unquoted filter clauses
    pub fn is_date(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        name == "date" || name.ends_with("_date")
    }

    pub fn name_matches(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_unknown_operator_normalizes_to_and() {
        for raw in ["", "XOR", "between", "and not"] {
            assert_eq!(FieldOperator::parse(raw), FieldOperator::And, "{raw:?}");
        }
        assert_eq!(FieldOperator::parse("or"), FieldOperator::Or);
        assert_eq!(FieldOperator::parse(" Switch "), FieldOperator::Switch);
        assert_eq!(FieldOperator::parse("IN"), FieldOperator::In);
    }

    #[test]
    fn test_facet_min_count_follows_operator() {
        for operator in FieldOperator::iter() {
            let field = Field::new("category").with_operator(operator);
            let expected = if operator == FieldOperator::And { 1 } else { 0 };
            assert_eq!(field.facet_min_count(), expected, "{operator}");
        }

        let mut field = Field::new("category").with_operator(FieldOperator::Or);
        field.set_operator_name("nonsense");
        assert_eq!(field.operator, FieldOperator::And);
        assert_eq!(field.facet_min_count(), 1);
    }

    #[test]
    fn test_operator_deserializes_leniently() {
        let field: Field =
            serde_json::from_str(r#"{"name":"type","operator":"whatever"}"#).unwrap();
        assert_eq!(field.operator, FieldOperator::And);
        assert_eq!(field.weight, 1.0);

        let json = serde_json::to_value(Field::new("type").with_operator(FieldOperator::Switch)).unwrap();
        assert_eq!(json["operator"], "SWITCH");
    }

    #[test]
    fn test_date_detection() {
        assert!(Field::new("date").is_date());
        assert!(Field::new("publication_date").is_date());
        assert!(Field::new("Created_DATE").is_date());
        assert!(!Field::new("dates_list").is_date());
        assert!(!Field::new("category").is_date());
    }

    #[test]
    fn test_enablement_requires_both_flags() {
        let mut field = Field::new("category");
        field.is_facet = true;
        assert!(!field.is_facet_enabled());
        field.enable_facet = true;
        assert!(field.is_facet_enabled());

        field.enable_sort = true;
        assert!(!field.is_sort_enabled());
        assert!(Field::new("title").sortable().is_sort_enabled());
    }
}
