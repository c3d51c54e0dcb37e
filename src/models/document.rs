use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Engine-side field names of the fixed document attributes
pub mod fields {
    pub const UID: &str = "uid";
    pub const DATE: &str = "date";
    pub const TYPE: &str = "type";
    pub const SUMMARY: &str = "summary";
    pub const TITLE: &str = "title";
    pub const SITE: &str = "site";
    pub const ROLE: &str = "role";
    pub const CONTENT: &str = "content";
    pub const URL: &str = "url";
    pub const HIE_DATE: &str = "hie_date";
    pub const CATEGORY: &str = "category";
    pub const DOCUMENT_PORTLET_ID: &str = "document_portlet_id";
}

/// Engine uid of a resource, disambiguated by site for multi-tenant indices
pub fn site_uid(site: &str, uid: &str) -> String {
    format!("{}_{}", site, uid)
}

/// Typed value of a dynamic document field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DynamicValue {
    /// Analyzed full text
    Text(String),
    /// Exact string
    Str(String),
    Date(DateTime<Utc>),
    Long(i64),
    List(Vec<String>),
}

impl DynamicValue {
    /// Suffix the engine schema uses to type the dynamic field
    pub fn suffix(&self) -> &'static str {
        match self {
            DynamicValue::Text(_) => "_text",
            DynamicValue::Str(_) => "_string",
            DynamicValue::Date(_) => "_date",
            DynamicValue::Long(_) => "_long",
            DynamicValue::List(_) => "_list",
        }
    }

    fn to_json(&self) -> Value {
        match self {
            DynamicValue::Text(text) | DynamicValue::Str(text) => Value::String(text.clone()),
            DynamicValue::Date(date) => Value::String(format_date(date)),
            DynamicValue::Long(number) => Value::from(*number),
            DynamicValue::List(items) => Value::from(items.clone()),
        }
    }
}

/// Date format accepted by the engine
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A document produced by an indexer, ready to be written to the engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Resource uid, without the site prefix
    pub uid: String,
    pub doc_type: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub date: Option<DateTime<Utc>>,
    pub role: String,
    pub content: String,
    pub categories: Vec<String>,
    /// `"<documentId>&<portletId>"` when the document is shown in a portlet
    pub document_portlet_id: Option<String>,
    pub dynamic_fields: BTreeMap<String, DynamicValue>,
}

impl Document {
    pub fn new(uid: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            doc_type: doc_type.into(),
            role: "none".to_string(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_portlet(mut self, document_id: &str, portlet_id: i32) -> Self {
        self.document_portlet_id = Some(super::document_portlet_id(document_id, portlet_id));
        self
    }

    /// Add a dynamic field; `name` is the bare name, the type suffix is appended on write
    pub fn add_dynamic(&mut self, name: impl Into<String>, value: DynamicValue) {
        self.dynamic_fields.insert(name.into(), value);
    }

    /// `YYYY/MM/DD` path used for hierarchical date browsing
    pub fn hie_date(&self) -> Option<String> {
        self.date.map(|date| date.format("%Y/%m/%d").to_string())
    }

    /// Engine representation of the document for the given site
    pub fn to_engine_document(&self, site: &str) -> Map<String, Value> {
        let mut doc = Map::new();

        doc.insert(fields::UID.into(), Value::from(site_uid(site, &self.uid)));
        doc.insert(fields::SITE.into(), Value::from(site));
        doc.insert(fields::TYPE.into(), Value::from(self.doc_type.clone()));
        doc.insert(fields::TITLE.into(), Value::from(self.title.clone()));
        doc.insert(fields::SUMMARY.into(), Value::from(self.summary.clone()));
        doc.insert(fields::URL.into(), Value::from(self.url.clone()));
        doc.insert(fields::ROLE.into(), Value::from(self.role.clone()));
        doc.insert(fields::CONTENT.into(), Value::from(self.content.clone()));

        if let Some(date) = &self.date {
            doc.insert(fields::DATE.into(), Value::from(format_date(date)));
        }
        if let Some(hie_date) = self.hie_date() {
            doc.insert(fields::HIE_DATE.into(), Value::from(hie_date));
        }
        if !self.categories.is_empty() {
            doc.insert(fields::CATEGORY.into(), Value::from(self.categories.clone()));
        }
        if let Some(scope) = &self.document_portlet_id {
            doc.insert(fields::DOCUMENT_PORTLET_ID.into(), Value::from(scope.clone()));
        }

        for (name, value) in &self.dynamic_fields {
            doc.insert(format!("{}{}", name, value.suffix()), value.to_json());
        }

        doc
    }
}
