//! Translates a search request into engine queries

use crate::engine::{params, EngineQuery, MATCH_ALL};
use crate::models::FacetPair;
use crate::registry::FieldSnapshot;
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::{bucket_selections, filter_query, SearchRequest, SortOrder};

/// Engine query plus the paging decisions needed to run it
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    query: EngineQuery,
    pub page_index: usize,
    pub page_size: usize,
    pub limit: usize,
    pub group_field: Option<String>,
    /// Facets only, no documents
    pub browse_only: bool,
    pub template: Option<String>,
}

impl PreparedQuery {
    /// The query without paging applied
    pub fn base(&self) -> &EngineQuery {
        &self.query
    }

    /// Zero-row query used to learn the real match or group count
    pub fn probe(&self) -> EngineQuery {
        let mut probe = self.query.clone();
        probe.set_start(0).set_rows(0);
        probe
    }

    /// Query for the requested page
    pub fn page(&self) -> EngineQuery {
        let mut page = self.query.clone();
        let rows = if self.browse_only {
            0
        } else {
            self.page_size.min(self.limit)
        };
        page.set_start((self.page_index - 1).saturating_mul(self.page_size))
            .set_rows(rows);
        page
    }

    /// Count reported to the caller, capped at the limit
    pub fn capped_count(&self, count: u64) -> usize {
        usize::try_from(count).unwrap_or(usize::MAX).min(self.limit)
    }
}

/// Builds engine queries against one snapshot of the registries
pub struct QueryBuilder<'a> {
    config: &'a SearchConfig,
    fields: &'a FieldSnapshot,
    intersections: &'a [FacetPair],
}

impl<'a> QueryBuilder<'a> {
    pub fn new(
        config: &'a SearchConfig,
        fields: &'a FieldSnapshot,
        intersections: &'a [FacetPair],
    ) -> Self {
        Self {
            config,
            fields,
            intersections,
        }
    }

    pub fn build(&self, request: &SearchRequest) -> SearchResult<PreparedQuery> {
        let text = request.query.trim();
        let blank = text.is_empty();
        let q = if blank { MATCH_ALL } else { text };
        let mut query = EngineQuery::new(q);

        self.add_facets(&mut query);
        self.add_filters(&mut query, request);

        let profile = match request.conf.as_deref() {
            Some(name) => Some(
                self.config
                    .profile(Some(name))
                    .ok_or_else(|| SearchError::UnknownProfile(name.to_string()))?,
            ),
            None => None,
        };
        if let Some(profile) = profile {
            if let Some(fq) = &profile.filter_query {
                query.add(params::FQ, fq.clone());
            }
            if let Some(fl) = &profile.field_list {
                query.set(params::FL, fl.clone());
            }
        }

        self.add_sort(&mut query, request);

        let group_field = request.effective_group_field().map(str::to_string);
        if let Some(field) = &group_field {
            query
                .set(params::GROUP, "true")
                .set(params::GROUP_FIELD, field.clone())
                .set(params::GROUP_NGROUPS, "true")
                .set(params::GROUP_FORMAT, "simple");
        }

        if q != MATCH_ALL {
            query.set(params::DEF_TYPE, "dismax");
            let boosts = self
                .fields
                .fields()
                .iter()
                .map(|field| format!("{}^{}", field.name, field.weight))
                .collect::<Vec<_>>()
                .join(" ");
            if !boosts.is_empty() {
                query.set(params::QF, boosts);
            }
        }

        let browse_only = blank || self.config.facets_only;

        if self.config.enable_highlighting && !browse_only && !self.config.highlight_fields.is_empty() {
            query
                .set(params::HL, "true")
                .set(params::HL_FL, self.config.highlight_fields.join(","))
                .set(params::HL_SNIPPETS, self.config.highlight_snippets.to_string())
                .set(params::HL_FRAGSIZE, self.config.highlight_fragsize.to_string());
        }

        if request.spellcheck && !blank {
            query
                .set(params::SPELLCHECK, "true")
                .set(params::SPELLCHECK_Q, text)
                .set(params::SPELLCHECK_COLLATE, "true");
        }

        let page_size = request
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(self.config.default_page_size.max(1));

        let page_index = request.page_index.max(1);
        if (page_index - 1).checked_mul(page_size).is_none() {
            return Err(SearchError::InvalidRequest(format!(
                "Page {} of size {} is out of range",
                page_index, page_size
            )));
        }

        Ok(PreparedQuery {
            query,
            page_index,
            page_size,
            limit: request.limit.unwrap_or(self.config.max_results),
            group_field,
            browse_only,
            template: profile.and_then(|p| p.template.clone()),
        })
    }

    fn add_facets(&self, query: &mut EngineQuery) {
        let mut faceted = false;

        for field in self.fields.facet_fields() {
            faceted = true;
            if field.is_date() {
                query
                    .add(params::FACET_RANGE, field.name.clone())
                    .set(&params::per_field(&field.name, "facet.range.start"), self.config.date_facet_start.clone())
                    .set(&params::per_field(&field.name, "facet.range.gap"), self.config.date_facet_gap.clone())
                    .set(&params::per_field(&field.name, "facet.range.end"), self.config.date_facet_end.clone())
                    .set(&params::per_field(&field.name, params::FACET_MINCOUNT), "0");
            } else {
                query
                    .add(params::FACET_FIELD, field.name.clone())
                    .set(
                        &params::per_field(&field.name, params::FACET_MINCOUNT),
                        field.facet_min_count().to_string(),
                    );
            }
        }

        for pair in self.intersections {
            faceted = true;
            query.add(params::FACET_PIVOT, pair.pair_name());
        }

        if faceted {
            query.set(params::FACET, "true");
        }
    }

    fn add_filters(&self, query: &mut EngineQuery, request: &SearchRequest) {
        for selection in bucket_selections(self.fields, &request.facets) {
            if let Some(fq) = filter_query(selection.field, &selection.values) {
                query.add(params::FQ, fq);
            }
        }
    }

    fn add_sort(&self, query: &mut EngineQuery, request: &SearchRequest) {
        let requested = request
            .sort_field
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty());

        if let Some(field) = requested {
            query.set(params::SORT, format!("{} {}", field, request.sort_order));
        } else if let Some(field) = self.fields.default_sort() {
            query.set(params::SORT, format!("{} {}", field.name, SortOrder::Desc));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, FieldOperator};
    use crate::search::config::{QueryProfile, SearchConfigBuilder};

    fn catalog() -> FieldSnapshot {
        FieldSnapshot::new(vec![
            Field::new("title").with_weight(3.0),
            Field::new("summary").with_weight(1.5),
            Field::new("type").facet(),
            Field::new("category").facet().with_operator(FieldOperator::Or),
            Field::new("date").facet().sortable().with_default_sort(true),
        ])
    }

    fn pairs() -> Vec<FacetPair> {
        vec![FacetPair {
            id: 1,
            field1: "type".to_string(),
            field2: "category".to_string(),
        }]
    }

    #[test]
    fn test_facet_dimensions() {
        let config = SearchConfig::default();
        let fields = catalog();
        let pairs = pairs();
        let prepared = QueryBuilder::new(&config, &fields, &pairs)
            .build(&SearchRequest::new("budget"))
            .unwrap();
        let query = prepared.base();

        assert_eq!(query.get(params::FACET), Some("true"));
        assert_eq!(query.get_all(params::FACET_FIELD), vec!["type", "category"]);
        assert_eq!(query.get("f.type.facet.mincount"), Some("1"));
        assert_eq!(query.get("f.category.facet.mincount"), Some("0"));

        assert_eq!(query.get_all(params::FACET_RANGE), vec!["date"]);
        assert_eq!(query.get("f.date.facet.range.gap"), Some("+1YEAR"));
        assert_eq!(query.get("f.date.facet.mincount"), Some("0"));

        assert_eq!(query.get_all(params::FACET_PIVOT), vec!["type,category"]);
    }

    #[test]
    fn test_filters_from_selections() {
        let config = SearchConfig::default();
        let fields = catalog();
        let request = SearchRequest::new("budget")
            .with_facet("category:a")
            .with_facet("CATEGORY:b")
            .with_facet("date:2020")
            .with_facet("author:nobody");

        let prepared = QueryBuilder::new(&config, &fields, &[]).build(&request).unwrap();
        assert_eq!(
            prepared.base().get_all(params::FQ),
            vec![r#"category:("a" OR "b")"#, "date:2020"]
        );
    }

    #[test]
    fn test_weighted_query_only_for_real_text() {
        let config = SearchConfig::default();
        let fields = catalog();
        let builder = QueryBuilder::new(&config, &fields, &[]);

        let text = builder.build(&SearchRequest::new("budget")).unwrap();
        assert_eq!(text.base().get(params::DEF_TYPE), Some("dismax"));
        assert_eq!(
            text.base().get(params::QF),
            Some("title^3 summary^1.5 type^1 category^1 date^1")
        );

        let all = builder.build(&SearchRequest::new(MATCH_ALL)).unwrap();
        assert_eq!(all.base().get(params::DEF_TYPE), None);
        assert_eq!(all.base().get(params::QF), None);
        assert!(!all.browse_only);
    }

    #[test]
    fn test_blank_query_browses() {
        let config = SearchConfig::default();
        let fields = catalog();
        let prepared = QueryBuilder::new(&config, &fields, &[])
            .build(&SearchRequest::new("   "))
            .unwrap();

        assert_eq!(prepared.base().q(), MATCH_ALL);
        assert!(prepared.browse_only);
        assert_eq!(prepared.page().rows(), Some(0));
        assert_eq!(prepared.base().get(params::HL), None);
    }

    #[test]
    fn test_facets_only_mode_requests_no_rows() {
        let config = SearchConfigBuilder::new().facets_only(true).build();
        let fields = catalog();
        let prepared = QueryBuilder::new(&config, &fields, &[])
            .build(&SearchRequest::new("budget"))
            .unwrap();
        assert_eq!(prepared.page().rows(), Some(0));
    }

    #[test]
    fn test_sort_precedence() {
        let config = SearchConfig::default();
        let fields = catalog();
        let builder = QueryBuilder::new(&config, &fields, &[]);

        let explicit = builder
            .build(&SearchRequest::new("x").with_sort("title", SortOrder::Asc))
            .unwrap();
        assert_eq!(explicit.base().get(params::SORT), Some("title asc"));

        let default = builder.build(&SearchRequest::new("x")).unwrap();
        assert_eq!(default.base().get(params::SORT), Some("date desc"));

        let unsorted = FieldSnapshot::new(vec![Field::new("title")]);
        let none = QueryBuilder::new(&config, &unsorted, &[])
            .build(&SearchRequest::new("x"))
            .unwrap();
        assert_eq!(none.base().get(params::SORT), None);
    }

    #[test]
    fn test_paging_and_grouping() {
        let config = SearchConfig::default();
        let fields = catalog();
        let request = SearchRequest::new("x")
            .with_page(3, 20)
            .with_limit(15)
            .grouped_by("type");
        let prepared = QueryBuilder::new(&config, &fields, &[]).build(&request).unwrap();

        let page = prepared.page();
        assert_eq!(page.get(params::START), Some("40"));
        assert_eq!(page.rows(), Some(15));
        assert_eq!(page.get(params::GROUP_FIELD), Some("type"));
        assert_eq!(page.get(params::GROUP_NGROUPS), Some("true"));

        let probe = prepared.probe();
        assert_eq!(probe.rows(), Some(0));
        assert_eq!(prepared.capped_count(120), 15);
    }

    #[test]
    fn test_page_index_below_one_is_first_page() {
        let config = SearchConfig::default();
        let fields = catalog();
        let prepared = QueryBuilder::new(&config, &fields, &[])
            .build(&SearchRequest::new("x").with_page(0, 10))
            .unwrap();
        assert_eq!(prepared.page().get(params::START), Some("0"));
    }

    #[test]
    fn test_page_offset_overflow_is_rejected() {
        let config = SearchConfig::default();
        let fields = catalog();
        let builder = QueryBuilder::new(&config, &fields, &[]);

        let request: SearchRequest = serde_json::from_value(serde_json::json!({
            "query": "budget",
            "page_index": usize::MAX,
            "page_size": 10
        }))
        .unwrap();
        assert!(matches!(
            builder.build(&request),
            Err(SearchError::InvalidRequest(_))
        ));

        let last = builder
            .build(&SearchRequest::new("budget").with_page(usize::MAX / 10, 10))
            .unwrap();
        assert!(last.page().get(params::START).is_some());
    }

    #[test]
    fn test_profiles() {
        let config = SearchConfigBuilder::new()
            .profile(
                "news",
                QueryProfile {
                    filter_query: Some("type:news".to_string()),
                    field_list: Some("uid,title".to_string()),
                    template: Some("news_list".to_string()),
                },
            )
            .build();
        let fields = catalog();
        let builder = QueryBuilder::new(&config, &fields, &[]);

        let prepared = builder.build(&SearchRequest::new("x").with_profile("news")).unwrap();
        assert_eq!(prepared.base().get_all(params::FQ), vec!["type:news"]);
        assert_eq!(prepared.base().get(params::FL), Some("uid,title"));
        assert_eq!(prepared.template.as_deref(), Some("news_list"));

        assert!(matches!(
            builder.build(&SearchRequest::new("x").with_profile("missing")),
            Err(SearchError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_spellcheck_and_highlighting() {
        let config = SearchConfig::default();
        let fields = catalog();
        let prepared = QueryBuilder::new(&config, &fields, &[])
            .build(&SearchRequest::new("budjet").with_spellcheck())
            .unwrap();
        let query = prepared.base();

        assert_eq!(query.get(params::SPELLCHECK_Q), Some("budjet"));
        assert_eq!(query.get(params::HL), Some("true"));
        assert_eq!(query.get(params::HL_FL), Some("title,summary,content"));
    }
}
