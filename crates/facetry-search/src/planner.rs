//! Facet-consistency query planner.
//!
//! The engine computes facet counts under every filter of the query that
//! requests them, so a filter on a faceted field would collapse that facet
//! to the selected values. The planner issues one main query plus one
//! facet-only auxiliary query per facet-coupled filter:
//!
//! ```text
//!  filters ──┬── regular ───────────────► `filters` string (all queries)
//!            └── facet-coupled ─┬───────► main: facetFilters/numericFilters
//!                               └─ f_i ─► aux_i: same, minus f_i,
//!                                         facets on f_i's field, no hits
//! ```
//!
//! A facet's counts therefore reflect every active filter except the ones
//! on its own field.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec;
use crate::facet::Facet;
use crate::filter::Filter;
use crate::schema::attributes;
use crate::sorter::Sorter;

/// Response sections requested from the engine.
pub const RESPONSE_FIELDS: [&str; 4] = ["hits", "facets", "facets_stats", "nbHits"];

/// Default page size of a [`SearchRequest`].
pub const DEFAULT_TAKE: usize = 10;

// ============================================================================
// Request
// ============================================================================

/// Identity of the caller for protected content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    /// The principal's own id.
    pub principal_id: Uuid,
    /// Ids of groups the principal belongs to.
    #[serde(default)]
    pub group_ids: Vec<Uuid>,
}

impl AccessContext {
    /// Access context for a principal without groups.
    pub fn new(principal_id: Uuid) -> Self {
        Self {
            principal_id,
            group_ids: Vec::new(),
        }
    }

    /// Add group ids.
    pub fn with_groups(mut self, group_ids: impl Into<Vec<Uuid>>) -> Self {
        self.group_ids = group_ids.into();
        self
    }

    /// Grant keys a document may carry to be visible to this caller,
    /// including the unprotected sentinel.
    pub fn grant_keys(&self) -> Vec<Uuid> {
        let mut keys = vec![Uuid::nil(), self.principal_id];
        for id in &self.group_ids {
            if !keys.contains(id) {
                keys.push(*id);
            }
        }
        keys
    }
}

/// An engine-agnostic search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Index to search.
    pub index_alias: String,
    /// Free-text query.
    #[serde(default)]
    pub query: Option<String>,
    /// Filters, ANDed.
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Requested facets.
    #[serde(default)]
    pub facets: Vec<Facet>,
    /// Sorters; only the first is honored.
    #[serde(default)]
    pub sorters: Vec<Sorter>,
    /// Culture, or `None` for invariant content only.
    #[serde(default)]
    pub culture: Option<String>,
    /// Segment, or `None` for the default segment.
    #[serde(default)]
    pub segment: Option<String>,
    /// Caller identity; `None` skips access filtering.
    #[serde(default)]
    pub access_context: Option<AccessContext>,
    /// Documents to skip.
    #[serde(default)]
    pub skip: usize,
    /// Page size.
    #[serde(default = "default_take")]
    pub take: usize,
}

fn default_take() -> usize {
    DEFAULT_TAKE
}

impl SearchRequest {
    /// Request against an index with default paging.
    pub fn new(index_alias: impl Into<String>) -> Self {
        Self {
            index_alias: index_alias.into(),
            query: None,
            filters: Vec::new(),
            facets: Vec::new(),
            sorters: Vec::new(),
            culture: None,
            segment: None,
            access_context: None,
            skip: 0,
            take: DEFAULT_TAKE,
        }
    }

    /// Set the free-text query.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Add a filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a facet.
    pub fn facet(mut self, facet: Facet) -> Self {
        self.facets.push(facet);
        self
    }

    /// Add a sorter.
    pub fn sorter(mut self, sorter: Sorter) -> Self {
        self.sorters.push(sorter);
        self
    }

    /// Set the culture.
    pub fn culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    /// Set the segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Set the caller identity.
    pub fn access(mut self, context: AccessContext) -> Self {
        self.access_context = Some(context);
        self
    }

    /// Set paging.
    pub fn page(mut self, skip: usize, take: usize) -> Self {
        self.skip = skip;
        self.take = take;
        self
    }

    /// Trimmed query text, if any.
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Whether the request has no query, no filters, and no facets.
    pub fn is_blank(&self) -> bool {
        self.query_text().is_none() && self.filters.is_empty() && self.facets.is_empty()
    }
}

// ============================================================================
// Plan
// ============================================================================

/// One engine query of a multi-query batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuery {
    /// Index or replica to query.
    pub index_name: String,
    /// Free-text query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Boolean filter expression.
    pub filters: String,
    /// Attributes to compute facet counts for.
    #[serde(default)]
    pub facets: Vec<String>,
    /// AND of OR-groups of exact `attr:value` filters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facet_filters: Vec<Vec<String>>,
    /// AND of OR-groups of `attr:min TO max` filters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numeric_filters: Vec<Vec<String>>,
    /// Page size; zero for facet-only queries.
    pub hits_per_page: usize,
    /// Zero-based page.
    pub page: usize,
    /// Attributes returned per hit.
    #[serde(default)]
    pub attributes_to_retrieve: Vec<String>,
    /// Response sections to return.
    #[serde(default)]
    pub response_fields: Vec<String>,
}

/// A facet that survived planning together with its encoded attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFacet {
    /// Requested facet.
    pub facet: Facet,
    /// Encoded attribute.
    pub attribute: String,
}

/// The sub-queries of one search, main query first.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Main query followed by one auxiliary query per facet-coupled filter.
    pub queries: Vec<SubQuery>,
    /// Facets the engine will compute, in request order.
    pub facets: Vec<PlannedFacet>,
}

impl QueryPlan {
    /// The hit-returning query.
    pub fn main(&self) -> Option<&SubQuery> {
        self.queries.first()
    }

    /// Facet-only queries, one per facet-coupled filter.
    pub fn auxiliary(&self) -> &[SubQuery] {
        self.queries.get(1..).unwrap_or_default()
    }
}

/// Plan a request. Returns `None` for a blank request, which is defined to
/// yield an empty result without querying the engine.
pub fn plan(request: &SearchRequest) -> Option<QueryPlan> {
    if request.is_blank() {
        log::debug!(
            "Blank search on '{}' (no query, filters, or facets); returning empty result",
            request.index_alias
        );
        return None;
    }

    let facets = effective_facets(&request.facets);
    let filters = effective_filters(&request.filters);
    let (coupled, regular): (Vec<&Filter>, Vec<&Filter>) = filters
        .into_iter()
        .partition(|f| facets.iter().any(|pf| same_field(pf.facet.field_name(), f.field_name())));

    let index_name = index_name(request);
    let query = request.query_text().map(str::to_string);
    let filter_string = base_filters(request, &regular);

    let sub_query = |facet_attributes: Vec<String>, excluded: Option<usize>, hits: bool| {
        let (facet_filters, numeric_filters) = coupled_groups(&coupled, excluded);
        let (hits_per_page, page) = if hits { paging(request) } else { (0, 0) };
        SubQuery {
            index_name: index_name.clone(),
            query: query.clone(),
            filters: filter_string.clone(),
            facets: facet_attributes,
            facet_filters,
            numeric_filters,
            hits_per_page,
            page,
            attributes_to_retrieve: if hits {
                vec![attributes::KEY.to_string(), attributes::OBJECT_TYPE.to_string()]
            } else {
                Vec::new()
            },
            response_fields: RESPONSE_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    };

    let mut queries = Vec::with_capacity(1 + coupled.len());
    queries.push(sub_query(
        facets.iter().map(|pf| pf.attribute.clone()).collect(),
        None,
        true,
    ));
    for (i, filter) in coupled.iter().enumerate() {
        let same_field_facets = facets
            .iter()
            .filter(|pf| same_field(pf.facet.field_name(), filter.field_name()))
            .map(|pf| pf.attribute.clone())
            .collect();
        queries.push(sub_query(same_field_facets, Some(i), false));
    }

    log::debug!(
        "Planned {} sub-queries on '{index_name}' ({} facet-coupled filters)",
        queries.len(),
        coupled.len()
    );
    Some(QueryPlan { queries, facets })
}

/// Attribute names are case-sensitive, so coupling is too: a filter and a
/// facet whose names differ only in case target different attributes.
fn same_field(a: &str, b: &str) -> bool {
    a == b
}

fn effective_facets(facets: &[Facet]) -> Vec<PlannedFacet> {
    facets
        .iter()
        .filter_map(|facet| match codec::facet_attribute(facet) {
            Some(attribute) => Some(PlannedFacet {
                facet: facet.clone(),
                attribute,
            }),
            None => {
                log::warn!(
                    "Dropping {} facet on '{}': range facets are not supported; facet on a pre-bucketed keyword field instead",
                    facet.tag(),
                    facet.field_name()
                );
                None
            }
        })
        .collect()
}

fn effective_filters(filters: &[Filter]) -> Vec<&Filter> {
    filters
        .iter()
        .filter(|filter| {
            if filter.is_negated() {
                log::warn!(
                    "Negated {} filter on '{}' is not supported; applying it un-negated",
                    filter.tag(),
                    filter.field_name()
                );
            }
            if filter.value_count() == 0 {
                log::debug!(
                    "Ignoring {} filter on '{}' without values",
                    filter.tag(),
                    filter.field_name()
                );
                return false;
            }
            true
        })
        .collect()
}

fn index_name(request: &SearchRequest) -> String {
    let Some(sorter) = request.sorters.first() else {
        return request.index_alias.clone();
    };
    if request.sorters.len() > 1 {
        log::debug!(
            "Only the first of {} sorters is honored on '{}'",
            request.sorters.len(),
            request.index_alias
        );
    }
    codec::replica_index_name(&request.index_alias, sorter)
        .unwrap_or_else(|| request.index_alias.clone())
}

/// Variance, access, and regular filters ANDed.
fn base_filters(request: &SearchRequest, regular: &[&Filter]) -> String {
    let culture = codec::index_culture(request.culture.as_deref());
    let invariant = codec::index_culture(None);
    let mut cultures = Vec::with_capacity(2);
    if culture != invariant {
        cultures.push(format!("{}:{culture}", attributes::CULTURE));
    }
    cultures.push(format!("{}:{invariant}", attributes::CULTURE));

    let mut clauses = vec![
        codec::or_group(cultures.as_slice()),
        format!(
            "{}:{}",
            attributes::SEGMENT,
            codec::index_segment(request.segment.as_deref())
        ),
    ];

    if let Some(context) = &request.access_context {
        let grants: Vec<String> = context
            .grant_keys()
            .iter()
            .map(|id| format!("{}:{}", attributes::ACCESS_KEYS, codec::quote(&id.to_string())))
            .collect();
        clauses.push(codec::or_group(grants.as_slice()));
    }

    clauses.extend(regular.iter().map(|f| codec::filter_expression(f)));
    clauses.join(" AND ")
}

/// Facet-coupled filters as exact and range groups, optionally excluding one.
fn coupled_groups(
    coupled: &[&Filter],
    excluded: Option<usize>,
) -> (Vec<Vec<String>>, Vec<Vec<String>>) {
    let mut exact = Vec::new();
    let mut ranges = Vec::new();
    for (i, filter) in coupled.iter().enumerate() {
        if Some(i) == excluded {
            continue;
        }
        let group = codec::filter_literals(filter);
        if filter.is_range() {
            ranges.push(group);
        } else {
            exact.push(group);
        }
    }
    (exact, ranges)
}

fn paging(request: &SearchRequest) -> (usize, usize) {
    if request.take == 0 {
        return (0, 0);
    }
    if request.skip % request.take != 0 {
        log::debug!(
            "skip {} is not a multiple of take {}; results start at page {}",
            request.skip,
            request.take,
            request.skip / request.take
        );
    }
    (request.take, request.skip / request.take)
}
