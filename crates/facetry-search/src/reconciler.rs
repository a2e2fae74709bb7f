//! Result reconciler.
//!
//! Merges the responses of a [`QueryPlan`] into one [`SearchResult`] in two
//! passes:
//!
//! 1. Index the facet counts of the auxiliary responses by attribute.
//! 2. For each planned facet, take the auxiliary counts when present, else
//!    the main response's counts.
//!
//! Hits and the total always come from the main response.

use std::collections::{BTreeMap, HashMap};

use chrono::{TimeZone, Utc};
use facetry_core::{Error, Result};
use uuid::Uuid;

use crate::backend::{Hit, SubQueryResponse};
use crate::content::ObjectType;
use crate::facet::Facet;
use crate::planner::{PlannedFacet, QueryPlan};
use crate::result::{Document, FacetResult, FacetValue, SearchResult};

/// Merge sub-query responses, main first, into a search result.
///
/// # Errors
///
/// Returns [`Error::FacetDecoding`] when a facet key cannot be parsed back
/// into its facet's value type.
pub fn reconcile(plan: &QueryPlan, responses: &[SubQueryResponse]) -> Result<SearchResult> {
    let Some(main) = responses.first() else {
        log::error!("Engine returned no responses for a plan of {} queries", plan.queries.len());
        return Ok(SearchResult::empty());
    };
    if responses.len() != plan.queries.len() {
        log::warn!(
            "Engine returned {} responses for {} queries",
            responses.len(),
            plan.queries.len()
        );
    }

    let auxiliary = auxiliary_facets(&responses[1..]);

    let mut facets = Vec::with_capacity(plan.facets.len());
    for planned in &plan.facets {
        let counts = auxiliary
            .get(planned.attribute.as_str())
            .copied()
            .or_else(|| main.facets.as_ref()?.get(&planned.attribute));
        match counts {
            Some(counts) => facets.push(decode_facet(planned, counts)?),
            None => log::warn!(
                "Facet '{}' ({}) is missing from every engine response; is it declared facetable?",
                planned.facet.field_name(),
                planned.attribute
            ),
        }
    }

    Ok(SearchResult {
        total: main.nb_hits.unwrap_or(0),
        documents: main.hits.iter().filter_map(to_document).collect(),
        facets,
    })
}

/// First pass: auxiliary facet counts by attribute; later responses win.
fn auxiliary_facets(responses: &[SubQueryResponse]) -> HashMap<&str, &BTreeMap<String, u64>> {
    let mut by_attribute = HashMap::new();
    for response in responses {
        for (attribute, counts) in response.facets.iter().flatten() {
            by_attribute.insert(attribute.as_str(), counts);
        }
    }
    by_attribute
}

fn decode_facet(planned: &PlannedFacet, counts: &BTreeMap<String, u64>) -> Result<FacetResult> {
    let attribute = planned.attribute.as_str();
    let values = counts
        .iter()
        .map(|(key, &count)| decode_value(&planned.facet, attribute, key, count))
        .collect::<Result<Vec<_>>>()?;
    Ok(FacetResult {
        field_name: planned.facet.field_name().to_string(),
        values,
    })
}

fn decode_value(facet: &Facet, attribute: &str, key: &str, count: u64) -> Result<FacetValue> {
    match facet {
        Facet::Keyword { .. } => Ok(FacetValue::Keyword {
            key: key.to_string(),
            count,
        }),
        Facet::IntegerExact { .. } => key
            .parse()
            .map(|key| FacetValue::IntegerExact { key, count })
            .map_err(|_| Error::facet_decoding(attribute, key, "integer")),
        Facet::DecimalExact { .. } => key
            .parse::<f64>()
            .ok()
            .filter(|key| key.is_finite())
            .map(|key| FacetValue::DecimalExact { key, count })
            .ok_or_else(|| Error::facet_decoding(attribute, key, "decimal")),
        Facet::DateTimeExact { .. } => key
            .parse::<i64>()
            .ok()
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
            .map(|key| FacetValue::DateTimeExact { key, count })
            .ok_or_else(|| Error::facet_decoding(attribute, key, "epoch seconds")),
        Facet::IntegerRange { .. } | Facet::DecimalRange { .. } | Facet::DateTimeRange { .. } => {
            Err(Error::unsupported(format!(
                "{} facet on '{}'",
                facet.tag(),
                facet.field_name()
            )))
        }
    }
}

/// Hit to document. The content id comes from `key`, falling back to the
/// `{id}.{culture}` object id; hits without a valid id are dropped.
fn to_document(hit: &Hit) -> Option<Document> {
    let raw = hit
        .key
        .as_deref()
        .unwrap_or_else(|| hit.object_id.split('.').next().unwrap_or_default());
    let Ok(id) = Uuid::parse_str(raw) else {
        log::warn!("Dropping hit '{}': '{raw}' is not a content id", hit.object_id);
        return None;
    };
    let object_type = hit
        .object_type
        .as_deref()
        .map(ObjectType::parse_lenient)
        .unwrap_or_default();
    Some(Document { id, object_type })
}
