//! In-process search engine.
//!
//! Emulates the subset of engine behavior the planner and indexer rely on:
//! the filter grammar emitted by the codec, facet and numeric filters,
//! facet counts, replica-name sorting, and page-based paging. Used by tests
//! and when no engine credentials are configured.

mod expr;

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use facetry_core::{Error, Result};
use serde_json::Value;

pub use expr::{Expr, Operand};

use crate::backend::{
    FacetCounts, Hit, IndexInfo, IndexSettings, SearchBackend, SubQueryResponse,
};
use crate::document::IndexDocument;
use crate::planner::SubQuery;
use crate::schema::attributes;

const ASC_SUFFIX: &str = "_asc";
const DESC_SUFFIX: &str = "_desc";

#[derive(Debug, Default)]
struct MemoryIndex {
    documents: BTreeMap<String, Value>,
    settings: IndexSettings,
    pending_task: bool,
}

/// Sort requested through a replica name.
struct ReplicaSort {
    attribute: String,
    descending: bool,
}

/// In-memory [`SearchBackend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
    unavailable: AtomicBool,
    mutations: AtomicUsize,
    searches: AtomicUsize,
    listings: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryBackend {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every index listing, to exercise concurrent metadata lookups.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate an outage: every call fails with a backend error.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Mark an index as having pending engine tasks.
    pub fn set_pending_task(&self, index: &str, pending: bool) {
        if let Some(entry) = self.write_lock().get_mut(index) {
            entry.pending_task = pending;
        }
    }

    /// Number of mutating calls that reached the engine.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Number of multi-query calls that reached the engine.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    /// Number of index listings that reached the engine.
    pub fn listing_count(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// A stored document, as the engine holds it.
    pub fn document(&self, index: &str, object_id: &str) -> Option<Value> {
        self.read_lock()
            .get(index)
            .and_then(|entry| entry.documents.get(object_id).cloned())
    }

    /// Ids of all stored documents of an index.
    pub fn object_ids(&self, index: &str) -> Vec<String> {
        self.read_lock()
            .get(index)
            .map(|entry| entry.documents.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Settings an index was configured with.
    pub fn settings(&self, index: &str) -> Option<IndexSettings> {
        self.read_lock()
            .get(index)
            .map(|entry| entry.settings.clone())
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, MemoryIndex>> {
        self.indexes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, MemoryIndex>> {
        self.indexes.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::backend("memory engine is unavailable"));
        }
        Ok(())
    }

    fn mutated(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }

    /// Resolve a query target to a stored index and an optional replica sort.
    fn resolve<'a>(
        indexes: &'a HashMap<String, MemoryIndex>,
        name: &str,
    ) -> Result<(&'a MemoryIndex, Option<ReplicaSort>)> {
        if let Some(entry) = indexes.get(name) {
            return Ok((entry, None));
        }

        let (stem, descending) = if let Some(stem) = name.strip_suffix(DESC_SUFFIX) {
            (stem, true)
        } else if let Some(stem) = name.strip_suffix(ASC_SUFFIX) {
            (stem, false)
        } else {
            return Err(Error::backend(format!("Index {name} does not exist")));
        };

        indexes
            .iter()
            .filter_map(|(primary, entry)| {
                let key = stem.strip_prefix(primary.as_str())?.strip_prefix('_')?;
                (!key.is_empty()).then(|| (primary.len(), entry, key))
            })
            .max_by_key(|(len, _, _)| *len)
            .map(|(_, entry, key)| {
                (
                    entry,
                    Some(ReplicaSort {
                        attribute: format!("{}.{key}", attributes::FIELDS),
                        descending,
                    }),
                )
            })
            .ok_or_else(|| Error::backend(format!("Index {name} does not exist")))
    }

    fn run_query(indexes: &HashMap<String, MemoryIndex>, query: &SubQuery) -> Result<SubQueryResponse> {
        let (entry, sort) = Self::resolve(indexes, &query.index_name)?;

        let mut predicates = Vec::new();
        if !query.filters.trim().is_empty() {
            predicates.push(Expr::parse(&query.filters)?);
        }
        for group in query.facet_filters.iter().chain(&query.numeric_filters) {
            predicates.push(parse_group(group)?);
        }

        let words = query.query.as_deref().map(tokenize).unwrap_or_default();
        let searchable = searchable_attributes(&entry.settings);

        let mut matched: Vec<(u32, &String, &Value)> = entry
            .documents
            .iter()
            .filter(|(_, doc)| predicates.iter().all(|p| p.matches(doc)))
            .filter_map(|(id, doc)| text_score(doc, &words, &searchable).map(|score| (score, id, doc)))
            .collect();

        let facets = facet_counts(matched.iter().map(|(_, _, doc)| *doc), &query.facets);

        match &sort {
            Some(sort) => matched.sort_by(|a, b| {
                compare_sort_values(
                    first_value(a.2, &sort.attribute),
                    first_value(b.2, &sort.attribute),
                    sort.descending,
                )
                .then_with(|| a.1.cmp(b.1))
            }),
            None => matched.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1))),
        }

        let nb_hits = matched.len() as u64;
        let hits = matched
            .iter()
            .skip(query.page.saturating_mul(query.hits_per_page))
            .take(query.hits_per_page)
            .map(|(_, id, doc)| to_hit(id, doc, &query.attributes_to_retrieve))
            .collect();

        Ok(SubQueryResponse {
            nb_hits: Some(nb_hits),
            hits,
            facets: Some(facets),
        })
    }
}

fn parse_group(group: &[String]) -> Result<Expr> {
    let parts = group
        .iter()
        .map(|literal| Expr::parse(literal))
        .collect::<Result<Vec<_>>>()?;
    Ok(Expr::Or(parts))
}

fn searchable_attributes(settings: &IndexSettings) -> Vec<String> {
    if settings.searchable_attributes.is_empty() {
        IndexSettings::with_defaults(&[]).searchable_attributes
    } else {
        settings.searchable_attributes.clone()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Rank of the best searchable attribute each query word hits, summed;
/// `None` when some word matches nowhere. The last word may match a prefix.
fn text_score(document: &Value, words: &[String], searchable: &[String]) -> Option<u32> {
    if words.is_empty() {
        return Some(0);
    }

    let tokens: Vec<Vec<String>> = searchable
        .iter()
        .map(|attribute| {
            expr::lookup(document, attribute)
                .map(|value| {
                    expr::values_of(value)
                        .filter_map(Value::as_str)
                        .flat_map(tokenize)
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    let last = words.len() - 1;
    let mut score = 0u32;
    for (i, word) in words.iter().enumerate() {
        let rank = tokens.iter().position(|bucket| {
            bucket
                .iter()
                .any(|token| token == word || (i == last && token.starts_with(word.as_str())))
        })?;
        score += rank as u32;
    }
    Some(score)
}

fn facet_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn facet_counts<'a>(documents: impl Iterator<Item = &'a Value>, attributes: &[String]) -> FacetCounts {
    let mut counts: FacetCounts = BTreeMap::new();
    let documents: Vec<&Value> = documents.collect();
    for attribute in attributes {
        let mut values: BTreeMap<String, u64> = BTreeMap::new();
        for document in &documents {
            let Some(value) = expr::lookup(document, attribute) else {
                continue;
            };
            let keys: BTreeSet<String> = expr::values_of(value).filter_map(facet_key).collect();
            for key in keys {
                *values.entry(key).or_default() += 1;
            }
        }
        // The engine omits attributes without any value.
        if !values.is_empty() {
            counts.insert(attribute.clone(), values);
        }
    }
    counts
}

fn first_value<'a>(document: &'a Value, attribute: &str) -> Option<&'a Value> {
    expr::lookup(document, attribute).and_then(|value| expr::values_of(value).next())
}

/// Missing values sort last in both directions.
fn compare_sort_values(a: Option<&Value>, b: Option<&Value>, descending: bool) -> CmpOrdering {
    let ordering = match (a, b) {
        (None, None) => return CmpOrdering::Equal,
        (None, Some(_)) => return CmpOrdering::Greater,
        (Some(_), None) => return CmpOrdering::Less,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    };
    if descending { ordering.reverse() } else { ordering }
}

fn to_hit(object_id: &str, document: &Value, retrieve: &[String]) -> Hit {
    let retrieved = |attribute: &str| {
        retrieve
            .iter()
            .any(|r| r == attribute || r == "*")
            .then(|| document.get(attribute).and_then(Value::as_str).map(str::to_string))
            .flatten()
    };
    Hit {
        object_id: object_id.to_string(),
        key: retrieved(attributes::KEY),
        object_type: retrieved(attributes::OBJECT_TYPE),
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn multi_search(&self, queries: &[SubQuery]) -> Result<Vec<SubQueryResponse>> {
        self.check_available()?;
        self.searches.fetch_add(1, Ordering::SeqCst);
        let indexes = self.read_lock();
        queries
            .iter()
            .map(|query| Self::run_query(&indexes, query))
            .collect()
    }

    async fn save_objects(&self, index: &str, documents: &[IndexDocument]) -> Result<()> {
        self.check_available()?;
        let values = documents
            .iter()
            .map(|doc| Ok((doc.object_id.clone(), serde_json::to_value(doc)?)))
            .collect::<Result<Vec<_>>>()?;
        self.mutated();
        let mut indexes = self.write_lock();
        let entry = indexes.entry(index.to_string()).or_default();
        entry.documents.extend(values);
        log::debug!("memory: saved {} documents to '{index}'", documents.len());
        Ok(())
    }

    async fn delete_by(&self, index: &str, facet_filters: &[Vec<String>]) -> Result<()> {
        self.check_available()?;
        let predicates = facet_filters
            .iter()
            .map(|group| parse_group(group))
            .collect::<Result<Vec<_>>>()?;
        self.mutated();
        let mut indexes = self.write_lock();
        if let Some(entry) = indexes.get_mut(index) {
            let before = entry.documents.len();
            entry
                .documents
                .retain(|_, doc| !predicates.iter().all(|p| p.matches(doc)));
            log::debug!(
                "memory: deleted {} documents from '{index}'",
                before - entry.documents.len()
            );
        }
        Ok(())
    }

    async fn clear_objects(&self, index: &str) -> Result<()> {
        self.check_available()?;
        self.mutated();
        if let Some(entry) = self.write_lock().get_mut(index) {
            entry.documents.clear();
        }
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self.read_lock().contains_key(index))
    }

    async fn list_indices(&self) -> Result<Vec<IndexInfo>> {
        self.check_available()?;
        self.listings.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut infos: Vec<IndexInfo> = self
            .read_lock()
            .iter()
            .map(|(name, entry)| IndexInfo {
                name: name.clone(),
                entries: entry.documents.len() as u64,
                pending_task: entry.pending_task,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn set_settings(&self, index: &str, settings: &IndexSettings) -> Result<()> {
        self.check_available()?;
        self.mutated();
        self.write_lock()
            .entry(index.to_string())
            .or_default()
            .settings = settings.clone();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn is_ready(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }
}
