//! Search entry point: plan, execute in one round trip, reconcile.

use std::sync::Arc;

use facetry_core::Result;

use crate::backend::SearchBackend;
use crate::planner::{self, SearchRequest};
use crate::reconciler;
use crate::result::SearchResult;

/// Runs faceted searches against a backend.
#[derive(Clone)]
pub struct Searcher {
    backend: Arc<dyn SearchBackend>,
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Searcher {
    /// Create a searcher over a backend.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Run a search.
    ///
    /// A blank request and an engine failure both yield
    /// [`SearchResult::empty`].
    ///
    /// # Errors
    ///
    /// Returns [`facetry_core::Error::FacetDecoding`] when the engine returns
    /// facet keys that do not decode to their facet's value type.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult> {
        let Some(plan) = planner::plan(request) else {
            return Ok(SearchResult::empty());
        };

        let responses = match self.backend.multi_search(&plan.queries).await {
            Ok(responses) if !responses.is_empty() => responses,
            Ok(_) => {
                log::error!(
                    "Engine '{}' returned no results for a search on '{}'",
                    self.backend.name(),
                    request.index_alias
                );
                return Ok(SearchResult::empty());
            }
            Err(e) => {
                log::error!(
                    "Search on '{}' failed on engine '{}': {e}",
                    request.index_alias,
                    self.backend.name()
                );
                return Ok(SearchResult::empty());
            }
        };

        reconciler::reconcile(&plan, &responses)
    }
}
