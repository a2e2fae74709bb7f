//! Faceted search over Algolia-style engines.
//!
//! This crate translates typed search requests into engine queries that keep
//! facet counts consistent with active filters, materializes content items
//! into per-culture engine documents, and manages the index write path. The
//! REST engine client is feature-gated; an in-memory engine is always
//! available.
//!
//! # Features
//!
//! - `algolia`: Enable the Algolia REST backend (`reqwest`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      facetry-search                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Read path                                                  │
//! │  Searcher ── planner ── codec ──► SearchBackend::multi_search│
//! │      ▲                                         │            │
//! │      └────────────── reconciler ◄──────────────┘            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Write path                                                 │
//! │  Indexer ── materializer ──► SearchBackend::save_objects    │
//! │     │  └─ role guard, SingleFlightCache (index metadata)    │
//! │  IndexManager ──► SearchBackend::set_settings               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchBackend trait                                        │
//! │  ├── MemoryBackend (in-process engine)                      │
//! │  └── AlgoliaBackend (REST, feature `algolia`)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Engine schema
//!
//! Each logical field is stored under `fields.{name}{postfix}`:
//!
//! | Kind | Postfix |
//! |------|---------|
//! | Text | `_texts` |
//! | Keyword | `_keywords` |
//! | Integer | `_integers` |
//! | Decimal | `_decimals` |
//! | Timestamp | `_datetimeoffsets` |
//!
//! Fixed attributes carry the object id, object type, content key, culture,
//! segment, access keys, path keys, and four aggregate text buckets.
//!
//! # Example
//!
//! ```rust,ignore
//! use facetry_search::{create_search_backend, Facet, Filter, SearchRequest, Searcher};
//!
//! let searcher = Searcher::new(create_search_backend(&config)?);
//! let result = searcher
//!     .search(
//!         &SearchRequest::new("site")
//!             .query("rust")
//!             .culture("en-US")
//!             .filter(Filter::keyword("tags", ["systems"]))
//!             .facet(Facet::keyword("tags")),
//!     )
//!     .await?;
//!
//! for value in &result.facet("tags").unwrap().values {
//!     println!("{value:?}");
//! }
//! ```

pub mod backend;
pub mod cache;
pub mod codec;
pub mod content;
pub mod document;
pub mod facet;
pub mod filter;
pub mod index_manager;
pub mod indexer;
pub mod materializer;
pub mod memory;
pub mod planner;
pub mod range_field;
pub mod reconciler;
pub mod result;
pub mod schema;
pub mod searcher;
pub mod sorter;

#[cfg(feature = "algolia")]
pub mod algolia;

// Re-exports
pub use backend::{
    FacetCounts, Hit, IndexInfo, IndexSettings, SearchBackend, SubQueryResponse,
    create_search_backend,
};
pub use cache::SingleFlightCache;
pub use content::{ContentProtection, IndexField, IndexValue, ObjectType, Variation};
pub use document::{FieldValues, IndexDocument};
pub use facet::{Facet, FacetRange};
pub use filter::{Filter, FilterRange};
pub use index_manager::IndexManager;
pub use indexer::{IndexListingCache, Indexer};
pub use materializer::{DocumentBuilder, VariantDocumentBuilder};
pub use memory::MemoryBackend;
pub use planner::{AccessContext, QueryPlan, SearchRequest, SubQuery, plan};
pub use range_field::{range_field, range_field_name, range_keyword_facet};
pub use reconciler::reconcile;
pub use result::{
    Document, FacetResult, FacetValue, HealthStatus, IndexMetadata, SearchResult,
};
pub use schema::ValueKind;
pub use searcher::Searcher;
pub use sorter::{Direction, Sorter};

#[cfg(feature = "algolia")]
pub use algolia::AlgoliaBackend;
