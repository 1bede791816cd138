//! Full-text search and relevance ranking for the extension marketplace.
//!
//! Two interchangeable query backends live behind a single facade:
//!
//! - **Engine-backed** ([`SearchIndex`]): a tantivy index that is rebuilt in
//!   the background and queried with fuzzy multi-field matching, exact
//!   extension-id boosting and prefix boosts.
//! - **Fallback** ([`FallbackSearchEngine`]): a stateless backend that
//!   recomputes everything per query from live registry snapshots, used
//!   when no search engine is configured.
//!
//! Both return the same response shape — an ordered page of extension ids
//! plus a total match count — with deterministic tie-breaking, so callers
//! never need to know which backend served them.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │               SearchService                    │
//! │  search() / notify_changed() / rebuild()       │
//! └──────────────┬───────────────┬────────────────┘
//!                │               │
//!        ┌───────▼──────┐  ┌─────▼──────────────┐
//!        │ SearchIndex  │  │ FallbackSearchEngine│
//!        │ (tantivy,    │  │ (recompute per      │
//!        │  rw-locked)  │  │  query, lock-free)  │
//!        └───────┬──────┘  └─────┬──────────────┘
//!                └───────┬───────┘
//!                ┌───────▼──────┐
//!                │ RelevanceScorer │
//!                └──────────────┘
//! ```
//!
//! The composite relevance score blends rating confidence, download
//! popularity and publishing recency, normalized by batch-level
//! [`RelevanceStats`] and discounted for unverified publishers.

mod config;
mod document;
mod error;
mod fallback;
mod index;
mod query;
mod relevance;
mod service;

pub use config::{SearchBackendKind, SearchConfig, SearchConfigBuilder};
pub use document::{build_extension_schema, SearchEntry};
pub use error::{SearchError, SearchResult};
pub use fallback::FallbackSearchEngine;
pub use index::SearchIndex;
pub use query::{PageRequest, QueryOptions, SearchResponse, SortBy, SortOrder};
pub use relevance::{RelevanceScorer, RelevanceStats, RelevanceWeights};
pub use service::SearchService;
