//! Search facade
//!
//! Selects one query backend at construction time and exposes a single
//! query/mutate contract over it. Mutation events from the authoritative
//! store are forwarded to the engine-backed index; the fallback backend
//! always re-reads live state, so they are no-ops there.

use crate::error::AppError;
use crate::registry::ExtensionRegistry;
use crate::search::config::{SearchBackendKind, SearchConfig};
use crate::search::error::SearchResult;
use crate::search::fallback::FallbackSearchEngine;
use crate::search::index::SearchIndex;
use crate::search::query::{PageRequest, QueryOptions, SearchResponse};
use crate::search::relevance::RelevanceScorer;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Statically selected query backend
enum SearchBackend {
    Index(SearchIndex),
    Fallback(FallbackSearchEngine),
}

/// Main search service
pub struct SearchService {
    backend: SearchBackend,
    registry: Arc<dyn ExtensionRegistry>,
    config: SearchConfig,

    /// Serializes maintenance runs so scheduled updates never overlap
    maintenance: Mutex<()>,
}

impl SearchService {
    /// Construct the service, selecting the backend from configuration.
    ///
    /// Requesting the engine-backed index without an index path is a
    /// startup-fatal misconfiguration, reported before any traffic is
    /// accepted.
    pub fn new(
        config: SearchConfig,
        registry: Arc<dyn ExtensionRegistry>,
    ) -> crate::error::Result<Self> {
        let scorer = RelevanceScorer::new(config.relevance);

        let backend = if config.enabled && config.backend == SearchBackendKind::Index {
            let index_path = config.index_path.clone().ok_or_else(|| {
                AppError::Configuration(
                    "search.backend = \"index\" requires search.index_path".to_string(),
                )
            })?;
            SearchBackend::Index(SearchIndex::new(
                config.clone(),
                index_path,
                registry.clone(),
                scorer,
            ))
        } else {
            SearchBackend::Fallback(FallbackSearchEngine::new(registry.clone(), scorer))
        };

        Ok(Self {
            backend,
            registry,
            config,
            maintenance: Mutex::new(()),
        })
    }

    /// Whether the engine-backed index serves queries
    pub fn is_enabled(&self) -> bool {
        matches!(self.backend, SearchBackend::Index(_))
    }

    /// Initialize the search index on startup.
    ///
    /// With `clear_on_start` configured the index is deleted and rebuilt
    /// from scratch; otherwise it is created and populated only when it
    /// does not exist yet.
    pub async fn init(&self) -> SearchResult<()> {
        if let SearchBackend::Index(index) = &self.backend {
            let start = std::time::Instant::now();
            index.ensure_index(self.config.clear_on_start).await?;
            tracing::info!(
                duration_ms = start.elapsed().as_millis() as u64,
                "Initialized search index"
            );
        }
        Ok(())
    }

    /// Execute a search; the response shape is identical for both backends
    pub async fn search(
        &self,
        options: &QueryOptions,
        page: &PageRequest,
    ) -> SearchResult<SearchResponse> {
        match &self.backend {
            SearchBackend::Index(index) => index.query(options, page).await,
            SearchBackend::Fallback(fallback) => fallback.search(options, page).await,
        }
    }

    /// An extension was created or changed in the authoritative store.
    ///
    /// Re-reads the snapshot: still active means upsert, no longer active
    /// means the entry is removed so deactivated extensions stop being
    /// queryable.
    pub async fn notify_changed(&self, extension_id: i64) -> SearchResult<()> {
        let SearchBackend::Index(index) = &self.backend else {
            return Ok(());
        };
        match self.registry.find_active_extension(extension_id).await? {
            Some(ext) => index.upsert_one(&ext).await,
            None => index.delete_one(extension_id).await,
        }
    }

    /// An extension was removed from the authoritative store
    pub async fn notify_removed(&self, extension_id: i64) -> SearchResult<()> {
        let SearchBackend::Index(index) = &self.backend else {
            return Ok(());
        };
        index.delete_one(extension_id).await
    }

    /// Scheduled soft update of the search index.
    ///
    /// Runs once per day so time-decayed relevance stays current. Skipped
    /// when the timestamp weight is negligible (the ranking would not
    /// change) and when a previous maintenance run is still in flight.
    pub async fn update_search_index(&self) -> SearchResult<()> {
        let SearchBackend::Index(index) = &self.backend else {
            return Ok(());
        };
        if self.config.relevance.timestamp.abs() < 0.01 {
            tracing::debug!("Timestamp relevance is negligible, skipping scheduled index update");
            return Ok(());
        }
        let Ok(_guard) = self.maintenance.try_lock() else {
            tracing::warn!("Search index update already in progress, skipping");
            return Ok(());
        };

        let start = std::time::Instant::now();
        index.rebuild_all().await?;
        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Updated search index"
        );
        Ok(())
    }

    /// Explicitly triggered rebuild. Soft repopulates the existing index;
    /// hard deletes and recreates it first.
    pub async fn rebuild(&self, hard: bool) -> SearchResult<()> {
        let SearchBackend::Index(index) = &self.backend else {
            return Ok(());
        };
        let _guard = self.maintenance.lock().await;
        if hard {
            index.ensure_index(true).await
        } else {
            index.rebuild_all().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use crate::search::config::SearchConfigBuilder;

    #[test]
    fn test_index_backend_requires_path() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut config = SearchConfigBuilder::new().build();
        config.index_path = None;

        let result = SearchService::new(config, registry);
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_disabled_search_selects_fallback() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut config = SearchConfigBuilder::new().enabled(false).build();
        config.index_path = None;

        let service = SearchService::new(config, registry).unwrap();
        assert!(!service.is_enabled());
    }

    #[tokio::test]
    async fn test_fallback_ignores_mutation_events() {
        let registry = Arc::new(InMemoryRegistry::new());
        let config = SearchConfigBuilder::new()
            .backend(SearchBackendKind::Fallback)
            .build();

        let service = SearchService::new(config, registry).unwrap();
        assert!(service.notify_changed(1).await.is_ok());
        assert!(service.notify_removed(1).await.is_ok());
        assert!(service.update_search_index().await.is_ok());
    }
}
