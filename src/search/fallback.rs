//! In-memory fallback query backend
//!
//! Serves search requests when no search engine is configured. Every query
//! re-reads the live active-extension snapshot and recomputes relevance
//! from scratch, so indexing notifications are meaningless here and there
//! is no shared mutable state to lock: any number of queries can run
//! concurrently.
//!
//! Text matching is a deliberately simpler affair than the engine's fuzzy
//! multi-field query: a case-insensitive substring check against
//! namespace, name, display name and description. The reduced match
//! fidelity is the accepted cost of having a backend with no index to
//! maintain.

use crate::registry::ExtensionRegistry;
use crate::search::error::SearchResult;
use crate::search::query::{
    page_ids, sort_entries, PageRequest, QueryOptions, RankedEntry, SearchResponse,
};
use crate::search::relevance::{RelevanceScorer, RelevanceStats};
use std::sync::Arc;

/// Query backend that recomputes everything per call from live snapshots
pub struct FallbackSearchEngine {
    registry: Arc<dyn ExtensionRegistry>,
    scorer: RelevanceScorer,
}

impl FallbackSearchEngine {
    pub fn new(registry: Arc<dyn ExtensionRegistry>, scorer: RelevanceScorer) -> Self {
        Self { registry, scorer }
    }

    pub async fn search(
        &self,
        options: &QueryOptions,
        page: &PageRequest,
    ) -> SearchResult<SearchResponse> {
        options.validate()?;

        let extensions = self.registry.list_active_extensions().await?;
        // One stats instance for this call; scores are recomputed every
        // query, but the id tie-break keeps pagination stable anyway
        let stats = RelevanceStats::collect(self.registry.as_ref()).await?;

        let needle = options
            .query_string
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let category = options.category.as_deref().filter(|s| !s.trim().is_empty());

        let mut ranked = Vec::with_capacity(extensions.len());
        for ext in &extensions {
            if let Some(category) = category {
                if !ext.categories.iter().any(|c| c == category) {
                    continue;
                }
            }
            if let Some(ref needle) = needle {
                if !matches_text(ext, needle) {
                    continue;
                }
            }
            let entry = self
                .scorer
                .make_entry(self.registry.as_ref(), ext, &stats)
                .await?;
            ranked.push(RankedEntry { entry, score: 0.0 });
        }

        sort_entries(&mut ranked, options.sort_by, options.sort_order);

        Ok(SearchResponse {
            extension_ids: page_ids(&ranked, page),
            total_hits: ranked.len() as u64,
        })
    }
}

/// Case-insensitive substring match against the text fields
fn matches_text(ext: &crate::models::ExtensionSnapshot, needle: &str) -> bool {
    ext.namespace.to_lowercase().contains(needle)
        || ext.name.to_lowercase().contains(needle)
        || ext
            .display_name
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(needle))
        || ext
            .description
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtensionSnapshot;

    fn snapshot(namespace: &str, name: &str) -> ExtensionSnapshot {
        ExtensionSnapshot::new(1, namespace, name)
    }

    #[test]
    fn test_matches_namespace_and_name() {
        let ext = snapshot("redhat", "yaml");
        assert!(matches_text(&ext, "redhat"));
        assert!(matches_text(&ext, "yam"));
        assert!(!matches_text(&ext, "openshift"));
    }

    #[test]
    fn test_matches_display_name_case_insensitive() {
        let mut ext = snapshot("redhat", "java");
        ext.display_name = Some("Red Hat".to_string());
        assert!(matches_text(&ext, "red hat"));
    }

    #[test]
    fn test_matches_description() {
        let mut ext = snapshot("redhat", "openshift");
        ext.description = Some("my custom desc".to_string());
        assert!(matches_text(&ext, "custom"));
    }
}
