//! Search configuration

use crate::search::relevance::RelevanceWeights;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which query backend serves search requests.
///
/// The backend is selected once, when the search service is constructed;
/// there is no per-request switching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchBackendKind {
    /// Tantivy-backed persistent index
    #[default]
    Index,

    /// In-memory recompute-per-query fallback
    Fallback,
}

/// Search subsystem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether the engine-backed index is enabled; when false the fallback
    /// backend serves all queries
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Backend selection
    #[serde(default)]
    pub backend: SearchBackendKind,

    /// Path to the search index directory (required for the index backend)
    pub index_path: Option<PathBuf>,

    /// Delete and rebuild the index on startup
    #[serde(default)]
    pub clear_on_start: bool,

    /// Index writer heap size in bytes (default: 50MB)
    #[serde(default = "default_writer_heap_size")]
    pub writer_heap_size: usize,

    /// Maximum matches collected per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Relevance score weights
    #[serde(default)]
    pub relevance: RelevanceWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: SearchBackendKind::Index,
            index_path: Some(PathBuf::from("./data/search-index")),
            clear_on_start: false,
            writer_heap_size: default_writer_heap_size(),
            max_results: default_max_results(),
            relevance: RelevanceWeights::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_writer_heap_size() -> usize {
    50_000_000
}

fn default_max_results() -> usize {
    1000
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn backend(mut self, backend: SearchBackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = Some(path);
        self
    }

    pub fn clear_on_start(mut self, clear: bool) -> Self {
        self.config.clear_on_start = clear;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn relevance(mut self, weights: RelevanceWeights) -> Self {
        self.config.relevance = weights;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert!(config.enabled);
        assert_eq!(config.backend, SearchBackendKind::Index);
        assert!(!config.clear_on_start);
        assert_eq!(config.max_results, 1000);
    }

    #[test]
    fn test_builder() {
        let config = SearchConfigBuilder::new()
            .backend(SearchBackendKind::Fallback)
            .max_results(50)
            .build();
        assert_eq!(config.backend, SearchBackendKind::Fallback);
        assert_eq!(config.max_results, 50);
    }
}
