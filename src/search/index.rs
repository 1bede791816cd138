//! Engine-backed search index
//!
//! Owns a rebuildable tantivy index behind a single reader/writer lock.
//! Externally the index is only ever ABSENT or READY: every mutating
//! operation (ensure, rebuild, upsert, delete) holds the write guard for
//! its entire duration, including existence checks and the reader reload
//! after commit, so a query acquiring the read guard can never observe a
//! deleted-but-not-recreated or partially populated index.

use crate::models::ExtensionSnapshot;
use crate::registry::ExtensionRegistry;
use crate::search::config::SearchConfig;
use crate::search::document::{build_extension_schema, SearchEntry};
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::{
    page_ids, sort_entries, PageRequest, QueryOptions, RankedEntry, SearchResponse,
};
use crate::search::relevance::{RelevanceScorer, RelevanceStats};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{
    AllQuery, BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, PhrasePrefixQuery, PhraseQuery,
    Query, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption, Schema};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

/// Everything owned while the index is READY
struct IndexHandle {
    writer: IndexWriter,
    reader: IndexReader,
}

impl IndexHandle {
    /// Open the index at `path`, creating it when absent
    fn open(path: &Path, schema: &Schema, writer_heap_size: usize) -> SearchResult<Self> {
        std::fs::create_dir_all(path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        let index = if index_exists(path) {
            Index::open_in_dir(path).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })?
        } else {
            Index::create_in_dir(path, schema.clone()).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
            })?
        };

        let writer = index
            .writer(writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        // Reloading is driven manually right after each commit, while the
        // write guard is still held
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        Ok(Self { writer, reader })
    }

    fn commit_and_reload(&mut self) -> SearchResult<()> {
        self.writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit: {}", e)))?;
        self.reader.reload()?;
        Ok(())
    }
}

fn index_exists(path: &Path) -> bool {
    path.join("meta.json").exists()
}

/// Tantivy-backed query backend
pub struct SearchIndex {
    registry: Arc<dyn ExtensionRegistry>,
    scorer: RelevanceScorer,
    config: SearchConfig,
    index_path: PathBuf,
    schema: Schema,
    state: RwLock<Option<IndexHandle>>,
}

impl SearchIndex {
    pub fn new(
        config: SearchConfig,
        index_path: PathBuf,
        registry: Arc<dyn ExtensionRegistry>,
        scorer: RelevanceScorer,
    ) -> Self {
        Self {
            registry,
            scorer,
            config,
            index_path,
            schema: build_extension_schema(),
            state: RwLock::new(None),
        }
    }

    fn field(&self, name: &str) -> SearchResult<Field> {
        self.schema.get_field(name).map_err(SearchError::from)
    }

    /// Initialize the index.
    ///
    /// Hard mode (`clear` true) deletes the on-disk index unconditionally,
    /// recreates it and fully repopulates. Soft mode creates and populates
    /// the index only when it does not exist yet; an existing index is left
    /// untouched, which makes the call idempotent and safe at every
    /// process start.
    pub async fn ensure_index(&self, clear: bool) -> SearchResult<()> {
        let mut state = self.state.write().await;

        if clear {
            // Drop writer and reader before wiping the directory
            *state = None;
            if self.index_path.exists() {
                std::fs::remove_dir_all(&self.index_path).map_err(|e| {
                    SearchError::IndexInitFailed(format!(
                        "Failed to clear index directory: {}",
                        e
                    ))
                })?;
            }
            let mut handle =
                IndexHandle::open(&self.index_path, &self.schema, self.config.writer_heap_size)?;
            self.populate(&mut handle).await?;
            *state = Some(handle);
            return Ok(());
        }

        if state.is_some() {
            return Ok(());
        }
        let existed = index_exists(&self.index_path);
        let mut handle =
            IndexHandle::open(&self.index_path, &self.schema, self.config.writer_heap_size)?;
        if !existed {
            self.populate(&mut handle).await?;
        }
        *state = Some(handle);
        Ok(())
    }

    /// Re-index every active extension under the write guard
    pub async fn rebuild_all(&self) -> SearchResult<()> {
        let mut state = self.state.write().await;
        let handle = state.as_mut().ok_or(SearchError::IndexNotReady)?;
        self.populate(handle).await
    }

    async fn populate(&self, handle: &mut IndexHandle) -> SearchResult<()> {
        let start = std::time::Instant::now();
        let extensions = self.registry.list_active_extensions().await?;
        if extensions.is_empty() {
            // An empty snapshot may be a transient read; keep whatever the
            // index currently holds instead of wiping it
            tracing::warn!("Active extension snapshot is empty, keeping existing search index");
            return Ok(());
        }

        // One stats instance for the whole batch keeps the ranking
        // internally consistent across it
        let stats = RelevanceStats::collect(self.registry.as_ref()).await?;
        let id_field = self.field("id")?;

        for ext in &extensions {
            let entry = self
                .scorer
                .make_entry(self.registry.as_ref(), ext, &stats)
                .await?;
            handle
                .writer
                .delete_term(Term::from_field_i64(id_field, entry.id));
            handle
                .writer
                .add_document(entry.to_tantivy_doc(&self.schema))
                .map_err(|e| {
                    SearchError::IndexingFailed(format!(
                        "Failed to add document {}: {}",
                        entry.extension_id, e
                    ))
                })?;
        }
        handle.commit_and_reload()?;

        tracing::info!(
            indexed = extensions.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search index updated"
        );
        Ok(())
    }

    /// Write a single entry, replacing any previous entry with the same id.
    ///
    /// Stats are computed fresh for this call, so the entry's relevance may
    /// drift slightly from the last batch rebuild; the daily soft rebuild
    /// re-converges the whole catalog.
    pub async fn upsert_one(&self, ext: &ExtensionSnapshot) -> SearchResult<()> {
        let mut state = self.state.write().await;
        let handle = state.as_mut().ok_or(SearchError::IndexNotReady)?;

        let stats = RelevanceStats::collect(self.registry.as_ref()).await?;
        let entry = self
            .scorer
            .make_entry(self.registry.as_ref(), ext, &stats)
            .await?;

        let id_field = self.field("id")?;
        handle
            .writer
            .delete_term(Term::from_field_i64(id_field, entry.id));
        handle
            .writer
            .add_document(entry.to_tantivy_doc(&self.schema))
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to add document: {}", e)))?;
        handle.commit_and_reload()?;

        tracing::debug!(extension_id = ext.id, "Search entry updated");
        Ok(())
    }

    /// Remove an entry; removing an absent entry is a successful no-op
    pub async fn delete_one(&self, extension_id: i64) -> SearchResult<()> {
        let mut state = self.state.write().await;
        let handle = state.as_mut().ok_or(SearchError::IndexNotReady)?;

        let id_field = self.field("id")?;
        handle
            .writer
            .delete_term(Term::from_field_i64(id_field, extension_id));
        handle
            .commit_and_reload()
            .map_err(|e| SearchError::DeletionFailed(e.to_string()))?;

        tracing::debug!(extension_id = extension_id, "Search entry removed");
        Ok(())
    }

    /// Execute a query under the read guard
    pub async fn query(
        &self,
        options: &QueryOptions,
        page: &PageRequest,
    ) -> SearchResult<SearchResponse> {
        options.validate()?;

        let state = self.state.read().await;
        let handle = state.as_ref().ok_or(SearchError::IndexNotReady)?;
        let searcher = handle.reader.searcher();

        let query = self.build_query(options)?;
        let collector = (
            Count,
            TopDocs::with_limit(self.config.max_results.max(1)),
        );
        let (total_hits, top_docs) = searcher
            .search(&*query, &collector)
            .map_err(|e| SearchError::SearchFailed(format!("Search execution failed: {}", e)))?;

        let mut ranked = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address).map_err(|e| {
                SearchError::SearchFailed(format!("Failed to retrieve document: {}", e))
            })?;
            ranked.push(RankedEntry {
                entry: SearchEntry::from_tantivy_doc(&doc, &self.schema),
                score,
            });
        }

        sort_entries(&mut ranked, options.sort_by, options.sort_order);

        Ok(SearchResponse {
            extension_ids: page_ids(&ranked, page),
            total_hits: total_hits as u64,
        })
    }

    /// Build the tantivy query for the given options.
    ///
    /// An exact match on the fully qualified extension id ranks above
    /// everything else; fuzzy multi-field matches are weighted per field
    /// (name and display name highest, tags next, namespace lower,
    /// description unboosted); prefix matches on display name and
    /// namespace contribute a secondary boost. The category filter is an
    /// unscored must clause and is never relaxed.
    fn build_query(&self, options: &QueryOptions) -> SearchResult<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        if let Some(text) = options
            .query_string
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let mut should: Vec<(Occur, Box<dyn Query>)> = Vec::new();

            let extension_id_field = self.field("extension_id")?;
            should.push((
                Occur::Should,
                Box::new(BoostQuery::new(
                    Box::new(TermQuery::new(
                        Term::from_field_text(extension_id_field, text),
                        IndexRecordOption::Basic,
                    )),
                    10.0,
                )),
            ));

            let tokens = tokenize(text);
            for (field_name, boost) in [
                ("name", 5.0),
                ("display_name", 5.0),
                ("tags", 3.0),
                ("namespace", 2.0),
                ("description", 1.0),
            ] {
                let field = self.field(field_name)?;
                for token in &tokens {
                    let fuzzy = FuzzyTermQuery::new(
                        Term::from_field_text(field, token),
                        fuzzy_distance(token),
                        true,
                    );
                    should.push((
                        Occur::Should,
                        Box::new(BoostQuery::new(Box::new(fuzzy), boost)),
                    ));
                }
            }

            if !tokens.is_empty() {
                let display_name_field = self.field("display_name")?;
                let display_name_terms: Vec<Term> = tokens
                    .iter()
                    .map(|t| Term::from_field_text(display_name_field, t))
                    .collect();
                should.push((
                    Occur::Should,
                    Box::new(BoostQuery::new(
                        Box::new(PhrasePrefixQuery::new(display_name_terms)),
                        2.0,
                    )),
                ));

                let namespace_field = self.field("namespace")?;
                let namespace_terms: Vec<Term> = tokens
                    .iter()
                    .map(|t| Term::from_field_text(namespace_field, t))
                    .collect();
                should.push((
                    Occur::Should,
                    Box::new(PhrasePrefixQuery::new(namespace_terms)),
                ));
            }

            clauses.push((Occur::Must, Box::new(BooleanQuery::new(should))));
        }

        if let Some(category) = options.category.as_deref().filter(|s| !s.trim().is_empty()) {
            let categories_field = self.field("categories")?;
            let terms: Vec<Term> = tokenize(category)
                .iter()
                .map(|t| Term::from_field_text(categories_field, t))
                .collect();
            if let Some(first) = terms.first().cloned() {
                let filter: Box<dyn Query> = if terms.len() == 1 {
                    Box::new(TermQuery::new(first, IndexRecordOption::Basic))
                } else {
                    Box::new(PhraseQuery::new(terms))
                };
                // Pure filter: matches are required but contribute no score
                clauses.push((Occur::Must, Box::new(BoostQuery::new(filter, 0.0))));
            }
        }

        if clauses.is_empty() {
            Ok(Box::new(AllQuery))
        } else {
            Ok(Box::new(BooleanQuery::new(clauses)))
        }
    }
}

/// Lowercase tokens the way the default text analyzer produces them
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Edit-distance tolerance grows with term length
fn fuzzy_distance(token: &str) -> u8 {
    match token.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Red Hat"), vec!["red", "hat"]);
        assert_eq!(tokenize("redhat.yaml"), vec!["redhat", "yaml"]);
        assert!(tokenize("  ").is_empty());
    }

    #[test]
    fn test_fuzzy_distance_scales_with_length() {
        assert_eq!(fuzzy_distance("go"), 0);
        assert_eq!(fuzzy_distance("yaml"), 1);
        assert_eq!(fuzzy_distance("openshift"), 2);
    }
}
