//! Search index management

use crate::search::config::SearchConfig;
use crate::search::document::{build_movie_schema, register_movie_analyzer, MovieDocument, MovieFields};
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tantivy::collector::DocSetCollector;
use tantivy::query::AllQuery;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::Mutex;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of live documents in the index
    pub total_documents: u64,

    /// Number of segments
    pub num_segments: usize,
}

/// Result of a committed batch upsert
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Identifiers that were written and committed
    pub indexed: Vec<u64>,
}

/// Manages the Tantivy search index
pub struct IndexManager {
    /// The Tantivy index
    index: Index,

    /// Resolved field handles
    fields: MovieFields,

    /// Single writer; Tantivy allows only one per index
    writer: Mutex<IndexWriter>,

    /// Index reader, reloaded explicitly after every commit
    reader: IndexReader,

    /// Whether this call created the index
    created: bool,
}

impl IndexManager {
    /// Open the index, creating it with the movie mappings if it does not exist yet
    pub async fn open(config: &SearchConfig) -> SearchResult<Self> {
        // Create index directory if it doesn't exist
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        let created = !Self::index_exists(&config.index_path);

        let index = if created {
            Index::create_in_dir(&config.index_path, build_movie_schema()).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
            })?
        } else {
            Index::open_in_dir(&config.index_path).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })?
        };

        Self::from_index(index, config, created)
    }

    /// Build a manager over an in-RAM index
    pub fn in_memory(config: &SearchConfig) -> SearchResult<Self> {
        let index = Index::create_in_ram(build_movie_schema());
        Self::from_index(index, config, true)
    }

    fn from_index(index: Index, config: &SearchConfig, created: bool) -> SearchResult<Self> {
        let fields = MovieFields::resolve(&index.schema())?;

        register_movie_analyzer(&index);

        let writer = index
            .writer(config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        // Manual reload: callers see their own writes as soon as a commit returns
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        if created {
            tracing::info!(path = ?config.index_path, "Created search index");
        } else {
            tracing::debug!(path = ?config.index_path, "Opened existing search index");
        }

        Ok(Self {
            index,
            fields,
            writer: Mutex::new(writer),
            reader,
            created,
        })
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    /// Get the resolved fields
    pub fn fields(&self) -> &MovieFields {
        &self.fields
    }

    /// Get the index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Get the reader
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Whether the index was created (rather than reopened) by this manager
    pub fn was_created(&self) -> bool {
        self.created
    }

    fn id_term(&self, id: u64) -> Term {
        Term::from_field_u64(self.fields.id, id)
    }

    /// Commit under the held writer lock and make the commit visible to searchers
    fn commit_and_reload(&self, writer: &mut IndexWriter) -> tantivy::Result<()> {
        writer.commit()?;
        self.reader.reload()
    }

    /// Drop every uncommitted operation so a half-staged replacement never
    /// reaches a later commit.
    fn abandon(
        &self,
        writer: &mut IndexWriter,
        id: u64,
        reason: impl std::fmt::Display,
    ) -> SearchError {
        if let Err(e) = writer.rollback() {
            tracing::error!(movie_id = id, error = %e, "Failed to roll back index writer");
        }
        SearchError::IndexingFailed(format!("Failed to add document {}: {}", id, reason))
    }

    /// Replace the document stored under the movie's identifier
    pub async fn upsert_document(&self, document: &MovieDocument) -> SearchResult<()> {
        let tantivy_doc = document.to_tantivy_doc(&self.fields);

        let mut writer = self.writer.lock().await;

        // Delete before add: a delete only applies to documents with an older opstamp
        writer.delete_term(self.id_term(document.id));
        if let Err(e) = writer.add_document(tantivy_doc) {
            return Err(self.abandon(&mut writer, document.id, e));
        }

        self.commit_and_reload(&mut writer).map_err(|e| {
            SearchError::IndexingFailed(format!("Failed to commit document {}: {}", document.id, e))
        })?;

        Ok(())
    }

    /// Replace a batch of documents with a single commit.
    ///
    /// The batch is all or nothing: if any document cannot be staged, nothing
    /// from the batch is committed.
    pub async fn upsert_documents(&self, documents: &[MovieDocument]) -> SearchResult<BatchOutcome> {
        let mut writer = self.writer.lock().await;
        let mut outcome = BatchOutcome::default();

        for document in documents {
            writer.delete_term(self.id_term(document.id));

            if let Err(e) = writer.add_document(document.to_tantivy_doc(&self.fields)) {
                return Err(self.abandon(&mut writer, document.id, e));
            }
            outcome.indexed.push(document.id);
        }

        self.commit_and_reload(&mut writer)
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit batch: {}", e)))?;

        Ok(outcome)
    }

    /// Delete a document by ID; deleting an absent document is not an error
    pub async fn delete_document(&self, id: u64) -> SearchResult<()> {
        let mut writer = self.writer.lock().await;

        writer.delete_term(self.id_term(id));

        self.commit_and_reload(&mut writer).map_err(|e| {
            SearchError::DeletionFailed(format!("Failed to commit deletion of {}: {}", id, e))
        })?;

        Ok(())
    }

    /// Delete multiple documents by IDs
    pub async fn delete_documents(&self, ids: &[u64]) -> SearchResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut writer = self.writer.lock().await;

        for id in ids {
            writer.delete_term(self.id_term(*id));
        }

        self.commit_and_reload(&mut writer)
            .map_err(|e| SearchError::DeletionFailed(format!("Failed to commit deletions: {}", e)))?;

        Ok(ids.len())
    }

    /// Identifiers of every live document
    pub async fn document_ids(&self) -> SearchResult<Vec<u64>> {
        let searcher = self.reader.searcher();

        let addresses = searcher
            .search(&AllQuery, &DocSetCollector)
            .map_err(|e| SearchError::SearchFailed(format!("Failed to enumerate documents: {}", e)))?;

        let mut ids = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| SearchError::SearchFailed(format!("Failed to retrieve doc: {}", e)))?;
            let document = MovieDocument::from_tantivy_doc(&doc, &self.fields)?;
            ids.push(document.id);
        }

        ids.sort_unstable();
        Ok(ids)
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();

        Ok(IndexStats {
            total_documents: searcher.num_docs(),
            num_segments: searcher.segment_readers().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn document(id: u64, title: &str) -> MovieDocument {
        MovieDocument {
            id,
            title: title.to_string(),
            description: String::new(),
            release_date: None,
            budget: None,
            collection: None,
            cast: vec![],
            is_hit: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_index_creation_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        {
            let manager = IndexManager::open(&config).await.unwrap();
            assert!(manager.was_created());
            manager.upsert_document(&document(1, "Jaws")).await.unwrap();
        }

        let reopened = IndexManager::open(&config).await.unwrap();
        assert!(!reopened.was_created());
        assert_eq!(reopened.get_stats().await.unwrap().total_documents, 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_document() {
        let manager = IndexManager::in_memory(&SearchConfig::default()).unwrap();

        manager.upsert_document(&document(7, "First title")).await.unwrap();
        manager.upsert_document(&document(7, "Second title")).await.unwrap();

        assert_eq!(manager.get_stats().await.unwrap().total_documents, 1);
        assert_eq!(manager.document_ids().await.unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn test_delete_absent_document_is_ok() {
        let manager = IndexManager::in_memory(&SearchConfig::default()).unwrap();
        assert!(manager.delete_document(404).await.is_ok());
    }

    #[tokio::test]
    async fn test_batch_upsert_and_delete() {
        let manager = IndexManager::in_memory(&SearchConfig::default()).unwrap();

        let docs: Vec<_> = (1..=4).map(|id| document(id, "Batch")).collect();
        let outcome = manager.upsert_documents(&docs).await.unwrap();
        assert_eq!(outcome.indexed, vec![1, 2, 3, 4]);

        let deleted = manager.delete_documents(&[2, 4]).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(manager.document_ids().await.unwrap(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_abandoned_replacement_keeps_previous_document() {
        let manager = IndexManager::in_memory(&SearchConfig::default()).unwrap();
        manager.upsert_document(&document(7, "Original")).await.unwrap();

        {
            let mut writer = manager.writer.lock().await;
            writer.delete_term(manager.id_term(7));
            let err = manager.abandon(&mut writer, 7, "writer unavailable");
            assert!(matches!(err, SearchError::IndexingFailed(_)));
        }

        // A later commit must not carry the staged delete
        manager.upsert_document(&document(8, "Other")).await.unwrap();

        assert_eq!(manager.document_ids().await.unwrap(), vec![7, 8]);
    }
}
