//! Search index trait abstraction

use crate::search::document::MovieDocument;
use crate::search::error::SearchResult;
use crate::search::index::{BatchOutcome, IndexStats};
use crate::search::query::SearchRequest;
use crate::search::service::SearchPage;
use async_trait::async_trait;

/// The derived full-text projection of the movie catalog
#[async_trait]
pub trait MovieIndex: Send + Sync {
    /// Make sure the index exists with the movie field mappings
    async fn ensure_index(&self) -> SearchResult<()>;

    /// Insert or fully replace one document; visible to queries once this returns
    async fn upsert(&self, document: &MovieDocument) -> SearchResult<()>;

    /// Insert or fully replace many documents with one commit
    async fn upsert_batch(&self, documents: &[MovieDocument]) -> SearchResult<BatchOutcome>;

    /// Remove a document; absent documents are not an error
    async fn delete(&self, id: u64) -> SearchResult<()>;

    /// Remove many documents, returning how many deletions were issued
    async fn delete_batch(&self, ids: &[u64]) -> SearchResult<usize>;

    /// Run a ranked search
    async fn query(&self, request: &SearchRequest) -> SearchResult<SearchPage>;

    /// Identifiers of every document currently in the index, ascending
    async fn document_ids(&self) -> SearchResult<Vec<u64>>;

    /// Index statistics
    async fn stats(&self) -> SearchResult<IndexStats>;
}
