//! Main search service implementation

use crate::models::PageRequest;
use crate::search::config::SearchConfig;
use crate::search::document::{MovieDocument, MovieFields};
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::{BatchOutcome, IndexManager, IndexStats};
use crate::search::query::{QueryBuilder, SearchRequest};
use crate::search::traits::MovieIndex;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::{DocAddress, Order, TantivyDocument};

/// A single search result hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Relevance score; zero for browse queries
    pub score: f32,

    /// The stored document
    #[serde(flatten)]
    pub document: MovieDocument,
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Hits in rank order
    pub hits: Vec<SearchHit>,

    /// Number of matching documents across all pages
    pub total: usize,

    /// The pagination window actually applied
    pub page: PageRequest,
}

/// Main search service
pub struct SearchService {
    /// Index manager
    index_manager: Arc<IndexManager>,

    /// Configuration
    config: SearchConfig,
}

impl SearchService {
    /// Open (or create) the on-disk index described by the configuration
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        let index_manager = Arc::new(IndexManager::open(&config).await?);

        Ok(Self {
            index_manager,
            config,
        })
    }

    /// Create a service over a RAM-only index
    pub fn in_memory(config: SearchConfig) -> SearchResult<Self> {
        let index_manager = Arc::new(IndexManager::in_memory(&config)?);

        Ok(Self {
            index_manager,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search for movies
    pub async fn search(&self, request: &SearchRequest) -> SearchResult<SearchPage> {
        let start_time = std::time::Instant::now();
        let page = request.page.capped(self.config.max_results);

        let query_builder = QueryBuilder::new(
            self.index_manager.index().clone(),
            *self.index_manager.fields(),
        );
        let tantivy_query = query_builder.build(request);

        let searcher = self.index_manager.reader().searcher();

        // The top-N collector allocates for `skip + take`; past the window only count
        if page.skip().saturating_add(page.take()) > self.config.max_result_window {
            let total = searcher
                .search(&*tantivy_query, &Count)
                .map_err(|e| SearchError::SearchFailed(format!("Search execution failed: {}", e)))?;
            tracing::debug!(
                query = %request.text,
                page = page.page,
                page_size = page.page_size,
                window = self.config.max_result_window,
                "Requested page lies beyond the result window"
            );
            return Ok(SearchPage {
                hits: Vec::new(),
                total,
                page,
            });
        }

        let window = TopDocs::with_limit(page.take()).and_offset(page.skip());

        // Browse has no relevance; order by id so pages are stable
        let (scored, total): (Vec<(f32, DocAddress)>, usize) = if request.is_browse() {
            let collector = window.order_by_fast_field::<u64>("id", Order::Asc);
            let (docs, total) = searcher
                .search(&*tantivy_query, &(collector, Count))
                .map_err(|e| SearchError::SearchFailed(format!("Search execution failed: {}", e)))?;
            (docs.into_iter().map(|(_, address)| (0.0, address)).collect(), total)
        } else {
            searcher
                .search(&*tantivy_query, &(window, Count))
                .map_err(|e| SearchError::SearchFailed(format!("Search execution failed: {}", e)))?
        };

        let fields = self.index_manager.fields();
        let mut hits = Vec::with_capacity(scored.len());

        for (score, doc_address) in scored {
            let retrieved_doc: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| SearchError::SearchFailed(format!("Failed to retrieve doc: {}", e)))?;

            hits.push(SearchHit {
                score,
                document: MovieDocument::from_tantivy_doc(&retrieved_doc, fields)?,
            });
        }

        tracing::debug!(
            query = %request.text,
            total,
            returned = hits.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Search executed"
        );

        Ok(SearchPage { hits, total, page })
    }

    /// Index a single document
    pub async fn index_document(&self, document: &MovieDocument) -> SearchResult<()> {
        self.index_manager.upsert_document(document).await
    }

    /// Index multiple documents
    pub async fn index_documents(&self, documents: &[MovieDocument]) -> SearchResult<BatchOutcome> {
        self.index_manager.upsert_documents(documents).await
    }

    /// Delete a document from the index
    pub async fn delete_document(&self, id: u64) -> SearchResult<()> {
        self.index_manager.delete_document(id).await
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> SearchResult<IndexStats> {
        self.index_manager.get_stats().await
    }
}

#[async_trait]
impl MovieIndex for SearchService {
    async fn ensure_index(&self) -> SearchResult<()> {
        // The manager opened or created the index at construction; verify the
        // live mappings still carry every movie field.
        MovieFields::resolve(&self.index_manager.index().schema())?;
        tracing::debug!(
            created = self.index_manager.was_created(),
            "Search index ready"
        );
        Ok(())
    }

    async fn upsert(&self, document: &MovieDocument) -> SearchResult<()> {
        self.index_document(document).await
    }

    async fn upsert_batch(&self, documents: &[MovieDocument]) -> SearchResult<BatchOutcome> {
        self.index_documents(documents).await
    }

    async fn delete(&self, id: u64) -> SearchResult<()> {
        self.delete_document(id).await
    }

    async fn delete_batch(&self, ids: &[u64]) -> SearchResult<usize> {
        self.index_manager.delete_documents(ids).await
    }

    async fn query(&self, request: &SearchRequest) -> SearchResult<SearchPage> {
        self.search(request).await
    }

    async fn document_ids(&self) -> SearchResult<Vec<u64>> {
        self.index_manager.document_ids().await
    }

    async fn stats(&self) -> SearchResult<IndexStats> {
        self.get_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn document(id: u64, title: &str, description: &str, cast: &[&str]) -> MovieDocument {
        MovieDocument {
            id,
            title: title.to_string(),
            description: description.to_string(),
            release_date: None,
            budget: None,
            collection: None,
            cast: cast.iter().map(|s| s.to_string()).collect(),
            is_hit: false,
            created_at: None,
            updated_at: None,
        }
    }

    async fn create_test_service() -> (SearchService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        (SearchService::new(config).await.unwrap(), temp_dir)
    }

    #[tokio::test]
    async fn test_service_creation() {
        let (service, _dir) = create_test_service().await;
        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.total_documents, 0);
        assert!(service.ensure_index().await.is_ok());
    }

    #[tokio::test]
    async fn test_index_and_search_without_explicit_commit() {
        let (service, _dir) = create_test_service().await;

        service
            .upsert(&document(1, "Gladiator", "A Roman general seeks vengeance", &[]))
            .await
            .unwrap();

        let results = service.query(&SearchRequest::new("gladiator")).await.unwrap();

        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].document.id, 1);
    }

    #[tokio::test]
    async fn test_title_match_outranks_description_match() {
        let (service, _dir) = create_test_service().await;

        service
            .upsert(&document(1, "Quiet harbor", "A storm hits the submarine crew", &[]))
            .await
            .unwrap();
        service
            .upsert(&document(2, "Submarine", "A storm hits the quiet harbor crew", &[]))
            .await
            .unwrap();

        let results = service.query(&SearchRequest::new("submarine")).await.unwrap();

        assert_eq!(results.total, 2);
        assert_eq!(results.hits[0].document.id, 2);
        assert!(results.hits[0].score > results.hits[1].score);
    }

    #[tokio::test]
    async fn test_cast_match_outranks_description_match() {
        let (service, _dir) = create_test_service().await;

        service
            .upsert(&document(1, "Road trip", "Featuring a cameo by Hanks", &["Meg Ryan"]))
            .await
            .unwrap();
        service
            .upsert(&document(2, "Castaway", "Featuring a volleyball named Wilson", &["Tom Hanks"]))
            .await
            .unwrap();

        let results = service.query(&SearchRequest::new("hanks")).await.unwrap();

        assert_eq!(results.hits[0].document.id, 2);
    }

    #[tokio::test]
    async fn test_stopwords_only_query_matches_nothing() {
        let (service, _dir) = create_test_service().await;
        service
            .upsert(&document(1, "The Thing", "The thing from another world", &[]))
            .await
            .unwrap();

        let results = service.query(&SearchRequest::new("the")).await.unwrap();
        assert_eq!(results.total, 0);
    }

    #[tokio::test]
    async fn test_unbalanced_syntax_does_not_fail() {
        let (service, _dir) = create_test_service().await;
        service
            .upsert(&document(1, "Mission Impossible", "", &[]))
            .await
            .unwrap();

        let results = service
            .query(&SearchRequest::new("mission \"impossible"))
            .await;
        assert!(results.is_ok());
    }

    #[tokio::test]
    async fn test_page_size_is_capped() {
        let service = SearchService::in_memory(SearchConfig {
            max_results: 2,
            ..Default::default()
        })
        .unwrap();

        let docs: Vec<_> = (1..=5).map(|id| document(id, "Sequel", "", &[])).collect();
        service.upsert_batch(&docs).await.unwrap();

        let results = service
            .query(&SearchRequest::new("").with_page(PageRequest::new(1, 50)))
            .await
            .unwrap();

        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.total, 5);
        assert_eq!(results.page.page_size, 2);
    }

    #[tokio::test]
    async fn test_page_beyond_result_window_is_empty_with_total() {
        let service = SearchService::in_memory(SearchConfig::default()).unwrap();
        service
            .upsert(&document(1, "Heat", "Los Angeles crime saga", &[]))
            .await
            .unwrap();

        for text in ["heat", ""] {
            let results = service
                .query(&SearchRequest::new(text).with_page(PageRequest::new(4_000_000_000, 1000)))
                .await
                .unwrap();

            assert!(results.hits.is_empty(), "query {:?}", text);
            assert_eq!(results.total, 1);
            assert_eq!(results.page.page, 4_000_000_000);
        }
    }

    #[tokio::test]
    async fn test_last_page_inside_result_window_is_served() {
        let service = SearchService::in_memory(SearchConfig {
            max_result_window: 4,
            ..Default::default()
        })
        .unwrap();

        let docs: Vec<_> = (1..=6).map(|id| document(id, "Sequel", "", &[])).collect();
        service.upsert_batch(&docs).await.unwrap();

        let inside = service
            .query(&SearchRequest::new("").with_page(PageRequest::new(2, 2)))
            .await
            .unwrap();
        let ids: Vec<u64> = inside.hits.iter().map(|hit| hit.document.id).collect();
        assert_eq!(ids, vec![3, 4]);

        let beyond = service
            .query(&SearchRequest::new("").with_page(PageRequest::new(3, 2)))
            .await
            .unwrap();
        assert!(beyond.hits.is_empty());
        assert_eq!(beyond.total, 6);
    }

    #[tokio::test]
    async fn test_browse_orders_by_id_with_zero_score() {
        let service = SearchService::in_memory(SearchConfig::default()).unwrap();

        for id in [9, 3, 5] {
            service.upsert(&document(id, "Any", "", &[])).await.unwrap();
        }

        let results = service.query(&SearchRequest::new("  ")).await.unwrap();
        let ids: Vec<u64> = results.hits.iter().map(|hit| hit.document.id).collect();

        assert_eq!(ids, vec![3, 5, 9]);
        assert!(results.hits.iter().all(|hit| hit.score == 0.0));
        assert_eq!(
            results.total as u64,
            service.stats().await.unwrap().total_documents
        );
    }
}
