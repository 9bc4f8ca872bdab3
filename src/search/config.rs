//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Search index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Path to the search index directory
    pub index_path: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Upper bound on the page size of a single query
    pub max_results: u32,

    /// Page size used when a search request does not give one
    pub default_page_size: u32,

    /// Deepest result position a query may reach (`skip + page_size`)
    pub max_result_window: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./data/search_index"),
            writer_heap_size: 50_000_000, // 50MB
            max_results: 1000,
            default_page_size: 25,
            max_result_window: 10_000,
        }
    }
}
