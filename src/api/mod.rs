pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::sync::SyncCoordinator;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<SyncCoordinator>,
    /// Page size for searches that do not give one
    pub search_page_size: u32,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(catalog: Arc<SyncCoordinator>) -> Self {
        Self {
            catalog,
            search_page_size: crate::models::DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_search_page_size(mut self, size: u32) -> Self {
        self.search_page_size = size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
