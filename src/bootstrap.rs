use crate::config::Config;
use crate::error::Result;
use crate::search::{MovieIndex, SearchService};
use crate::state::create_store;
use crate::sync::SyncCoordinator;
use std::sync::Arc;

/// Open the record store and the search index described by the configuration
/// and wire them into a coordinator. The index is created on first use.
pub async fn open_catalog(config: &Config) -> Result<Arc<SyncCoordinator>> {
    tracing::info!(backend = ?config.store.backend, "Opening record store");
    let store = create_store(&config.store)?;

    tracing::info!(path = ?config.search.index_path, "Opening search index");
    let index = SearchService::new(config.search.clone()).await?;
    index.ensure_index().await?;

    Ok(Arc::new(SyncCoordinator::new(store, Arc::new(index))))
}
