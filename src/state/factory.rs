use crate::config::{StoreBackend, StoreConfig};
use crate::error::{AppError, Result};
use crate::state::{InMemoryStore, MovieStore, SledStore};
use std::sync::Arc;

/// Create a movie store based on configuration
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn MovieStore>> {
    match config.backend {
        StoreBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration("Sled backend requires 'path' configuration".to_string())
            })?;

            tracing::info!(path = ?path, "Initializing Sled storage backend");

            let store = SledStore::new(path)?;
            Ok(Arc::new(store))
        }

        StoreBackend::Memory => {
            tracing::warn!("In-memory storage backend selected, movies will not survive a restart");
            Ok(create_in_memory_store())
        }
    }
}

/// Create an in-memory store (for testing and development)
pub fn create_in_memory_store() -> Arc<dyn MovieStore> {
    tracing::info!("Initializing in-memory storage backend");
    Arc::new(InMemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MovieFilter;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_sled_store() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::Sled,
            path: Some(temp_dir.path().to_path_buf()),
        };

        let store = create_store(&config).unwrap();
        assert_eq!(store.count_movies(&MovieFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_in_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            path: None,
        };

        let store = create_store(&config).unwrap();
        assert!(store.count_movies(&MovieFilter::default()).await.is_ok());
    }

    #[test]
    fn test_sled_requires_path() {
        let config = StoreConfig {
            backend: StoreBackend::Sled,
            path: None,
        };

        let result = create_store(&config);
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
