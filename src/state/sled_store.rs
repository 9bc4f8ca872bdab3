use crate::error::{AppError, Result};
use crate::models::{MovieDraft, MoviePatch, MovieRecord, PageRequest};
use crate::state::store::select_page;
use crate::state::{MovieFilter, MovieStore};
use async_trait::async_trait;
use chrono::Utc;
use sled::Db;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

/// Persistent movie store using Sled embedded database
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    movies_tree: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref();
        let db = sled::open(&path).map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open Sled database: {}", e))
        })?;

        let movies_tree = db.open_tree("movies").map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open movies tree: {}", e))
        })?;

        tracing::info!("Initialized Sled store at {:?}", path_str);

        Ok(Self {
            db: Arc::new(db),
            movies_tree,
        })
    }

    /// Serialize movie to bytes
    fn serialize_movie(movie: &MovieRecord) -> Result<Vec<u8>> {
        bincode::serialize(movie)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize movie: {}", e)))
    }

    /// Deserialize movie from bytes
    fn deserialize_movie(bytes: &[u8]) -> Result<MovieRecord> {
        bincode::deserialize(bytes)
            .map_err(|e| AppError::Serialization(format!("Failed to deserialize movie: {}", e)))
    }

    /// Big-endian keys keep the tree iterating in identifier order
    fn movie_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    /// Allocate the next identifier.
    ///
    /// Sled's generator is monotonic across restarts and may skip values after
    /// a crash, but never returns one twice.
    fn next_id(&self) -> Result<u64> {
        self.db
            .generate_id()
            .map(|id| id + 1)
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to allocate movie id: {}", e)))
    }

    async fn flush(&self) -> Result<()> {
        self.movies_tree.flush_async().await.map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to flush movies tree: {}", e))
        })?;
        Ok(())
    }

    fn scan(&self) -> impl Iterator<Item = Result<MovieRecord>> + '_ {
        self.movies_tree.iter().values().map(|value| {
            let bytes = value.map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to scan movies: {}", e))
            })?;
            Self::deserialize_movie(&bytes)
        })
    }
}

#[async_trait]
impl MovieStore for SledStore {
    async fn create_movie(&self, draft: MovieDraft) -> Result<MovieRecord> {
        let id = self.next_id()?;
        let movie = MovieRecord::from_draft(id, draft, Utc::now());
        let value = Self::serialize_movie(&movie)?;

        self.movies_tree
            .insert(Self::movie_key(id), value)
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to save movie: {}", e)))?;

        self.flush().await?;

        tracing::debug!(movie_id = id, "Movie saved to Sled");
        Ok(movie)
    }

    async fn get_movie(&self, id: u64) -> Result<Option<MovieRecord>> {
        match self.movies_tree.get(Self::movie_key(id)) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize_movie(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::StoreUnavailable(format!(
                "Failed to get movie: {}",
                e
            ))),
        }
    }

    async fn update_movie(&self, id: u64, patch: MoviePatch) -> Result<Option<MovieRecord>> {
        let key = Self::movie_key(id);

        // Compare-and-swap so a concurrent delete is never resurrected by a late update
        loop {
            let current = self.movies_tree.get(key).map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to read movie: {}", e))
            })?;

            let Some(current) = current else {
                return Ok(None);
            };

            let mut movie = Self::deserialize_movie(&current)?;
            movie.apply(patch.clone(), Utc::now());
            let value = Self::serialize_movie(&movie)?;

            let swapped = self
                .movies_tree
                .compare_and_swap(key, Some(current), Some(value))
                .map_err(|e| {
                    AppError::StoreUnavailable(format!("Failed to update movie: {}", e))
                })?;

            match swapped {
                Ok(()) => {
                    self.flush().await?;
                    tracing::debug!(movie_id = id, "Movie updated in Sled");
                    return Ok(Some(movie));
                }
                Err(conflict) if conflict.current.is_none() => return Ok(None),
                Err(_) => {
                    tracing::debug!(movie_id = id, "Concurrent update detected, retrying");
                }
            }
        }
    }

    async fn delete_movie(&self, id: u64) -> Result<Option<MovieRecord>> {
        let removed = self
            .movies_tree
            .remove(Self::movie_key(id))
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to delete movie: {}", e)))?;

        match removed {
            Some(bytes) => {
                self.flush().await?;
                tracing::debug!(movie_id = id, "Movie deleted from Sled");
                Ok(Some(Self::deserialize_movie(&bytes)?))
            }
            None => Ok(None),
        }
    }

    async fn list_movies(&self, filter: &MovieFilter, page: PageRequest) -> Result<Vec<MovieRecord>> {
        let movies = self.scan().collect::<Result<Vec<_>>>()?;
        Ok(select_page(movies.into_iter(), filter, page))
    }

    async fn list_after(&self, after: Option<u64>, limit: usize) -> Result<Vec<MovieRecord>> {
        let lower = match after {
            Some(after) => Bound::Excluded(Self::movie_key(after)),
            None => Bound::Unbounded,
        };

        self.movies_tree
            .range::<[u8; 8], _>((lower, Bound::Unbounded))
            .values()
            .take(limit)
            .map(|value| {
                let bytes = value.map_err(|e| {
                    AppError::StoreUnavailable(format!("Failed to scan movies: {}", e))
                })?;
                Self::deserialize_movie(&bytes)
            })
            .collect()
    }

    async fn count_movies(&self, filter: &MovieFilter) -> Result<u64> {
        if filter.is_unconstrained() {
            return Ok(self.movies_tree.len() as u64);
        }

        let mut count = 0;
        for movie in self.scan() {
            if filter.matches(&movie?) {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sled_create_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();

        let created = store
            .create_movie(
                MovieDraft::new("Avatar", "Pandora")
                    .with_collection(2_923_706_026)
                    .with_cast(vec!["Sam Worthington", "Zoe Saldana"]),
            )
            .await
            .unwrap();

        let fetched = store.get_movie(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.collection, Some(2_923_706_026));
    }

    #[tokio::test]
    async fn test_sled_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        let first_id = {
            let store = SledStore::new(&path).unwrap();
            let movie = store.create_movie(MovieDraft::new("Persisted", "")).await.unwrap();
            store.delete_movie(movie.id).await.unwrap();
            movie.id
        };

        let store = SledStore::new(&path).unwrap();
        let next = store.create_movie(MovieDraft::new("After reopen", "")).await.unwrap();
        assert!(next.id > first_id);
        assert!(store.get_movie(first_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sled_update_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();

        let movie = store
            .create_movie(MovieDraft::new("Draft", "").with_hit(true))
            .await
            .unwrap();

        let updated = store
            .update_movie(
                movie.id,
                MoviePatch {
                    release_date: NaiveDate::from_ymd_opt(1999, 3, 31),
                    is_hit: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Draft");
        assert!(!updated.is_hit);
        assert_eq!(updated.release_date, NaiveDate::from_ymd_opt(1999, 3, 31));
        assert!(updated.updated_at >= movie.updated_at);

        let removed = store.delete_movie(movie.id).await.unwrap();
        assert!(removed.is_some());
        assert!(store
            .update_movie(movie.id, MoviePatch::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sled_list_after_batches() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();

        let mut ids = Vec::new();
        for i in 0..7 {
            let movie = store
                .create_movie(MovieDraft::new(format!("Movie {}", i), ""))
                .await
                .unwrap();
            ids.push(movie.id);
        }

        let mut seen = Vec::new();
        let mut after = None;
        loop {
            let batch = store.list_after(after, 3).await.unwrap();
            if batch.is_empty() {
                break;
            }
            after = batch.last().map(|m| m.id);
            seen.extend(batch.into_iter().map(|m| m.id));
        }

        assert_eq!(seen, ids);
    }
}
