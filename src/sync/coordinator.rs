//! Best-effort propagation of store mutations to the search index

use crate::error::Result;
use crate::metrics::INDEX_PROPAGATION_TOTAL;
use crate::models::{MovieDraft, MoviePatch, MovieRecord};
use crate::search::{MovieDocument, MovieIndex};
use crate::state::MovieStore;
use serde::Serialize;
use std::sync::Arc;

/// What happened to the search index after a successful store mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Propagation {
    /// The index reflects the mutation
    Applied,
    /// The index is stale until the next upsert of this movie or a backfill
    Failed(String),
}

impl Propagation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Propagation::Applied)
    }
}

/// A committed mutation together with its index propagation outcome
#[derive(Debug, Clone)]
pub struct Synced<T> {
    pub value: T,
    pub propagation: Propagation,
}

impl<T> Synced<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Applies mutations to the canonical store and mirrors them into the index.
///
/// The store write decides the outcome. Index failures are logged, counted
/// and reported through [`Propagation`], never returned as errors and never
/// retried here.
pub struct SyncCoordinator {
    pub(super) store: Arc<dyn MovieStore>,
    pub(super) index: Arc<dyn MovieIndex>,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn MovieStore>, index: Arc<dyn MovieIndex>) -> Self {
        Self { store, index }
    }

    /// The canonical store
    pub fn store(&self) -> &Arc<dyn MovieStore> {
        &self.store
    }

    /// The derived search index
    pub fn index(&self) -> &Arc<dyn MovieIndex> {
        &self.index
    }

    /// Create a movie and index the full document
    pub async fn create(&self, draft: MovieDraft) -> Result<Synced<MovieRecord>> {
        let movie = self.store.create_movie(draft).await?;

        tracing::info!(movie_id = movie.id, title = %movie.title, "Created movie");

        let propagation = self.propagate_upsert(&movie).await;
        Ok(Synced {
            value: movie,
            propagation,
        })
    }

    /// Apply a partial update and re-index the full resulting document
    pub async fn update(&self, id: u64, patch: MoviePatch) -> Result<Option<Synced<MovieRecord>>> {
        let Some(movie) = self.store.update_movie(id, patch).await? else {
            return Ok(None);
        };

        tracing::info!(movie_id = movie.id, "Updated movie");

        let propagation = self.propagate_upsert(&movie).await;
        Ok(Some(Synced {
            value: movie,
            propagation,
        }))
    }

    /// Delete a movie and drop its document
    pub async fn remove(&self, id: u64) -> Result<Option<Synced<MovieRecord>>> {
        let Some(movie) = self.store.delete_movie(id).await? else {
            return Ok(None);
        };

        tracing::info!(movie_id = movie.id, "Deleted movie");

        let propagation = match self.index.delete(movie.id).await {
            Ok(()) => Propagation::Applied,
            Err(e) => {
                tracing::warn!(
                    movie_id = movie.id,
                    error = %e,
                    "Failed to remove movie from search index"
                );
                Propagation::Failed(e.to_string())
            }
        };
        record_propagation("delete", &propagation);

        Ok(Some(Synced {
            value: movie,
            propagation,
        }))
    }

    async fn propagate_upsert(&self, movie: &MovieRecord) -> Propagation {
        let propagation = match self.index.upsert(&MovieDocument::from(movie)).await {
            Ok(()) => Propagation::Applied,
            Err(e) => {
                tracing::warn!(
                    movie_id = movie.id,
                    error = %e,
                    "Failed to index movie"
                );
                Propagation::Failed(e.to_string())
            }
        };
        record_propagation("upsert", &propagation);
        propagation
    }
}

fn record_propagation(operation: &str, propagation: &Propagation) {
    let outcome = if propagation.is_applied() { "applied" } else { "failed" };
    INDEX_PROPAGATION_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}
