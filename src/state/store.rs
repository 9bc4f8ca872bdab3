use crate::error::Result;
use crate::models::{MovieDraft, MoviePatch, MovieRecord, PageRequest};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for canonical movie storage operations
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Create a movie, assigning its identifier and timestamps
    async fn create_movie(&self, draft: MovieDraft) -> Result<MovieRecord>;

    /// Get a movie by ID
    async fn get_movie(&self, id: u64) -> Result<Option<MovieRecord>>;

    /// Apply a partial update; `None` when the movie does not exist
    async fn update_movie(&self, id: u64, patch: MoviePatch) -> Result<Option<MovieRecord>>;

    /// Delete a movie, returning the removed row
    async fn delete_movie(&self, id: u64) -> Result<Option<MovieRecord>>;

    /// List movies matching the filter, newest first
    async fn list_movies(&self, filter: &MovieFilter, page: PageRequest) -> Result<Vec<MovieRecord>>;

    /// Up to `limit` movies with an identifier greater than `after`, in identifier order
    async fn list_after(&self, after: Option<u64>, limit: usize) -> Result<Vec<MovieRecord>>;

    /// Count movies matching the filter
    async fn count_movies(&self, filter: &MovieFilter) -> Result<u64>;
}

/// Half-open release date window `[from, until)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseWindow {
    pub from: NaiveDate,
    pub until: NaiveDate,
}

impl ReleaseWindow {
    /// The calendar year `[year-01-01, (year+1)-01-01)`, if representable
    pub fn year(year: i32) -> Option<Self> {
        let from = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let until = NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?;
        Some(Self { from, until })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date < self.until
    }
}

/// Filter for browsing movies. Every field is optional; `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    pub is_hit: Option<bool>,
    pub released: Option<ReleaseWindow>,
    /// Inclusive lower budget bound
    pub min_budget: Option<u64>,
    /// Inclusive upper budget bound
    pub max_budget: Option<u64>,
}

impl MovieFilter {
    /// Restrict to movies released in the given year
    pub fn with_year(mut self, year: i32) -> Self {
        self.released = ReleaseWindow::year(year);
        self
    }

    pub fn with_hit(mut self, is_hit: bool) -> Self {
        self.is_hit = Some(is_hit);
        self
    }

    pub fn with_budget_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_budget = min;
        self.max_budget = max;
        self
    }

    /// Evaluate the filter against a record. A null column never satisfies a constraint on it.
    pub fn matches(&self, movie: &MovieRecord) -> bool {
        let hit_match = self.is_hit.map_or(true, |hit| movie.is_hit == hit);

        let release_match = match self.released {
            None => true,
            Some(window) => movie.release_date.is_some_and(|d| window.contains(d)),
        };

        let min_match = match self.min_budget {
            None => true,
            Some(min) => movie.budget.is_some_and(|b| b >= min),
        };

        let max_match = match self.max_budget {
            None => true,
            Some(max) => movie.budget.is_some_and(|b| b <= max),
        };

        hit_match && release_match && min_match && max_match
    }

    /// True when no constraint is set
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }
}

/// Apply filter, newest-first ordering and pagination to a full scan.
pub(crate) fn select_page(
    movies: impl Iterator<Item = MovieRecord>,
    filter: &MovieFilter,
    page: PageRequest,
) -> Vec<MovieRecord> {
    let mut movies: Vec<MovieRecord> = movies.filter(|m| filter.matches(m)).collect();

    // Newest first; identifiers break ties between rows created in the same instant
    movies.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    movies
        .into_iter()
        .skip(page.skip())
        .take(page.take())
        .collect()
}

/// In-memory movie store (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    movies: Arc<DashMap<u64, MovieRecord>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            movies: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MovieStore for InMemoryStore {
    async fn create_movie(&self, draft: MovieDraft) -> Result<MovieRecord> {
        // The counter only moves forward, so deleted identifiers are never handed out again
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let movie = MovieRecord::from_draft(id, draft, Utc::now());
        self.movies.insert(id, movie.clone());

        tracing::debug!(movie_id = id, "Movie created");
        Ok(movie)
    }

    async fn get_movie(&self, id: u64) -> Result<Option<MovieRecord>> {
        Ok(self.movies.get(&id).map(|entry| entry.clone()))
    }

    async fn update_movie(&self, id: u64, patch: MoviePatch) -> Result<Option<MovieRecord>> {
        match self.movies.get_mut(&id) {
            Some(mut entry) => {
                entry.apply(patch, Utc::now());
                tracing::debug!(movie_id = id, "Movie updated");
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_movie(&self, id: u64) -> Result<Option<MovieRecord>> {
        let removed = self.movies.remove(&id).map(|(_, movie)| movie);
        if removed.is_some() {
            tracing::debug!(movie_id = id, "Movie deleted");
        }
        Ok(removed)
    }

    async fn list_movies(&self, filter: &MovieFilter, page: PageRequest) -> Result<Vec<MovieRecord>> {
        Ok(select_page(
            self.movies.iter().map(|entry| entry.value().clone()),
            filter,
            page,
        ))
    }

    async fn list_after(&self, after: Option<u64>, limit: usize) -> Result<Vec<MovieRecord>> {
        let mut movies: Vec<MovieRecord> = self
            .movies
            .iter()
            .filter(|entry| after.map_or(true, |after| *entry.key() > after))
            .map(|entry| entry.value().clone())
            .collect();

        movies.sort_by_key(|m| m.id);
        movies.truncate(limit);
        Ok(movies)
    }

    async fn count_movies(&self, filter: &MovieFilter) -> Result<u64> {
        let count = self
            .movies
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count();

        Ok(count as u64)
    }
}
