//! Full-text movie search powered by Tantivy
//!
//! The index is a derived projection of the record store, keyed by movie id.
//! It is never the source of truth and can be rebuilt at any time with a
//! backfill.
//!
//! - **Weighted matching**: title ×3, cast ×2, description ×1.5
//! - **English analysis**: lowercasing and stopword removal at index and query time
//! - **Read-your-write**: every mutation commits and reloads the reader before returning
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ SearchService (MovieIndex)   │  query / upsert / delete
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │ IndexManager                 │  writer lock, commit + reload
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │ Tantivy index                │  english_stop analyzer
//! └──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use movie_catalog::search::{MovieIndex, SearchConfig, SearchRequest, SearchService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let search = SearchService::new(SearchConfig::default()).await?;
//!     search.ensure_index().await?;
//!
//!     let page = search.query(&SearchRequest::new("nolan heist")).await?;
//!     println!("Found {} movies", page.total);
//!
//!     Ok(())
//! }
//! ```

mod config;
mod document;
mod error;
mod index;
mod query;
mod service;
mod traits;

pub use config::SearchConfig;
pub use document::{build_movie_schema, MovieDocument, MovieFields, MOVIE_ANALYZER};
pub use error::{SearchError, SearchResult};
pub use index::{BatchOutcome, IndexManager, IndexStats};
pub use query::{QueryBuilder, SearchRequest, CAST_BOOST, DESCRIPTION_BOOST, TITLE_BOOST};
pub use service::{SearchHit, SearchPage, SearchService};
pub use traits::MovieIndex;
