//! Movie catalog service
//!
//! A canonical record store (sled or in-memory) holds every movie. A Tantivy
//! full-text index is kept in step with it on a best-effort basis by the
//! [`sync::SyncCoordinator`] and can be rebuilt from the store at any time.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod planner;
pub mod search;
pub mod state;
pub mod sync;
pub mod telemetry;

pub use error::{AppError, Result};
