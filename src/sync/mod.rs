//! Keeps the search index in step with the canonical store
//!
//! Every committed mutation is pushed to the index as a full-document upsert
//! or a delete. Pushes are best-effort: a failed push leaves the index stale
//! but never fails the mutation. [`SyncCoordinator::backfill`] is the repair
//! path and rebuilds the index deterministically from the store.

mod backfill;
mod coordinator;

pub use backfill::BackfillReport;
pub use coordinator::{Propagation, SyncCoordinator, Synced};
