//! Full rebuild of the search index from the canonical store

use super::coordinator::SyncCoordinator;
use crate::error::Result;
use crate::metrics::BACKFILL_DOCUMENTS_TOTAL;
use crate::search::MovieDocument;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

/// Counters from one backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    /// Documents written to the index
    pub indexed: usize,

    /// Records that could not be indexed
    pub failed: usize,

    /// Orphaned documents removed because their record no longer exists
    pub purged: usize,

    /// Store batches processed
    pub batches: usize,

    /// Wall-clock duration of the run
    pub duration_ms: u64,
}

impl BackfillReport {
    /// True when every record made it into the index
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

impl SyncCoordinator {
    /// Re-project every stored movie into the index, then purge orphans.
    ///
    /// Records are read in identifier order, `batch_size` at a time, and each
    /// batch is written with a single commit. Per-record and per-batch
    /// failures are counted and skipped. Safe to interrupt and re-run.
    pub async fn backfill(&self, batch_size: usize) -> Result<BackfillReport> {
        let start = Instant::now();
        let batch_size = batch_size.max(1);

        self.index.ensure_index().await?;

        let mut report = BackfillReport::default();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut cursor = None;

        loop {
            let batch = self.store.list_after(cursor, batch_size).await?;
            let Some(last) = batch.last() else {
                break;
            };
            cursor = Some(last.id);
            report.batches += 1;

            let documents: Vec<MovieDocument> = batch.iter().map(MovieDocument::from).collect();
            seen.extend(documents.iter().map(|d| d.id));

            match self.index.upsert_batch(&documents).await {
                Ok(outcome) => report.indexed += outcome.indexed.len(),
                Err(e) => {
                    tracing::warn!(
                        batch = report.batches,
                        first_id = documents.first().map(|d| d.id),
                        last_id = documents.last().map(|d| d.id),
                        error = %e,
                        "Backfill batch failed to commit"
                    );
                    report.failed += documents.len();
                }
            }

            tracing::debug!(
                batch = report.batches,
                indexed = report.indexed,
                failed = report.failed,
                "Backfill batch processed"
            );

            if batch.len() < batch_size {
                break;
            }
        }

        report.purged = self.purge_orphans(&seen).await?;
        report.duration_ms = start.elapsed().as_millis() as u64;

        BACKFILL_DOCUMENTS_TOTAL
            .with_label_values(&["indexed"])
            .inc_by(report.indexed as u64);
        BACKFILL_DOCUMENTS_TOTAL
            .with_label_values(&["failed"])
            .inc_by(report.failed as u64);
        BACKFILL_DOCUMENTS_TOTAL
            .with_label_values(&["purged"])
            .inc_by(report.purged as u64);

        if report.is_complete() {
            tracing::info!(
                indexed = report.indexed,
                purged = report.purged,
                batches = report.batches,
                duration_ms = report.duration_ms,
                "Backfill complete"
            );
        } else {
            tracing::warn!(
                indexed = report.indexed,
                failed = report.failed,
                purged = report.purged,
                batches = report.batches,
                duration_ms = report.duration_ms,
                "Backfill finished with failures"
            );
        }

        Ok(report)
    }

    /// Delete documents whose identifier was not scanned and is absent from the store.
    ///
    /// The second check keeps documents for movies created while the scan ran.
    async fn purge_orphans(&self, seen: &HashSet<u64>) -> Result<usize> {
        let mut orphans = Vec::new();

        for id in self.index.document_ids().await? {
            if seen.contains(&id) {
                continue;
            }
            if self.store.get_movie(id).await?.is_none() {
                orphans.push(id);
            }
        }

        if orphans.is_empty() {
            return Ok(0);
        }

        tracing::info!(count = orphans.len(), "Purging orphaned search documents");
        Ok(self.index.delete_batch(&orphans).await?)
    }
}
