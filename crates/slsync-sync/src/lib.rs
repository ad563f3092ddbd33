//! Synchronization orchestrator: drives full group/article mirror runs
//! against the SelectLine API and the on-demand enrichment path.

mod enrich;
mod orchestrator;

use thiserror::Error;

pub use enrich::{ensure_article_enriched, EnrichOutcome};
pub use orchestrator::{sync_all, sync_articles, sync_groups, PhaseReport, SyncReport};

/// Bulk-level failures that abort a sync phase.
///
/// Individual record failures never surface here; they are contained
/// inside the phase loop and reported through [`PhaseReport`] counters.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching or authenticating against the remote system failed, so
    /// there is no collection to reconcile.
    #[error(transparent)]
    Client(#[from] slsync_client::ClientError),

    /// A bulk database step failed (loading the group map), as opposed to
    /// a single record's upsert.
    #[error(transparent)]
    Db(#[from] slsync_db::DbError),
}
