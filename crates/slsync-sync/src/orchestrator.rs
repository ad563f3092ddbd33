//! The two-phase sync run: groups first, then articles.
//!
//! Ordering is load-bearing: the article phase resolves foreign keys
//! against a group map snapshotted once at its start, so the group phase
//! must have finished completely — every page fetched, every record
//! upserted or failed — before that snapshot is taken.

use std::time::Instant;

use serde::Serialize;
use sqlx::PgPool;

use slsync_client::{
    fetch_all_articles, fetch_all_groups, normalize_article, normalize_group, SelectLineClient,
};

use crate::SyncError;

/// Aggregate counters for one sync phase.
///
/// `skipped_missing_group` is only ever non-zero for the article phase;
/// it is part of every report so both trigger endpoints return one shape.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PhaseReport {
    /// Records the pager fetched from the remote system.
    pub read: u64,
    /// Records upserted into the mirror.
    pub upserts: u64,
    /// Records that failed normalization or upsert; logged, not fatal.
    pub failures: u64,
    /// Articles dropped because their group is not in the mirror snapshot.
    pub skipped_missing_group: u64,
    pub elapsed_ms: u64,
}

/// Combined result of a full [`sync_all`] run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncReport {
    pub groups: PhaseReport,
    pub articles: PhaseReport,
}

/// Runs the group phase: fetch every remote group, upsert each one keyed
/// on its external id.
///
/// Per-record normalization or upsert failures are counted and logged
/// with the record's external id; the loop always continues.
///
/// # Errors
///
/// Returns [`SyncError::Client`] only if the bulk fetch itself fails —
/// without the collection there is nothing to reconcile.
pub async fn sync_groups(
    pool: &PgPool,
    client: &mut SelectLineClient,
) -> Result<PhaseReport, SyncError> {
    let started = Instant::now();
    let raw_groups = fetch_all_groups(client).await?;

    let mut report = PhaseReport {
        read: raw_groups.len() as u64,
        ..PhaseReport::default()
    };

    for raw in &raw_groups {
        let Some(group) = normalize_group(raw) else {
            report.failures += 1;
            tracing::warn!(record = %raw, "skipping group — no usable external id");
            continue;
        };

        match slsync_db::upsert_article_group(pool, &group).await {
            Ok(_) => report.upserts += 1,
            Err(e) => {
                report.failures += 1;
                tracing::warn!(external_id = %group.id, error = %e, "group upsert failed");
            }
        }
    }

    report.elapsed_ms = elapsed_ms(started);
    tracing::info!(
        read = report.read,
        upserts = report.upserts,
        failures = report.failures,
        elapsed_ms = report.elapsed_ms,
        "group phase complete"
    );
    Ok(report)
}

/// Runs the article phase: snapshot the group id map, fetch every remote
/// article, resolve its group, upsert.
///
/// An article whose group external id is not in the snapshot is counted
/// as `skipped_missing_group` and never written — the mirror does not
/// hold dangling references. Per-record failures are isolated exactly as
/// in the group phase.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if the map snapshot cannot be loaded, or
/// [`SyncError::Client`] if the bulk fetch fails.
pub async fn sync_articles(
    pool: &PgPool,
    client: &mut SelectLineClient,
) -> Result<PhaseReport, SyncError> {
    let started = Instant::now();

    // Snapshot once, before fetching. A group created concurrently after
    // this point is not visible to this pass.
    let group_map = slsync_db::load_group_id_map(pool).await?;
    let raw_articles = fetch_all_articles(client, None).await?;

    let mut report = PhaseReport {
        read: raw_articles.len() as u64,
        ..PhaseReport::default()
    };

    for raw in &raw_articles {
        let Some(article) = normalize_article(raw) else {
            report.failures += 1;
            tracing::warn!(record = %raw, "skipping article — no usable external id or group");
            continue;
        };

        let Some(&group_id) = group_map.get(&article.group_external_id) else {
            report.skipped_missing_group += 1;
            tracing::warn!(
                external_id = %article.external_id,
                group_external_id = %article.group_external_id,
                "skipping article — group not in mirror"
            );
            continue;
        };

        match slsync_db::upsert_article(pool, group_id, &article).await {
            Ok(_) => report.upserts += 1,
            Err(e) => {
                report.failures += 1;
                tracing::warn!(external_id = %article.external_id, error = %e, "article upsert failed");
            }
        }
    }

    report.elapsed_ms = elapsed_ms(started);
    tracing::info!(
        read = report.read,
        upserts = report.upserts,
        failures = report.failures,
        skipped_missing_group = report.skipped_missing_group,
        elapsed_ms = report.elapsed_ms,
        "article phase complete"
    );
    Ok(report)
}

/// Runs a full sync: groups, then articles.
///
/// The article phase runs even when individual group records failed —
/// partial group data still resolves most articles, and the failed groups
/// simply will not resolve. A *bulk* group-phase failure (login, fetch)
/// aborts the whole run instead: reconciling articles against an empty or
/// stale map would turn every article into a spurious skip.
///
/// # Errors
///
/// Propagates the first bulk-level failure from either phase.
pub async fn sync_all(
    pool: &PgPool,
    client: &mut SelectLineClient,
) -> Result<SyncReport, SyncError> {
    let groups = sync_groups(pool, client).await?;
    let articles = sync_articles(pool, client).await?;
    Ok(SyncReport { groups, articles })
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
