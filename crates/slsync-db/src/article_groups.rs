//! Database operations for the `article_groups` mirror table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `article_groups` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleGroupRow {
    pub id: i64,
    /// SelectLine group number; the upsert key across sync runs.
    pub external_id: String,
    pub name: String,
    pub description: Option<String>,
    /// SelectLine identifier of the parent group, stored verbatim rather
    /// than resolved to a local id.
    pub parent_external_id: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: bool,
    pub remote_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counts over the `article_groups` table, used by the anomaly
/// report.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct GroupCounts {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Upserts a group row keyed on `external_id`.
///
/// A conflict updates every mutable column in place; the local `id` and
/// `created_at` never change once the row exists. Returns the local `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_article_group(
    pool: &PgPool,
    group: &slsync_core::RemoteGroup,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO article_groups \
             (external_id, name, description, parent_external_id, sort_order, \
              is_active, remote_updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (external_id) DO UPDATE SET \
             name               = EXCLUDED.name, \
             description        = EXCLUDED.description, \
             parent_external_id = EXCLUDED.parent_external_id, \
             sort_order         = EXCLUDED.sort_order, \
             is_active          = EXCLUDED.is_active, \
             remote_updated_at  = EXCLUDED.remote_updated_at, \
             updated_at         = NOW() \
         RETURNING id",
    )
    .bind(&group.id)
    .bind(&group.name)
    .bind(&group.description)
    .bind(&group.parent_id)
    .bind(group.sort_order)
    .bind(group.is_active)
    .bind(group.updated_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Loads the complete externalId → local id map in one query.
///
/// The article phase calls this exactly once at phase start; the returned
/// map is a snapshot, not a live lookup.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_group_id_map(pool: &PgPool) -> Result<HashMap<String, i64>, DbError> {
    let rows = sqlx::query_as::<_, (String, i64)>("SELECT external_id, id FROM article_groups")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().collect())
}

/// Returns a single group by its SelectLine identifier, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_group_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<ArticleGroupRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleGroupRow>(
        "SELECT id, external_id, name, description, parent_external_id, sort_order, \
                is_active, remote_updated_at, created_at, updated_at \
         FROM article_groups \
         WHERE external_id = $1",
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Resolves a local group id back to its SelectLine identifier.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_group_external_id(pool: &PgPool, id: i64) -> Result<Option<String>, DbError> {
    let external_id =
        sqlx::query_scalar::<_, String>("SELECT external_id FROM article_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(external_id)
}

/// Returns all groups ordered by sort rank, then name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_groups(pool: &PgPool) -> Result<Vec<ArticleGroupRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleGroupRow>(
        "SELECT id, external_id, name, description, parent_external_id, sort_order, \
                is_active, remote_updated_at, created_at, updated_at \
         FROM article_groups \
         ORDER BY sort_order NULLS LAST, name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns total/active/inactive group counts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_groups(pool: &PgPool) -> Result<GroupCounts, DbError> {
    let counts = sqlx::query_as::<_, GroupCounts>(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE is_active) AS active, \
                COUNT(*) FILTER (WHERE NOT is_active) AS inactive \
         FROM article_groups",
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

/// Counts external ids that appear more than once. The unique index makes
/// this structurally zero; the anomaly report checks it anyway so schema
/// drift is caught loudly.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_duplicate_group_external_ids(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM ( \
             SELECT external_id FROM article_groups \
             GROUP BY external_id HAVING COUNT(*) > 1 \
         ) dups",
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
