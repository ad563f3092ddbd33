//! Database operations for the `articles` mirror table.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    /// SelectLine article number; the upsert key across sync runs.
    pub external_id: String,
    /// Local foreign key into `article_groups`, resolved from the group's
    /// SelectLine identifier during the article phase — never a raw copy
    /// of the external id.
    pub article_group_id: i64,
    pub sku: String,
    pub ean: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub is_active: bool,
    pub remote_updated_at: Option<DateTime<Utc>>,
    /// Opaque SelectLine extras (pricing, stock, manufacturer data),
    /// stored verbatim and only ever extended by enrichment merges.
    pub attributes: Value,
    /// When the attributes were last extended by an on-demand detail
    /// fetch. `None` until the first enrichment.
    pub attributes_enriched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counts over the `articles` table, used by the anomaly report.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ArticleCounts {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    /// Rows whose attributes have been extended by a detail fetch.
    pub enriched: i64,
}

const ARTICLE_COLUMNS: &str = "id, external_id, article_group_id, sku, ean, title, description, \
     unit_of_measure, is_active, remote_updated_at, attributes, attributes_enriched_at, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Upserts an article row keyed on `external_id`, attaching the resolved
/// local group id.
///
/// The sync-owned columns are replaced on conflict; `attributes` is
/// overwritten with the freshly normalized bag, but the enrichment stamp
/// is preserved so a later read can still judge staleness. Returns the
/// local `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails (including foreign-key
/// or constraint violations for malformed records).
pub async fn upsert_article(
    pool: &PgPool,
    article_group_id: i64,
    article: &slsync_core::RemoteArticle,
) -> Result<i64, DbError> {
    let attributes = Value::Object(article.attributes.clone());

    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO articles \
             (external_id, article_group_id, sku, ean, title, description, \
              unit_of_measure, is_active, remote_updated_at, attributes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10::jsonb) \
         ON CONFLICT (external_id) DO UPDATE SET \
             article_group_id  = EXCLUDED.article_group_id, \
             sku               = EXCLUDED.sku, \
             ean               = EXCLUDED.ean, \
             title             = EXCLUDED.title, \
             description       = EXCLUDED.description, \
             unit_of_measure   = EXCLUDED.unit_of_measure, \
             is_active         = EXCLUDED.is_active, \
             remote_updated_at = EXCLUDED.remote_updated_at, \
             attributes        = EXCLUDED.attributes, \
             updated_at        = NOW() \
         RETURNING id",
    )
    .bind(&article.external_id)
    .bind(article_group_id)
    .bind(&article.sku)
    .bind(&article.ean)
    .bind(&article.title)
    .bind(&article.description)
    .bind(&article.unit_of_measure)
    .bind(article.active)
    .bind(article.updated_at)
    .bind(attributes)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns a single article by its SelectLine identifier, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_article_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<ArticleRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE external_id = $1"
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns articles ordered by title, capped at `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles(pool: &PgPool, limit: i64) -> Result<Vec<ArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY title LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Merges fetched detail data into an article's attributes bag.
///
/// The merge is additive (`attributes || $2`): keys from the detail fetch
/// overwrite same-named keys, everything else in the stored bag survives.
/// Stamps `attributes_enriched_at` and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the article id does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn merge_article_attributes(
    pool: &PgPool,
    article_id: i64,
    detail: &Value,
) -> Result<ArticleRow, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(&format!(
        "UPDATE articles \
         SET attributes             = attributes || $2::jsonb, \
             attributes_enriched_at = NOW(), \
             updated_at             = NOW() \
         WHERE id = $1 \
         RETURNING {ARTICLE_COLUMNS}"
    ))
    .bind(article_id)
    .bind(detail)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns total/active/inactive article counts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_articles(pool: &PgPool) -> Result<ArticleCounts, DbError> {
    let counts = sqlx::query_as::<_, ArticleCounts>(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE is_active) AS active, \
                COUNT(*) FILTER (WHERE NOT is_active) AS inactive, \
                COUNT(*) FILTER (WHERE attributes_enriched_at IS NOT NULL) AS enriched \
         FROM articles",
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

/// Counts active articles whose group has been deactivated — the mirror's
/// notion of an orphan, since rows are never deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_orphaned_articles(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) \
         FROM articles a \
         JOIN article_groups g ON g.id = a.article_group_id \
         WHERE a.is_active AND NOT g.is_active",
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Counts article external ids that appear more than once; structurally
/// zero under the unique index, checked by the anomaly report regardless.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_duplicate_article_external_ids(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM ( \
             SELECT external_id FROM articles \
             GROUP BY external_id HAVING COUNT(*) > 1 \
         ) dups",
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
