//! On-demand article enrichment.
//!
//! A single-article read may trigger a just-in-time detail fetch against
//! SelectLine when the stored attributes were never enriched or have gone
//! stale. The fetched detail is merged additively into the existing
//! attributes bag; it never replaces it. Enrichment failure is non-fatal:
//! the caller gets the non-enriched row back.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use slsync_client::SelectLineClient;
use slsync_db::ArticleRow;

/// What [`ensure_article_enriched`] did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// The stored attributes are within the freshness window.
    Fresh,
    /// A detail fetch succeeded and was merged.
    Enriched,
    /// The remote fetch or merge failed; the stale row was returned as-is.
    Failed,
    /// The remote system does not know the article's SKU.
    UnknownSku,
}

/// Returns the article with its attributes freshened if needed.
///
/// The row is returned unchanged when `attributes_enriched_at` is within
/// `max_age_days`. Otherwise the detail record is fetched by SKU and
/// merged into the stored bag. Every failure path degrades to returning
/// the row that was passed in.
pub async fn ensure_article_enriched(
    pool: &PgPool,
    client: &mut SelectLineClient,
    article: ArticleRow,
    max_age_days: i64,
) -> (ArticleRow, EnrichOutcome) {
    let stale_before = Utc::now() - Duration::days(max_age_days);
    if let Some(enriched_at) = article.attributes_enriched_at {
        if enriched_at > stale_before {
            return (article, EnrichOutcome::Fresh);
        }
    }

    let detail = match client.fetch_article_detail(&article.sku).await {
        Ok(Some(detail)) => detail,
        Ok(None) => {
            tracing::warn!(
                external_id = %article.external_id,
                sku = %article.sku,
                "enrichment skipped — SKU unknown to remote system"
            );
            return (article, EnrichOutcome::UnknownSku);
        }
        Err(e) => {
            tracing::warn!(
                external_id = %article.external_id,
                error = %e,
                "enrichment fetch failed, serving stored attributes"
            );
            return (article, EnrichOutcome::Failed);
        }
    };

    match slsync_db::merge_article_attributes(pool, article.id, &detail).await {
        Ok(updated) => {
            tracing::debug!(external_id = %updated.external_id, "article attributes enriched");
            (updated, EnrichOutcome::Enriched)
        }
        Err(e) => {
            tracing::warn!(
                external_id = %article.external_id,
                error = %e,
                "enrichment merge failed, serving stored attributes"
            );
            (article, EnrichOutcome::Failed)
        }
    }
}
