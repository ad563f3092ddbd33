//! Exhaustive page-at-a-time retrieval of SelectLine list collections.
//!
//! The remote API only exposes a page at a time, so both fetchers loop from
//! page 1 until a page comes back shorter than the requested size. The
//! accumulate-everything strategy is deliberate: the orchestrator needs the
//! complete set before reconciliation starts, because the article pass
//! resolves foreign keys against a group map built from the full group set.

use serde_json::Value;

use crate::client::SelectLineClient;
use crate::error::ClientError;

/// Hard cap on pages per collection. Guards against a deployment that
/// ignores the paging parameters and returns the same full page forever.
/// Hitting the cap fails the whole fetch rather than handing back the
/// pages accumulated so far: reconciliation requires the complete set,
/// and a truncated one is indistinguishable from a complete one
/// downstream, so articles in the missing pages would be skipped as
/// orphans instead of mirrored.
pub const MAX_PAGES: usize = 500;

/// Fetches every article-group record the remote system has.
///
/// # Errors
///
/// Propagates any fetch failure, and returns
/// [`ClientError::PaginationLimit`] if [`MAX_PAGES`] is reached.
pub async fn fetch_all_groups(client: &mut SelectLineClient) -> Result<Vec<Value>, ClientError> {
    let page_size = client.page_size() as usize;
    let mut all: Vec<Value> = Vec::new();
    let mut page: u32 = 1;
    let mut pages_fetched = 0usize;

    loop {
        if pages_fetched >= MAX_PAGES {
            return Err(ClientError::PaginationLimit {
                collection: "article groups".to_string(),
                max_pages: MAX_PAGES,
            });
        }

        let batch = client.fetch_groups_page(page).await?;
        pages_fetched += 1;
        let batch_len = batch.len();
        all.extend(batch);

        // A short page (including an empty one) means the collection is
        // exhausted.
        if batch_len < page_size {
            tracing::debug!(pages = page, total = all.len(), "group pagination exhausted");
            return Ok(all);
        }
        page += 1;
    }
}

/// Fetches every article record, optionally restricted to one group.
///
/// # Errors
///
/// Propagates any fetch failure, and returns
/// [`ClientError::PaginationLimit`] if [`MAX_PAGES`] is reached.
pub async fn fetch_all_articles(
    client: &mut SelectLineClient,
    group_filter: Option<&str>,
) -> Result<Vec<Value>, ClientError> {
    let page_size = client.page_size() as usize;
    let mut all: Vec<Value> = Vec::new();
    let mut page: u32 = 1;
    let mut pages_fetched = 0usize;

    loop {
        if pages_fetched >= MAX_PAGES {
            return Err(ClientError::PaginationLimit {
                collection: "articles".to_string(),
                max_pages: MAX_PAGES,
            });
        }

        let batch = client.fetch_articles_page(page, group_filter).await?;
        pages_fetched += 1;
        let batch_len = batch.len();
        all.extend(batch);

        if batch_len < page_size {
            tracing::debug!(
                pages = page,
                total = all.len(),
                "article pagination exhausted"
            );
            return Ok(all);
        }
        page += 1;
    }
}
