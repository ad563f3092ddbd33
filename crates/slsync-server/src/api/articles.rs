use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use slsync_client::SelectLineClient;
use slsync_db::ArticleRow;
use slsync_sync::EnrichOutcome;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ArticleDetail {
    external_id: String,
    group_external_id: Option<String>,
    sku: String,
    ean: Option<String>,
    title: String,
    description: Option<String>,
    unit_of_measure: Option<String>,
    is_active: bool,
    attributes: serde_json::Value,
    attributes_enriched_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

/// Serves one article from the mirror, enriching its attributes on demand
/// when they are stale.
///
/// Enrichment is strictly best-effort: any remote failure is logged and
/// the stored row is served unchanged. A missing article is the only 404.
pub(super) async fn get_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(external_id): Path<String>,
) -> Result<Json<ApiResponse<ArticleDetail>>, ApiError> {
    let Some(row) = slsync_db::get_article_by_external_id(&state.pool, &external_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    else {
        return Err(ApiError::new(req_id.0, "not_found", "no such article"));
    };

    let row = enrich_best_effort(&state, row).await;

    let group_external_id = slsync_db::get_group_external_id(&state.pool, row.article_group_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ArticleDetail {
            external_id: row.external_id,
            group_external_id,
            sku: row.sku,
            ean: row.ean,
            title: row.title,
            description: row.description,
            unit_of_measure: row.unit_of_measure,
            is_active: row.is_active,
            attributes: row.attributes,
            attributes_enriched_at: row.attributes_enriched_at,
            updated_at: row.updated_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn enrich_best_effort(state: &AppState, row: ArticleRow) -> ArticleRow {
    let mut client = match SelectLineClient::new(state.config.selectline.clone()) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "could not build SelectLine client for enrichment");
            return row;
        }
    };

    let (row, outcome) = slsync_sync::ensure_article_enriched(
        &state.pool,
        &mut client,
        row,
        state.config.enrich_max_age_days,
    )
    .await;

    if outcome == EnrichOutcome::Enriched {
        tracing::debug!(external_id = %row.external_id, "served freshly enriched article");
    }
    row
}
