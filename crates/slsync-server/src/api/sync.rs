//! Admin endpoints that trigger a sync run and return its report.
//!
//! Runs execute inline in the request: the caller is an operator or a
//! deployment hook that wants the counters, not a fire-and-forget job.

use axum::{extract::State, Extension, Json};

use slsync_client::SelectLineClient;
use slsync_sync::{PhaseReport, SyncError, SyncReport};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

pub(super) async fn trigger_sync_groups(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PhaseReport>>, ApiError> {
    let mut client = build_client(&state, &req_id.0)?;
    let report = slsync_sync::sync_groups(&state.pool, &mut client)
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn trigger_sync_articles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PhaseReport>>, ApiError> {
    let mut client = build_client(&state, &req_id.0)?;
    let report = slsync_sync::sync_articles(&state.pool, &mut client)
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn trigger_sync_all(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SyncReport>>, ApiError> {
    let mut client = build_client(&state, &req_id.0)?;
    let report = slsync_sync::sync_all(&state.pool, &mut client)
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn build_client(state: &AppState, request_id: &str) -> Result<SelectLineClient, ApiError> {
    SelectLineClient::new(state.config.selectline.clone()).map_err(|e| {
        tracing::error!(error = %e, "could not build SelectLine client");
        ApiError::new(
            request_id.to_owned(),
            "internal_error",
            "SelectLine client configuration is invalid",
        )
    })
}

fn map_sync_error(request_id: String, error: &SyncError) -> ApiError {
    tracing::error!(error = %error, "sync run aborted");
    match error {
        SyncError::Client(_) => ApiError::new(
            request_id,
            "upstream_unavailable",
            "SelectLine fetch failed; the run was aborted",
        ),
        SyncError::Db(_) => ApiError::new(request_id, "internal_error", "database error during sync"),
    }
}
