use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct GroupItem {
    external_id: String,
    name: String,
    description: Option<String>,
    parent_external_id: Option<String>,
    sort_order: Option<i32>,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

pub(super) async fn list_groups(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<GroupItem>>>, ApiError> {
    let rows = slsync_db::list_groups(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| GroupItem {
            external_id: row.external_id,
            name: row.name,
            description: row.description,
            parent_external_id: row.parent_external_id,
            sort_order: row.sort_order,
            is_active: row.is_active,
            updated_at: row.updated_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
