//! Output artifact management.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::state::AppState;

/// DELETE /api/outputs/{name}
///
/// Idempotent: deleting a missing output succeeds with `deleted: false`.
pub async fn delete_output(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = state.store.delete_output(&name).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}
