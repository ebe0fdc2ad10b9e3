//! External converter availability.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /api/tools
pub async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    let tools = state.converter.tools().await;
    Json(json!({ "success": true, "tools": tools }))
}
