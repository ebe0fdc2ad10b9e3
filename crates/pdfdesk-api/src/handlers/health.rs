//! Health check handler.

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
