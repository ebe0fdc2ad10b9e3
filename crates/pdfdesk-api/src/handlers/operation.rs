//! Operation endpoint: upload, transform, respond.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Request, State};
use serde_json::Value;

use pdfdesk_core::error::AppError;
use pdfdesk_core::operation::Operation;
use pdfdesk_service::{Job, OperationOptions};

use crate::error::ApiResult;
use crate::extractors::RequestOrigin;
use crate::state::AppState;
use crate::upload::UploadGate;

/// POST /api/{operation}
///
/// Stores the uploads, parses the options, runs the job and answers with a
/// download URL. Inputs are deleted before the response is sent. The job
/// keeps running if the client goes away.
pub async fn run_operation(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    origin: RequestOrigin,
    request: Request,
) -> ApiResult<Json<Value>> {
    let operation: Operation = slug.parse()?;
    let descriptor = state.catalog.get(operation);

    let upload = UploadGate::new(&state.store, descriptor)
        .receive(request)
        .await?;
    let options = OperationOptions::parse(operation, &upload.fields)?;

    tracing::debug!(
        operation = %operation,
        files = upload.inputs.len(),
        "Accepted upload"
    );

    // The job owns its task so a client disconnect does not cancel it; an
    // orphaned output is left for the sweeper.
    let job = Job::new(operation, upload.inputs, options);
    let invoker = Arc::clone(&state.invoker);
    let outcome = tokio::spawn(async move { invoker.run(job).await })
        .await
        .map_err(|e| AppError::internal(format!("Job task failed: {e}")))??;

    Ok(Json(state.responses.success(&origin, &outcome)))
}
