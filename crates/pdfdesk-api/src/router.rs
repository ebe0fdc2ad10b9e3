//! Route definitions for the PDFDesk HTTP API.
//!
//! Operations and output management are mounted under `/api` behind the
//! rate limiter; `/outputs` serves finished artifacts as static files.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with all routes and the state threaded through.
pub fn build_router(state: AppState) -> Router {
    let max_body = usize::try_from(state.catalog.max_request_bytes()).unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .merge(tool_routes())
        .merge(output_routes())
        .merge(operation_routes())
        .layer(axum_middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            middleware::rate_limit::rate_limit,
        ));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(handlers::health::health))
        .nest_service("/outputs", ServeDir::new(state.store.outputs_dir()))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}

/// `POST /api/{operation}` for every operation slug
fn operation_routes() -> Router<AppState> {
    Router::new().route("/{operation}", post(handlers::operation::run_operation))
}

/// Explicit output deletion
fn output_routes() -> Router<AppState> {
    Router::new().route("/outputs/{name}", delete(handlers::output::delete_output))
}

/// Converter availability
fn tool_routes() -> Router<AppState> {
    Router::new().route("/tools", get(handlers::tools::list_tools))
}
