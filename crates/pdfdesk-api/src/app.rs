//! Application builder: wires router, middleware and state into an Axum app.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use pdfdesk_core::config::AppConfig;
use pdfdesk_core::error::{AppError, ErrorKind};
use pdfdesk_core::result::AppResult;
use pdfdesk_worker::{CronScheduler, RetentionSweeper};

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::middleware::panic::build_panic_layer;
use crate::middleware::security::security_header_layers;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    let [nosniff, frame_options, resource_policy] = security_header_layers();

    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(nosniff)
        .layer(frame_options)
        .layer(resource_policy)
        .layer(build_panic_layer())
}

/// Runs the PDFDesk server until Ctrl-C or SIGTERM.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting PDFDesk server...");

    // ── Step 1: Shared state (creates the data directories) ──────
    let state = AppState::new(config.clone()).await?;
    tracing::info!(
        data_root = %config.storage.data_root,
        max_upload_mb = config.storage.max_upload_size_mb,
        "Artifact store ready"
    );

    for tool in state.converter.tools().await {
        if tool.available {
            tracing::info!(tool = %tool.name, binary = ?tool.binary, "Converter available");
        } else {
            tracing::warn!(tool = %tool.name, enabled = tool.enabled, "Converter unavailable");
        }
    }

    // ── Step 2: Retention sweeper ────────────────────────────────
    let sweeper = Arc::new(RetentionSweeper::for_store(&state.store, &config.storage));
    let scheduler = CronScheduler::new(Arc::clone(&sweeper)).await?;
    scheduler.register(&config.sweeper).await?;
    scheduler.start().await?;

    // ── Step 3: HTTP server ──────────────────────────────────────
    let app = build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Configuration, format!("Failed to bind {addr}"), e)
    })?;
    tracing::info!("Listening on http://{}", addr);

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    })
    .into_future();

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        _ = async {
            let _ = shutdown_rx.wait_for(|stopping| *stopping).await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Grace period elapsed, dropping in-flight requests");
        }
    }

    scheduler.shutdown().await?;
    tracing::info!("PDFDesk server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
