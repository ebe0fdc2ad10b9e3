//! # pdfdesk-api
//!
//! HTTP API layer for PDFDesk built on Axum.
//!
//! Provides the operation endpoints, the upload gate, static downloads,
//! middleware (rate limiting, CORS, security headers, logging, panic
//! recovery) and the error mapping from `AppError` to JSON bodies.

pub mod app;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod state;
pub mod upload;

pub use app::{build_app, run_server};
pub use state::AppState;
