//! PDFDesk server: self-hosted PDF toolkit.
//!
//! Loads configuration, initializes logging and runs the HTTP server.

use tracing_subscriber::{EnvFilter, fmt};

use pdfdesk_core::config::AppConfig;
use pdfdesk_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    tracing::info!("Starting PDFDesk v{}", env!("CARGO_PKG_VERSION"));
    if let Err(e) = pdfdesk_api::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path = std::env::var("PDFDESK_CONFIG").ok();
    AppConfig::load(config_path.as_deref())
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
