//! Start the PDFDesk server.

use clap::Args;
use tracing_subscriber::{EnvFilter, fmt};

use pdfdesk_core::config::LoggingConfig;
use pdfdesk_core::error::AppError;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the data root (uploads, outputs, work)
    #[arg(long)]
    pub data_root: Option<String>,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, config_path: Option<&str>) -> Result<(), AppError> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref data_root) = args.data_root {
        config.storage.data_root = data_root.clone();
    }

    init_logging(&config.logging);

    println!("Starting PDFDesk server...");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    println!("  Data: {}", config.storage.data_root);

    pdfdesk_api::run_server(config).await
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => fmt().json().with_env_filter(filter).with_target(true).init(),
        _ => fmt().with_env_filter(filter).with_target(true).init(),
    }
}
