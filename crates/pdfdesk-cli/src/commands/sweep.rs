//! One-shot retention sweep over uploads, outputs and work directories.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use pdfdesk_core::error::AppError;
use pdfdesk_storage::ArtifactStore;
use pdfdesk_worker::RetentionSweeper;

/// Arguments for the sweep command
#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Override `storage.retention_hours` for this run
    #[arg(long)]
    pub older_than_hours: Option<u64>,
}

#[derive(Debug, Serialize, Tabled)]
struct SweepRow {
    #[tabled(rename = "Retention (h)")]
    retention_hours: u64,
    #[tabled(rename = "Scanned")]
    scanned: usize,
    #[tabled(rename = "Removed")]
    removed: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
}

/// Execute the sweep command
pub async fn execute(
    args: &SweepArgs,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mut config = super::load_config(config_path)?;
    if let Some(hours) = args.older_than_hours {
        config.storage.retention_hours = hours;
    }

    let store = ArtifactStore::open(&config.storage).await?;
    let sweeper = RetentionSweeper::for_store(&store, &config.storage);
    let report = sweeper.sweep().await?;

    let row = SweepRow {
        retention_hours: config.storage.retention_hours,
        scanned: report.scanned,
        removed: report.removed,
        failed: report.failed,
    };
    output::print_list(&[row], format);

    if report.failed > 0 {
        output::print_error(&format!("{} entries could not be removed", report.failed));
    }
    Ok(())
}
