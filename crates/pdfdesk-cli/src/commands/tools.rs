//! External converter availability.

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use pdfdesk_convert::{Converter, ToolStatus};
use pdfdesk_core::error::AppError;

#[derive(Debug, Serialize, Tabled)]
struct ToolRow {
    #[tabled(rename = "Tool")]
    name: String,
    #[tabled(rename = "Enabled")]
    enabled: bool,
    #[tabled(rename = "Available")]
    available: bool,
    #[tabled(rename = "Binary")]
    binary: String,
    #[tabled(rename = "Timeout (s)")]
    timeout_seconds: u64,
}

impl From<ToolStatus> for ToolRow {
    fn from(status: ToolStatus) -> Self {
        Self {
            name: status.name,
            enabled: status.enabled,
            available: status.available,
            binary: status.binary.unwrap_or_else(|| "-".to_string()),
            timeout_seconds: status.timeout_seconds,
        }
    }
}

/// Execute the tools command
pub async fn execute(config_path: Option<&str>, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let converter = Converter::from_config(&config.converters);

    let rows: Vec<ToolRow> = converter
        .tools()
        .await
        .into_iter()
        .map(ToolRow::from)
        .collect();
    output::print_list(&rows, format);
    Ok(())
}
