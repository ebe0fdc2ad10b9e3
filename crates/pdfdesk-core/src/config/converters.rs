//! External converter configuration.

use serde::{Deserialize, Serialize};

/// Binaries probed for each external converter, plus their timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertersConfig {
    /// LibreOffice (office documents).
    #[serde(default = "default_libreoffice")]
    pub libreoffice: ToolConfig,
    /// Ghostscript (PDF rasterization).
    #[serde(default = "default_ghostscript")]
    pub ghostscript: ToolConfig,
    /// Headless Chromium (HTML rendering).
    #[serde(default = "default_chromium")]
    pub chromium: ToolConfig,
    /// OCRmyPDF (text layer recognition).
    #[serde(default = "default_ocrmypdf")]
    pub ocrmypdf: ToolConfig,
}

impl Default for ConvertersConfig {
    fn default() -> Self {
        Self {
            libreoffice: default_libreoffice(),
            ghostscript: default_ghostscript(),
            chromium: default_chromium(),
            ocrmypdf: default_ocrmypdf(),
        }
    }
}

/// One external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Set to `false` to never use the tool even when installed.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Candidate executable names or paths, tried in order.
    pub binaries: Vec<String>,
    /// Wall-clock limit for one invocation.
    pub timeout_seconds: u64,
}

impl ToolConfig {
    fn new(binaries: &[&str], timeout_seconds: u64) -> Self {
        Self {
            enabled: true,
            binaries: binaries.iter().map(|b| b.to_string()).collect(),
            timeout_seconds,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_libreoffice() -> ToolConfig {
    ToolConfig::new(&["libreoffice", "soffice"], 60)
}

fn default_ghostscript() -> ToolConfig {
    if cfg!(target_os = "windows") {
        ToolConfig::new(&["gswin64c", "gswin32c", "gs"], 120)
    } else {
        ToolConfig::new(&["gs"], 120)
    }
}

fn default_chromium() -> ToolConfig {
    ToolConfig::new(
        &[
            "chromium",
            "chromium-browser",
            "google-chrome",
            "google-chrome-stable",
        ],
        60,
    )
}

fn default_ocrmypdf() -> ToolConfig {
    ToolConfig::new(&["ocrmypdf"], 120)
}
