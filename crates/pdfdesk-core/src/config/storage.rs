//! Artifact store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Directories and limits for uploaded inputs and produced outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all runtime data.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Per-file upload limit in megabytes.
    #[serde(default = "default_max_upload")]
    pub max_upload_size_mb: u64,
    /// Age in hours after which artifacts are swept.
    #[serde(default = "default_retention")]
    pub retention_hours: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            max_upload_size_mb: default_max_upload(),
            retention_hours: default_retention(),
        }
    }
}

impl StorageConfig {
    /// Directory holding transient input artifacts.
    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_root).join("uploads")
    }

    /// Directory holding output artifacts served under `/outputs`.
    pub fn outputs_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_root).join("outputs")
    }

    /// Scratch directory for external converters.
    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_root).join("work")
    }

    /// Per-file upload limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_max_upload() -> u64 {
    100
}

fn default_retention() -> u64 {
    2
}
