//! External tools: locating configured binaries and running them.

use std::path::{Path, PathBuf};

use serde::Serialize;

use pdfdesk_core::config::ToolConfig;

use crate::error::ConversionError;
use crate::executor::{ExecutionParams, ExecutionResult, ProcessExecutor};

/// A configured external program with candidate binaries.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    name: &'static str,
    config: ToolConfig,
    executor: ProcessExecutor,
}

/// Availability of one tool, as reported by `GET /api/tools`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStatus {
    /// Tool name.
    pub name: String,
    /// Whether the tool is enabled in configuration.
    pub enabled: bool,
    /// Whether a binary was found.
    pub available: bool,
    /// The binary that would run.
    pub binary: Option<String>,
    /// Wall-clock limit per invocation.
    pub timeout_seconds: u64,
}

impl ExternalTool {
    /// Create a tool from its configuration.
    pub fn new(name: &'static str, config: ToolConfig) -> Self {
        Self {
            name,
            config,
            executor: ProcessExecutor::new(),
        }
    }

    /// Tool name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Timeout for one invocation.
    pub fn timeout_seconds(&self) -> u64 {
        self.config.timeout_seconds
    }

    /// First configured binary that resolves, or `None` when the tool is
    /// disabled or absent. Probed on every call so that installing a tool
    /// takes effect without a restart.
    pub async fn locate(&self) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        for binary in &self.config.binaries {
            if self.executor.check_command_available(binary).await {
                return Some(binary.clone());
            }
        }
        None
    }

    /// Current status.
    pub async fn status(&self) -> ToolStatus {
        let binary = self.locate().await;
        ToolStatus {
            name: self.name.to_string(),
            enabled: self.config.enabled,
            available: binary.is_some(),
            binary,
            timeout_seconds: self.config.timeout_seconds,
        }
    }

    /// Run `binary` with `args` inside `work_dir` under the tool's timeout.
    pub async fn run(
        &self,
        binary: &str,
        args: Vec<String>,
        work_dir: &Path,
    ) -> Result<ExecutionResult, ConversionError> {
        let params = ExecutionParams::new(binary, args, self.config.timeout_seconds).in_dir(work_dir);
        self.executor
            .execute(&params)
            .await
            .map_err(|e| ConversionError::from_executor(self.name, e))
    }

    /// Locate the tool or fail with [`ConversionError::ToolMissing`].
    pub async fn require(&self) -> Result<String, ConversionError> {
        self.locate().await.ok_or_else(|| ConversionError::ToolMissing {
            tool: self.name.to_string(),
        })
    }
}

/// Absolute form of `path`. Tools run inside the work directory, so
/// relative paths would resolve against the wrong base.
pub fn absolute(path: &Path) -> Result<PathBuf, ConversionError> {
    Ok(std::path::absolute(path)?)
}

/// `file://` URL of an absolute path.
pub fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

/// Fail with [`ConversionError::OutputMissing`] unless `path` is a
/// non-empty file.
pub async fn expect_output(tool: &str, path: &Path) -> Result<(), ConversionError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(ConversionError::OutputMissing {
            tool: tool.to_string(),
            path: path.to_path_buf(),
        }),
    }
}
