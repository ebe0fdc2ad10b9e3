//! Error type for external conversions.
//!
//! Process failures, missing tools and fallback errors are collected in one
//! `ConversionError` enum that maps onto `pdfdesk_core::error::AppError`.

use std::path::PathBuf;

use pdfdesk_core::error::{AppError, ErrorKind};
use pdfdesk_document::DocumentError;
use thiserror::Error;

use crate::executor::ExecutorError;
use crate::provider::Remediation;

/// Errors raised while converting through a provider chain.
#[derive(Debug, Error)]
pub enum ConversionError {
    // --- Process execution errors ---
    /// The tool exceeded its wall-clock limit and was killed.
    #[error("{tool} timed out after {timeout_seconds}s")]
    Timeout {
        /// Tool name.
        tool: String,
        /// The limit that was exceeded.
        timeout_seconds: u64,
    },

    /// The tool exited with a non-zero status.
    #[error("{tool} conversion failed (exit code {code})")]
    ProcessFailed {
        /// Tool name.
        tool: String,
        /// The exit code.
        code: i32,
        /// Captured stderr excerpt.
        stderr: String,
    },

    /// The tool reported success but the expected file is not there.
    #[error("{tool} did not produce an output file")]
    OutputMissing {
        /// Tool name.
        tool: String,
        /// Where the output was expected.
        path: PathBuf,
    },

    /// The tool disappeared between probing and running.
    #[error("{tool} is not installed")]
    ToolMissing {
        /// Tool name.
        tool: String,
    },

    // --- Chain errors ---
    /// Nothing in the chain can run this conversion on this host.
    #[error("{}", .remediation.message)]
    NoProvider {
        /// How to make the conversion available.
        remediation: Remediation,
    },

    /// The job itself is malformed (missing input, bad URL).
    #[error("{0}")]
    InvalidJob(String),

    // --- Generic errors ---
    /// An in-process fallback failed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Image encoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tokio task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ConversionError {
    /// Attribute an executor failure to `tool`.
    pub fn from_executor(tool: &str, err: ExecutorError) -> Self {
        match err {
            ExecutorError::CommandNotFound(_) => Self::ToolMissing {
                tool: tool.to_string(),
            },
            ExecutorError::Timeout(timeout_seconds) => Self::Timeout {
                tool: tool.to_string(),
                timeout_seconds,
            },
            ExecutorError::ProcessFailed { code, stderr } => Self::ProcessFailed {
                tool: tool.to_string(),
                code,
                stderr,
            },
            ExecutorError::Io(e) => Self::Io(e),
        }
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::NoProvider { remediation } => {
                let mut app = AppError::not_implemented(remediation.message);
                if let Some(install) = remediation.install {
                    app = app.with_detail("install", install);
                }
                if let Some(fix) = remediation.fix {
                    app = app.with_detail("fix", fix);
                }
                app
            }
            ConversionError::InvalidJob(message) => AppError::invalid_input(message),
            ConversionError::Document(e) => AppError::from(e),
            ConversionError::Io(e) => {
                AppError::with_source(ErrorKind::Storage, format!("I/O error: {e}"), e)
            }
            other => {
                let message = other.to_string();
                AppError::with_source(ErrorKind::Processing, message, other)
            }
        }
    }
}
