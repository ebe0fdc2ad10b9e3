//! The provider abstraction behind every conversion chain.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ConversionError;
use crate::models::{ConversionJob, ConversionKind, ConversionOutput};

/// How to make an unavailable conversion work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remediation {
    /// Error message shown to the client.
    pub message: String,
    /// Where to get the missing tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<String>,
    /// What to do on this host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl Remediation {
    /// Remediation when nothing more specific is known.
    pub fn generic(kind: &ConversionKind) -> Self {
        Self {
            message: format!("{kind} conversion is not available on this server."),
            install: None,
            fix: None,
        }
    }
}

/// Answer of [`ConversionProvider::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// The provider can run this job now.
    Ready,
    /// The provider would handle the job but its tool is absent or disabled.
    Missing(Remediation),
    /// The provider does not handle this particular input.
    Unsupported,
}

/// One link of a conversion chain.
///
/// A chain asks each provider in order whether it is ready and lets the
/// first ready one execute. Errors from `execute` end the chain.
#[async_trait]
pub trait ConversionProvider: Send + Sync + std::fmt::Debug {
    /// Short name used in logs and responses.
    fn name(&self) -> &str;

    /// Whether the provider takes part in chains for `kind`.
    fn supports(&self, kind: &ConversionKind) -> bool;

    /// Whether the provider can handle `job` right now.
    async fn probe(&self, job: &ConversionJob) -> Availability;

    /// Run the conversion, writing results into the job's work directory.
    async fn execute(&self, job: &ConversionJob) -> Result<ConversionOutput, ConversionError>;
}
