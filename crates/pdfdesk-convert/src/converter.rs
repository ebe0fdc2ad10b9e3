//! Conversion orchestrator: picks the first ready provider of a chain.

use std::sync::Arc;

use pdfdesk_core::config::ConvertersConfig;

use crate::error::ConversionError;
use crate::models::{ConversionJob, ConversionOutput};
use crate::provider::{Availability, ConversionProvider, Remediation};
use crate::providers::{
    BuiltinProvider, ChromiumProvider, GhostscriptProvider, LibreOfficeProvider, OcrMyPdfProvider,
};
use crate::tool::{ExternalTool, ToolStatus};

/// Runs conversions through ordered provider chains.
///
/// The chain for a job is every provider that supports its kind, in
/// registration order: full-fidelity tools first, the in-process fallback
/// last.
#[derive(Debug, Clone)]
pub struct Converter {
    providers: Vec<Arc<dyn ConversionProvider>>,
    tools: Vec<Arc<ExternalTool>>,
}

impl Converter {
    /// Build the standard chains from configuration.
    pub fn from_config(config: &ConvertersConfig) -> Self {
        let libreoffice = Arc::new(ExternalTool::new("libreoffice", config.libreoffice.clone()));
        let ghostscript = Arc::new(ExternalTool::new("ghostscript", config.ghostscript.clone()));
        let chromium = Arc::new(ExternalTool::new("chromium", config.chromium.clone()));
        let ocrmypdf = Arc::new(ExternalTool::new("ocrmypdf", config.ocrmypdf.clone()));

        let providers: Vec<Arc<dyn ConversionProvider>> = vec![
            Arc::new(LibreOfficeProvider::new(libreoffice.clone())),
            Arc::new(GhostscriptProvider::new(ghostscript.clone())),
            Arc::new(ChromiumProvider::new(chromium.clone())),
            Arc::new(OcrMyPdfProvider::new(ocrmypdf.clone())),
            Arc::new(BuiltinProvider::new()),
        ];

        Self::with_providers(providers, vec![libreoffice, ghostscript, chromium, ocrmypdf])
    }

    /// Build from explicit providers.
    pub fn with_providers(
        providers: Vec<Arc<dyn ConversionProvider>>,
        tools: Vec<Arc<ExternalTool>>,
    ) -> Self {
        Self { providers, tools }
    }

    /// Providers that take part in the chain for `job`, in order.
    pub fn chain(&self, job: &ConversionJob) -> Vec<Arc<dyn ConversionProvider>> {
        self.providers
            .iter()
            .filter(|p| p.supports(&job.kind))
            .cloned()
            .collect()
    }

    /// Run `job` on the first ready provider.
    ///
    /// A provider whose tool is missing passes the job on. A provider that
    /// runs and fails ends the chain with its error; a broken installation
    /// is reported rather than hidden behind a degraded result.
    pub async fn convert(&self, job: &ConversionJob) -> Result<ConversionOutput, ConversionError> {
        if job.kind.needs_input() && job.input.is_none() {
            return Err(ConversionError::InvalidJob("No input file".to_string()));
        }

        let mut remediation: Option<Remediation> = None;

        for provider in self.chain(job) {
            match provider.probe(job).await {
                Availability::Ready => {
                    tracing::info!(
                        kind = %job.kind,
                        provider = provider.name(),
                        "Running conversion"
                    );
                    let output = provider.execute(job).await?;
                    if output.note.is_some() {
                        tracing::warn!(
                            kind = %job.kind,
                            provider = provider.name(),
                            "Conversion degraded"
                        );
                    }
                    return Ok(output);
                }
                Availability::Missing(missing) => {
                    tracing::debug!(
                        kind = %job.kind,
                        provider = provider.name(),
                        "Provider unavailable, trying next"
                    );
                    remediation.get_or_insert(missing);
                }
                Availability::Unsupported => {}
            }
        }

        tracing::warn!(kind = %job.kind, "No provider can run conversion");
        Err(ConversionError::NoProvider {
            remediation: remediation.unwrap_or_else(|| Remediation::generic(&job.kind)),
        })
    }

    /// Availability of every external tool.
    pub async fn tools(&self) -> Vec<ToolStatus> {
        let mut statuses = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            statuses.push(tool.status().await);
        }
        statuses
    }
}
