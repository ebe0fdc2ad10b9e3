//! Web page printing through headless Chromium.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ConversionError;
use crate::models::{ConversionJob, ConversionKind, ConversionOutput, ProducedFile};
use crate::provider::{Availability, ConversionProvider, Remediation};
use crate::tool::{ExternalTool, absolute, expect_output};

const OUTPUT_NAME: &str = "webpage.pdf";

/// Runs `chromium --headless --print-to-pdf`.
#[derive(Debug, Clone)]
pub struct ChromiumProvider {
    tool: Arc<ExternalTool>,
}

impl ChromiumProvider {
    /// Create a provider backed by `tool`.
    pub fn new(tool: Arc<ExternalTool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl ConversionProvider for ChromiumProvider {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn supports(&self, kind: &ConversionKind) -> bool {
        matches!(kind, ConversionKind::HtmlToPdf { .. })
    }

    async fn probe(&self, _job: &ConversionJob) -> Availability {
        match self.tool.locate().await {
            Some(_) => Availability::Ready,
            None => Availability::Missing(Remediation {
                message: "A headless Chromium browser is required for HTML to PDF.".to_string(),
                install: Some("https://www.chromium.org/getting-involved/download-chromium/".to_string()),
                fix: Some(
                    "Install chromium or google-chrome, or list its full path under converters.chromium.binaries"
                        .to_string(),
                ),
            }),
        }
    }

    async fn execute(&self, job: &ConversionJob) -> Result<ConversionOutput, ConversionError> {
        let ConversionKind::HtmlToPdf { url } = &job.kind else {
            return Err(ConversionError::InvalidJob(format!("Chromium cannot run {}", job.kind)));
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConversionError::InvalidJob(
                "Only http and https URLs can be converted".to_string(),
            ));
        }
        let binary = self.tool.require().await?;

        let work_dir = absolute(&job.work_dir)?;
        let output = work_dir.join(OUTPUT_NAME);
        let args = vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--no-pdf-header-footer".to_string(),
            format!("--user-data-dir={}", work_dir.join("chrome-profile").to_string_lossy()),
            format!("--print-to-pdf={}", output.to_string_lossy()),
            url.clone(),
        ];

        self.tool.run(&binary, args, &work_dir).await?;
        expect_output(self.tool.name(), &output).await?;

        Ok(ConversionOutput {
            files: vec![ProducedFile {
                path: output,
                name: OUTPUT_NAME.to_string(),
            }],
            note: None,
            provider: self.tool.name().to_string(),
        })
    }
}
