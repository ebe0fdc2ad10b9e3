//! Text recognition through OCRmyPDF.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ConversionError;
use crate::models::{ConversionJob, ConversionKind, ConversionOutput, ProducedFile};
use crate::provider::{Availability, ConversionProvider, Remediation};
use crate::tool::{ExternalTool, absolute, expect_output};

/// Runs `ocrmypdf -l <lang> --skip-text`.
#[derive(Debug, Clone)]
pub struct OcrMyPdfProvider {
    tool: Arc<ExternalTool>,
}

impl OcrMyPdfProvider {
    /// Create a provider backed by `tool`.
    pub fn new(tool: Arc<ExternalTool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl ConversionProvider for OcrMyPdfProvider {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn supports(&self, kind: &ConversionKind) -> bool {
        matches!(kind, ConversionKind::Ocr { .. })
    }

    async fn probe(&self, _job: &ConversionJob) -> Availability {
        match self.tool.locate().await {
            Some(_) => Availability::Ready,
            None => Availability::Missing(Remediation {
                message: "OCRmyPDF is required for text recognition.".to_string(),
                install: Some("https://ocrmypdf.readthedocs.io/en/latest/installation.html".to_string()),
                fix: Some("Install ocrmypdf together with the tesseract language packs you need".to_string()),
            }),
        }
    }

    async fn execute(&self, job: &ConversionJob) -> Result<ConversionOutput, ConversionError> {
        let ConversionKind::Ocr { language } = &job.kind else {
            return Err(ConversionError::InvalidJob(format!("OCRmyPDF cannot run {}", job.kind)));
        };
        let input = job
            .input
            .as_deref()
            .ok_or_else(|| ConversionError::InvalidJob("No input file".to_string()))?;
        let binary = self.tool.require().await?;

        let work_dir = absolute(&job.work_dir)?;
        let output = work_dir.join("ocr.pdf");
        let args = vec![
            "-l".to_string(),
            language.clone(),
            "--skip-text".to_string(),
            absolute(input)?.to_string_lossy().to_string(),
            output.to_string_lossy().to_string(),
        ];

        self.tool.run(&binary, args, &work_dir).await?;
        expect_output(self.tool.name(), &output).await?;

        Ok(ConversionOutput {
            files: vec![ProducedFile {
                path: output,
                name: format!("{}.pdf", job.input_stem()),
            }],
            note: None,
            provider: self.tool.name().to_string(),
        })
    }
}
