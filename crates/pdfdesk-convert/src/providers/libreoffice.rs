//! Office conversions through headless LibreOffice.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ConversionError;
use crate::models::{ConversionJob, ConversionKind, ConversionOutput, ProducedFile};
use crate::provider::{Availability, ConversionProvider, Remediation};
use crate::tool::{ExternalTool, absolute, expect_output, file_url};

/// Where LibreOffice is downloaded from.
pub const INSTALL_URL: &str = "https://www.libreoffice.org/download/";

/// Runs `soffice --headless --convert-to`.
#[derive(Debug, Clone)]
pub struct LibreOfficeProvider {
    tool: Arc<ExternalTool>,
}

impl LibreOfficeProvider {
    /// Create a provider backed by `tool`.
    pub fn new(tool: Arc<ExternalTool>) -> Self {
        Self { tool }
    }

    fn target_format(kind: &ConversionKind) -> Option<&'static str> {
        match kind {
            ConversionKind::PdfToWord => Some("docx"),
            ConversionKind::PdfToExcel => Some("xlsx"),
            ConversionKind::PdfToPpt => Some("pptx"),
            ConversionKind::WordToPdf | ConversionKind::ExcelToPdf | ConversionKind::PptToPdf => {
                Some("pdf")
            }
            _ => None,
        }
    }

    fn remediation(kind: &ConversionKind) -> Remediation {
        Remediation {
            message: format!("LibreOffice is required for {kind} conversion."),
            install: Some(INSTALL_URL.to_string()),
            fix: Some(
                "Install LibreOffice and make sure `libreoffice` or `soffice` is on the PATH, \
                 or list its full path under converters.libreoffice.binaries"
                    .to_string(),
            ),
        }
    }
}

#[async_trait]
impl ConversionProvider for LibreOfficeProvider {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn supports(&self, kind: &ConversionKind) -> bool {
        Self::target_format(kind).is_some()
    }

    async fn probe(&self, job: &ConversionJob) -> Availability {
        match self.tool.locate().await {
            Some(_) => Availability::Ready,
            None => Availability::Missing(Self::remediation(&job.kind)),
        }
    }

    async fn execute(&self, job: &ConversionJob) -> Result<ConversionOutput, ConversionError> {
        let format = Self::target_format(&job.kind)
            .ok_or_else(|| ConversionError::InvalidJob(format!("LibreOffice cannot run {}", job.kind)))?;
        let input = job
            .input
            .as_deref()
            .ok_or_else(|| ConversionError::InvalidJob("No input file".to_string()))?;
        let binary = self.tool.require().await?;

        let work_dir = absolute(&job.work_dir)?;
        let out_dir = work_dir.join("out");
        tokio::fs::create_dir_all(&out_dir).await?;

        // A private profile lets concurrent jobs run without fighting over
        // the user's LibreOffice lock file.
        let mut args = vec![
            format!("-env:UserInstallation={}", file_url(&work_dir.join("profile"))),
            "--headless".to_string(),
        ];
        if job.kind == ConversionKind::PdfToWord {
            args.push("--infilter=writer_pdf_import".to_string());
        }
        args.extend([
            "--convert-to".to_string(),
            format.to_string(),
            "--outdir".to_string(),
            out_dir.to_string_lossy().to_string(),
            absolute(input)?.to_string_lossy().to_string(),
        ]);

        self.tool.run(&binary, args, &work_dir).await?;

        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let produced = out_dir.join(format!("{stem}.{format}"));
        expect_output(self.tool.name(), &produced).await?;

        Ok(ConversionOutput {
            files: vec![ProducedFile {
                path: produced,
                name: format!("{}.{format}", job.input_stem()),
            }],
            note: None,
            provider: self.tool.name().to_string(),
        })
    }
}
