//! PDF rasterisation through Ghostscript.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ConversionError;
use crate::models::{ConversionJob, ConversionKind, ConversionOutput, ProducedFile};
use crate::provider::{Availability, ConversionProvider, Remediation};
use crate::tool::{ExternalTool, absolute};

const PAGE_PREFIX: &str = "page_";

/// Runs `gs -sDEVICE=jpeg`.
#[derive(Debug, Clone)]
pub struct GhostscriptProvider {
    tool: Arc<ExternalTool>,
}

impl GhostscriptProvider {
    /// Create a provider backed by `tool`.
    pub fn new(tool: Arc<ExternalTool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl ConversionProvider for GhostscriptProvider {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn supports(&self, kind: &ConversionKind) -> bool {
        matches!(kind, ConversionKind::PdfToJpg { .. })
    }

    async fn probe(&self, _job: &ConversionJob) -> Availability {
        match self.tool.locate().await {
            Some(_) => Availability::Ready,
            None => Availability::Missing(Remediation {
                message: "Ghostscript is required to render PDF pages as images.".to_string(),
                install: Some("https://www.ghostscript.com/releases/gsdnld.html".to_string()),
                fix: Some("Install Ghostscript so that `gs` (or `gswin64c`) is on the PATH".to_string()),
            }),
        }
    }

    async fn execute(&self, job: &ConversionJob) -> Result<ConversionOutput, ConversionError> {
        let ConversionKind::PdfToJpg { quality } = &job.kind else {
            return Err(ConversionError::InvalidJob(format!("Ghostscript cannot run {}", job.kind)));
        };
        let input = job
            .input
            .as_deref()
            .ok_or_else(|| ConversionError::InvalidJob("No input file".to_string()))?;
        let binary = self.tool.require().await?;

        let work_dir = absolute(&job.work_dir)?;
        let template = work_dir.join(format!("{PAGE_PREFIX}%03d.jpg"));
        let args = vec![
            "-dNOPAUSE".to_string(),
            "-dBATCH".to_string(),
            "-dSAFER".to_string(),
            "-sDEVICE=jpeg".to_string(),
            format!("-r{}", quality.dpi()),
            format!("-dJPEGQ={}", quality.jpeg_quality()),
            format!("-sOutputFile={}", template.to_string_lossy()),
            absolute(input)?.to_string_lossy().to_string(),
        ];

        self.tool.run(&binary, args, &work_dir).await?;

        let files = rendered_pages(&work_dir).await?;
        if files.is_empty() {
            return Err(ConversionError::OutputMissing {
                tool: self.tool.name().to_string(),
                path: template,
            });
        }

        Ok(ConversionOutput {
            files,
            note: None,
            provider: self.tool.name().to_string(),
        })
    }
}

/// Zero-padded page images in page order, renamed `page_<k>.jpg` for the
/// bundle.
async fn rendered_pages(dir: &Path) -> Result<Vec<ProducedFile>, ConversionError> {
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(PAGE_PREFIX) && name.ends_with(".jpg") {
            paths.push(entry.path());
        }
    }
    paths.sort();

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| ProducedFile {
            path,
            name: format!("{PAGE_PREFIX}{}.jpg", index + 1),
        })
        .collect())
}
