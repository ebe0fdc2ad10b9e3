//! Degraded in-process conversions used when no external tool is installed.
//!
//! Each result carries a note telling the client what was lost and which
//! tool restores full fidelity.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};

use pdfdesk_document::{compose, docx, pages, tabular};

use crate::error::ConversionError;
use crate::models::{ConversionJob, ConversionKind, ConversionOutput, ProducedFile, RasterQuality};
use crate::provider::{Availability, ConversionProvider};

/// Note attached to text-extraction Word output.
pub const WORD_NOTE: &str =
    "Converted from extracted text only. Install LibreOffice for layout-preserving .docx output.";
/// Note attached to text-only PDF output.
pub const PDF_NOTE: &str =
    "Text-only rendering without formatting or images. Install LibreOffice for full-fidelity PDF output.";
/// Note attached to CSV output.
pub const CSV_NOTE: &str = "CSV format: opens directly in Excel. Install LibreOffice for .xlsx output.";
/// Note attached to placeholder page images.
pub const JPG_NOTE: &str =
    "Page content was not rendered. Install Ghostscript to convert PDF pages to images.";
/// Note attached to the OCR pass-through.
pub const OCR_NOTE: &str = "No text layer was added. Install OCRmyPDF for full OCR.";

/// Longest side of a placeholder image, in pixels.
const MAX_PLACEHOLDER_SIDE: u32 = 4000;

/// The in-process fallback at the end of every chain it supports.
#[derive(Debug, Clone, Default)]
pub struct BuiltinProvider;

impl BuiltinProvider {
    /// Create the provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionProvider for BuiltinProvider {
    fn name(&self) -> &str {
        "builtin"
    }

    fn supports(&self, kind: &ConversionKind) -> bool {
        matches!(
            kind,
            ConversionKind::PdfToWord
                | ConversionKind::WordToPdf
                | ConversionKind::PdfToExcel
                | ConversionKind::PdfToJpg { .. }
                | ConversionKind::Ocr { .. }
        )
    }

    async fn probe(&self, job: &ConversionJob) -> Availability {
        match (&job.kind, &job.input) {
            (ConversionKind::WordToPdf, Some(input)) => {
                // Only .docx text can be read in-process.
                match tokio::fs::read(input).await {
                    Ok(bytes) if docx::is_docx(&bytes) => Availability::Ready,
                    _ => Availability::Unsupported,
                }
            }
            (kind, _) if self.supports(kind) => Availability::Ready,
            _ => Availability::Unsupported,
        }
    }

    async fn execute(&self, job: &ConversionJob) -> Result<ConversionOutput, ConversionError> {
        let input = job
            .input
            .as_deref()
            .ok_or_else(|| ConversionError::InvalidJob("No input file".to_string()))?;
        let source = tokio::fs::read(input).await?;
        let kind = job.kind.clone();
        let input_name = job.input_name.clone();
        let stem = job.input_stem();
        let work_dir = job.work_dir.clone();

        let (files, note) = tokio::task::spawn_blocking(move || {
            run_fallback(&kind, &source, &input_name, &stem, &work_dir)
        })
        .await??;

        tracing::info!(
            kind = %job.kind,
            files = files.len(),
            "Degraded in-process conversion completed"
        );

        Ok(ConversionOutput {
            files,
            note: Some(note.to_string()),
            provider: self.name().to_string(),
        })
    }
}

fn run_fallback(
    kind: &ConversionKind,
    source: &[u8],
    input_name: &str,
    stem: &str,
    work_dir: &Path,
) -> Result<(Vec<ProducedFile>, &'static str), ConversionError> {
    let single = |bytes: Vec<u8>, name: String| -> Result<Vec<ProducedFile>, ConversionError> {
        let path = work_dir.join(&name);
        std::fs::write(&path, bytes)?;
        Ok(vec![ProducedFile { path, name }])
    };

    match kind {
        ConversionKind::PdfToWord => {
            let bytes = docx::pdf_to_docx(source, stem)?;
            Ok((single(bytes, format!("{stem}.docx"))?, WORD_NOTE))
        }
        ConversionKind::WordToPdf => {
            let bytes = compose::docx_to_pdf(source)?;
            Ok((single(bytes, format!("{stem}.pdf"))?, PDF_NOTE))
        }
        ConversionKind::PdfToExcel => {
            let bytes = tabular::pdf_to_csv(source, input_name)?;
            Ok((single(bytes, format!("{stem}.csv"))?, CSV_NOTE))
        }
        ConversionKind::PdfToJpg { quality } => {
            Ok((placeholder_pages(source, *quality, work_dir)?, JPG_NOTE))
        }
        ConversionKind::Ocr { .. } => {
            let mut doc = pages::load(source)?;
            let bytes = pages::save(&mut doc)?;
            Ok((single(bytes, format!("{stem}.pdf"))?, OCR_NOTE))
        }
        other => Err(ConversionError::InvalidJob(format!(
            "{other} has no in-process fallback"
        ))),
    }
}

/// One white JPEG per page, sized like the page at the requested
/// resolution.
fn placeholder_pages(
    source: &[u8],
    quality: RasterQuality,
    work_dir: &Path,
) -> Result<Vec<ProducedFile>, ConversionError> {
    let scale = quality.dpi() as f32 / 72.0;
    let mut files = Vec::new();

    for (index, size) in pages::page_sizes(source)?.into_iter().enumerate() {
        let width = pixels(size.width, scale);
        let height = pixels(size.height, scale);
        let canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality.jpeg_quality()))?;

        let name = format!("page_{}.jpg", index + 1);
        let path: PathBuf = work_dir.join(&name);
        std::fs::write(&path, jpeg)?;
        files.push(ProducedFile { path, name });
    }

    Ok(files)
}

fn pixels(points: f32, scale: f32) -> u32 {
    ((points * scale).round() as u32).clamp(1, MAX_PLACEHOLDER_SIDE)
}
