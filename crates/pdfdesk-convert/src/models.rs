//! Conversion jobs and their results.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Rendering quality for PDF to JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterQuality {
    /// 100 dpi, JPEG quality 70.
    Low,
    /// 150 dpi, JPEG quality 85.
    Medium,
    /// 200 dpi, JPEG quality 95.
    #[default]
    High,
}

impl RasterQuality {
    /// Parse a form value. Unknown values fall back to high.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            _ => Self::High,
        }
    }

    /// Render resolution.
    pub fn dpi(&self) -> u32 {
        match self {
            Self::Low => 100,
            Self::Medium => 150,
            Self::High => 200,
        }
    }

    /// JPEG quality, 1..=100.
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            Self::Low => 70,
            Self::Medium => 85,
            Self::High => 95,
        }
    }
}

/// What to convert into what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionKind {
    /// PDF to `.docx`.
    PdfToWord,
    /// Word (or any office document) to PDF.
    WordToPdf,
    /// PDF to `.xlsx`.
    PdfToExcel,
    /// Spreadsheet to PDF.
    ExcelToPdf,
    /// PDF to `.pptx`.
    PdfToPpt,
    /// Presentation to PDF.
    PptToPdf,
    /// Each PDF page to a JPEG.
    PdfToJpg {
        /// Resolution and compression.
        quality: RasterQuality,
    },
    /// Add a recognised text layer.
    Ocr {
        /// Tesseract language code, e.g. `eng`.
        language: String,
    },
    /// Print a web page.
    HtmlToPdf {
        /// `http` or `https` URL.
        url: String,
    },
}

impl ConversionKind {
    /// Human-readable name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PdfToWord => "PDF to Word",
            Self::WordToPdf => "Word to PDF",
            Self::PdfToExcel => "PDF to Excel",
            Self::ExcelToPdf => "Excel to PDF",
            Self::PdfToPpt => "PDF to PowerPoint",
            Self::PptToPdf => "PowerPoint to PDF",
            Self::PdfToJpg { .. } => "PDF to JPG",
            Self::Ocr { .. } => "OCR",
            Self::HtmlToPdf { .. } => "HTML to PDF",
        }
    }

    /// Whether the job reads an uploaded file.
    pub fn needs_input(&self) -> bool {
        !matches!(self, Self::HtmlToPdf { .. })
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One conversion request handed to a provider chain.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// The conversion.
    pub kind: ConversionKind,
    /// Stored input artifact, absent for URL jobs.
    pub input: Option<PathBuf>,
    /// Client file name of the input.
    pub input_name: String,
    /// Scratch directory owned by the job. Providers write here.
    pub work_dir: PathBuf,
}

impl ConversionJob {
    /// Client file name without directories or extension.
    pub fn input_stem(&self) -> String {
        let base = self
            .input_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.input_name);
        std::path::Path::new(base)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("document")
            .to_string()
    }
}

/// A file written into the work directory by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedFile {
    /// Location inside the work directory.
    pub path: PathBuf,
    /// Name to use inside a bundle, e.g. `page_3.jpg`.
    pub name: String,
}

impl ProducedFile {
    /// Lower-cased extension including the dot.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default()
    }
}

/// What a provider produced.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Files in order; more than one means the caller bundles them.
    pub files: Vec<ProducedFile>,
    /// Set when a degraded fallback ran.
    pub note: Option<String>,
    /// Name of the provider that ran.
    pub provider: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_quality_table() {
        assert_eq!(RasterQuality::parse("LOW").dpi(), 100);
        assert_eq!(RasterQuality::parse("high").jpeg_quality(), 95);
        assert_eq!(RasterQuality::parse("Medium").dpi(), 150);
        assert_eq!(RasterQuality::parse("ultra"), RasterQuality::High);
        assert_eq!(RasterQuality::default().dpi(), 200);
    }

    #[test]
    fn test_input_stem() {
        let job = ConversionJob {
            kind: ConversionKind::PdfToWord,
            input: None,
            input_name: r"C:\scans\Minutes.2024.pdf".to_string(),
            work_dir: PathBuf::from("/tmp"),
        };
        assert_eq!(job.input_stem(), "Minutes.2024");
    }

    #[test]
    fn test_produced_file_extension() {
        let file = ProducedFile {
            path: PathBuf::from("/work/abc.XLSX"),
            name: "abc.xlsx".to_string(),
        };
        assert_eq!(file.extension(), ".xlsx");
    }
}
