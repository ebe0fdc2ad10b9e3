//! Operation catalogue.
//!
//! Every HTTP operation is a variant of [`Operation`]. Its
//! [`OperationDescriptor`] says which uploads the operation accepts; the
//! descriptors are built once at startup into an [`OperationCatalog`] and
//! never change afterwards.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::error::AppError;

const PDF: &[&str] = &[".pdf"];
const OFFICE: &[&str] = &[".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"];
const IMAGES: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

/// Every transformation the service offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Concatenate several PDFs.
    Merge,
    /// Split one PDF into chunks.
    Split,
    /// Rewrite a PDF with compressed streams.
    Compress,
    /// Rotate pages.
    Rotate,
    /// Stamp a text watermark.
    Watermark,
    /// Encrypt with a password.
    Protect,
    /// Remove password protection.
    Unlock,
    /// Apply a crop box.
    Crop,
    /// Stamp page numbers.
    PageNumbers,
    /// Rotate pages and insert blanks.
    Organize,
    /// Reload leniently and save.
    Repair,
    /// Stamp a signature on the last page.
    Sign,
    /// Add a text layer.
    Ocr,
    /// PDF to DOCX.
    PdfToWord,
    /// Office document to PDF.
    WordToPdf,
    /// PDF to XLSX (or CSV).
    PdfToExcel,
    /// Spreadsheet to PDF.
    ExcelToPdf,
    /// PDF to PPTX.
    PdfToPpt,
    /// Presentation to PDF.
    PptToPdf,
    /// Web page to PDF.
    HtmlToPdf,
    /// Images to one PDF.
    JpgToPdf,
    /// PDF pages to JPEG images.
    PdfToJpg,
}

impl Operation {
    /// All operations, in route order.
    pub const ALL: [Operation; 22] = [
        Self::Merge,
        Self::Split,
        Self::Compress,
        Self::Rotate,
        Self::Watermark,
        Self::Protect,
        Self::Unlock,
        Self::Crop,
        Self::PageNumbers,
        Self::Organize,
        Self::Repair,
        Self::Sign,
        Self::Ocr,
        Self::PdfToWord,
        Self::WordToPdf,
        Self::PdfToExcel,
        Self::ExcelToPdf,
        Self::PdfToPpt,
        Self::PptToPdf,
        Self::HtmlToPdf,
        Self::JpgToPdf,
        Self::PdfToJpg,
    ];

    /// URL path segment under `/api`.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Compress => "compress",
            Self::Rotate => "rotate",
            Self::Watermark => "watermark",
            Self::Protect => "protect",
            Self::Unlock => "unlock",
            Self::Crop => "crop",
            Self::PageNumbers => "page-numbers",
            Self::Organize => "organize",
            Self::Repair => "repair",
            Self::Sign => "sign",
            Self::Ocr => "ocr",
            Self::PdfToWord => "pdf-to-word",
            Self::WordToPdf => "word-to-pdf",
            Self::PdfToExcel => "pdf-to-excel",
            Self::ExcelToPdf => "excel-to-pdf",
            Self::PdfToPpt => "pdf-to-ppt",
            Self::PptToPdf => "ppt-to-pdf",
            Self::HtmlToPdf => "html-to-pdf",
            Self::JpgToPdf => "jpg-to-pdf",
            Self::PdfToJpg => "pdf-to-jpg",
        }
    }

    fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::WordToPdf | Self::ExcelToPdf | Self::PptToPdf => OFFICE,
            Self::JpgToPdf => IMAGES,
            Self::HtmlToPdf => &[],
            _ => PDF,
        }
    }

    fn file_bounds(&self) -> (usize, usize) {
        match self {
            Self::Merge => (2, 20),
            Self::JpgToPdf => (1, 30),
            Self::HtmlToPdf => (0, 0),
            _ => (1, 1),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.slug() == s)
            .ok_or_else(|| AppError::not_found(format!("Unknown operation '{s}'")))
    }
}

/// What an operation accepts at the upload gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    /// The operation described.
    pub operation: Operation,
    /// Lower-cased extensions including the dot.
    pub accepted_extensions: Vec<&'static str>,
    /// Minimum number of `files` parts.
    pub min_files: usize,
    /// Maximum number of `files` parts.
    pub max_files: usize,
    /// Per-file byte limit.
    pub max_file_bytes: u64,
}

impl OperationDescriptor {
    /// Whether `extension` (with dot, any case) is on the allow-list.
    pub fn accepts(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        self.accepted_extensions.iter().any(|e| *e == extension)
    }

    /// The allow-list as shown in error messages.
    pub fn allowed_list(&self) -> String {
        self.accepted_extensions.join(", ")
    }

    /// Whether this operation takes file uploads at all.
    pub fn takes_files(&self) -> bool {
        self.max_files > 0
    }
}

/// Immutable map of operation to descriptor.
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    descriptors: HashMap<Operation, OperationDescriptor>,
}

impl OperationCatalog {
    /// Build the catalogue from storage limits.
    pub fn new(storage: &StorageConfig) -> Self {
        let max_file_bytes = storage.max_upload_bytes();
        let descriptors = Operation::ALL
            .iter()
            .map(|&operation| {
                let (min_files, max_files) = operation.file_bounds();
                let descriptor = OperationDescriptor {
                    operation,
                    accepted_extensions: operation.accepted_extensions().to_vec(),
                    min_files,
                    max_files,
                    max_file_bytes,
                };
                (operation, descriptor)
            })
            .collect();

        Self { descriptors }
    }

    /// Descriptor for an operation.
    pub fn get(&self, operation: Operation) -> &OperationDescriptor {
        // Built from Operation::ALL, so every variant is present.
        &self.descriptors[&operation]
    }

    /// The largest request body any operation can legitimately send.
    pub fn max_request_bytes(&self) -> u64 {
        self.descriptors
            .values()
            .map(|d| d.max_file_bytes.saturating_mul(d.max_files.max(1) as u64))
            .max()
            .unwrap_or(0)
            // room for form fields and multipart framing
            .saturating_add(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip_for_every_operation() {
        for op in Operation::ALL {
            assert_eq!(op.slug().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_slug_is_not_found() {
        let err = "pdf-to-epub".parse::<Operation>().unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::NotFound);
    }

    #[test]
    fn test_descriptor_allow_lists() {
        let catalog = OperationCatalog::new(&StorageConfig::default());

        let merge = catalog.get(Operation::Merge);
        assert!(merge.accepts(".PDF"));
        assert!(!merge.accepts(".docx"));
        assert_eq!((merge.min_files, merge.max_files), (2, 20));

        let word = catalog.get(Operation::WordToPdf);
        assert!(word.accepts(".docx"));
        assert!(word.accepts(".pdf"));

        let images = catalog.get(Operation::JpgToPdf);
        assert!(images.accepts(".webp"));
        assert_eq!(images.max_files, 30);

        let html = catalog.get(Operation::HtmlToPdf);
        assert!(!html.takes_files());
        assert_eq!(merge.max_file_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn test_max_request_bytes_covers_largest_batch() {
        let storage = StorageConfig {
            max_upload_size_mb: 1,
            ..StorageConfig::default()
        };
        let catalog = OperationCatalog::new(&storage);
        assert_eq!(catalog.max_request_bytes(), 31 * 1024 * 1024);
    }
}
