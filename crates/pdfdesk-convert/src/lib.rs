//! # pdfdesk-convert
//!
//! Conversions that need an external program: LibreOffice for office
//! formats, Ghostscript for page images, headless Chromium for web pages
//! and OCRmyPDF for text recognition.
//!
//! Each conversion kind has an ordered chain of [`ConversionProvider`]s.
//! The first provider whose tool is installed runs; when none is, an
//! in-process fallback produces a degraded result with a note, or the
//! conversion fails with install hints.

pub mod converter;
pub mod error;
pub mod executor;
pub mod models;
pub mod provider;
pub mod providers;
pub mod tool;

pub use converter::Converter;
pub use error::ConversionError;
pub use models::{ConversionJob, ConversionKind, ConversionOutput, ProducedFile, RasterQuality};
pub use provider::{Availability, ConversionProvider, Remediation};
pub use tool::ToolStatus;
