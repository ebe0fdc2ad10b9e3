//! # pdfdesk-document
//!
//! Pure, synchronous document transforms: bytes in, bytes out. Every
//! function here is CPU-bound and is expected to run on a blocking thread.
//!
//! PDF manipulation uses `lopdf`. Page text and images are drawn by
//! appending content streams that reference the standard Type 1 fonts, so
//! no font files are embedded.

mod canvas;
pub mod compose;
pub mod docx;
pub mod error;
pub mod fonts;
pub mod images;
pub mod merge;
pub mod organize;
pub mod pages;
pub mod range;
pub mod repair;
pub mod security;
pub mod split;
pub mod stamp;
pub mod tabular;
pub mod text;

pub use error::{DocumentError, DocumentResult};
pub use organize::{BlankPages, CropMargins, OrganizeOptions};
pub use pages::{PageSelection, PageSize, blank_document, page_count, page_sizes};
pub use range::SplitMode;
pub use repair::CompressionReport;
pub use stamp::{Color, NumberFormat, PageNumberOptions, Placement, Signature, WatermarkOptions};
