//! Error type for document transforms.

use pdfdesk_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Errors raised while reading, transforming or writing documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The input is not a readable PDF.
    #[error("Could not read PDF: {0}")]
    Parse(#[source] lopdf::Error),

    /// A structural lookup failed inside an otherwise readable PDF.
    #[error("Malformed PDF structure: {0}")]
    Pdf(#[from] lopdf::Error),

    /// The document could not be serialized.
    #[error("Could not write PDF: {0}")]
    Save(String),

    /// Even a tolerant reload could not recover the document.
    #[error("Could not repair PDF. The file may be too damaged.")]
    Unrepairable,

    /// The document has no pages to work on.
    #[error("PDF has no pages")]
    NoPages,

    /// The input is encrypted and the transform needs plain objects.
    #[error("This PDF is password protected. Unlock it first.")]
    Encrypted,

    /// Neither the user nor the owner password matched.
    #[error("Incorrect password")]
    IncorrectPassword,

    /// The document uses a security handler that is not supported.
    #[error("Unsupported PDF encryption: {0}")]
    UnsupportedEncryption(String),

    /// A caller-supplied option cannot be applied to this document.
    #[error("{0}")]
    InvalidOption(String),

    /// Image decoding or encoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Office archive could not be read or written.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Office XML could not be parsed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for document transforms.
pub type DocumentResult<T> = Result<T, DocumentError>;

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::InvalidOption(message) => AppError::invalid_input(message),
            DocumentError::IncorrectPassword => AppError::authentication("Incorrect password"),
            DocumentError::Encrypted => AppError::invalid_input(err.to_string()),
            DocumentError::Io(e) => {
                AppError::with_source(ErrorKind::Storage, format!("I/O error: {e}"), e)
            }
            other => {
                let message = other.to_string();
                AppError::with_source(ErrorKind::Processing, message, other)
            }
        }
    }
}
