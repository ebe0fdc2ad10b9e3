//! Convenience result type alias for PDFDesk.

use crate::error::AppError;

/// A specialized `Result` type for PDFDesk operations.
pub type AppResult<T> = Result<T, AppError>;
