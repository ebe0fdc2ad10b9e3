//! # pdfdesk-core
//!
//! Core crate for PDFDesk. Contains the configuration schema, the
//! operation catalogue (which uploads each operation accepts) and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other PDFDesk crates.

pub mod config;
pub mod error;
pub mod operation;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use operation::{Operation, OperationCatalog, OperationDescriptor};
pub use result::AppResult;
