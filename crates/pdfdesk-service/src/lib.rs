//! # pdfdesk-service
//!
//! Turns an accepted upload into a result. Form fields are parsed into
//! typed [`options::OperationOptions`], bundled with the input artifacts
//! into a [`job::Job`] and run by the [`invoker::TransformInvoker`], which
//! either calls an in-process transform on the blocking pool or hands the
//! job to a converter chain.

pub mod invoker;
pub mod job;
pub mod options;

pub use invoker::TransformInvoker;
pub use job::{Job, JobOutcome};
pub use options::{FormFields, OperationOptions};
