//! Job and outcome types.

use serde_json::{Map, Value};

use pdfdesk_core::operation::Operation;
use pdfdesk_storage::{InputArtifact, OutputArtifact};

use crate::options::OperationOptions;

/// One request's worth of work.
///
/// The job owns its input artifacts; dropping it deletes them, so inputs are
/// gone as soon as the job ends, successfully or not.
#[derive(Debug)]
pub struct Job {
    /// Requested operation.
    pub operation: Operation,
    /// Uploaded files in upload order.
    pub inputs: Vec<InputArtifact>,
    /// Validated options for `operation`.
    pub options: OperationOptions,
}

impl Job {
    pub fn new(operation: Operation, inputs: Vec<InputArtifact>, options: OperationOptions) -> Self {
        Self {
            operation,
            inputs,
            options,
        }
    }

    /// The first input, for single-file operations.
    pub fn primary(&self) -> Option<&InputArtifact> {
        self.inputs.first()
    }
}

/// What a finished job produced.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// The stored output artifact.
    pub output: OutputArtifact,
    /// Name the client should save the download as.
    pub filename: String,
    /// Present when a degraded converter ran.
    pub note: Option<String>,
    /// Operation specific response fields, e.g. `pageCount`.
    pub extras: Map<String, Value>,
}

impl JobOutcome {
    pub fn new(output: OutputArtifact, filename: impl Into<String>) -> Self {
        Self {
            output,
            filename: filename.into(),
            note: None,
            extras: Map::new(),
        }
    }

    /// Attach a degraded-conversion note.
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Attach an extra response field.
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extras.insert(key.to_string(), value.into());
        self
    }
}
