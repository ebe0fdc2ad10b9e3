//! Upload gate: validates and stores the files of one request.
//!
//! File parts are named `files`; parts without a file name are string
//! fields, and a file under any other name is rejected. The
//! extension of each file is checked before a single byte is written, and
//! accepted files are streamed to `uploads/` chunk by chunk. When the gate
//! rejects a request, the artifacts it already wrote are dropped and
//! therefore deleted.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use serde_json::{Map, Value};

use pdfdesk_core::error::AppError;
use pdfdesk_core::operation::{Operation, OperationDescriptor};
use pdfdesk_core::result::AppResult;
use pdfdesk_service::FormFields;
use pdfdesk_storage::artifact::extension_of;
use pdfdesk_storage::{ArtifactStore, InputArtifact};

/// Multipart part name that carries files.
pub const FILES_FIELD: &str = "files";

/// Files and fields of an accepted request.
#[derive(Debug, Default)]
pub struct AcceptedUpload {
    /// Stored inputs in upload order.
    pub inputs: Vec<InputArtifact>,
    /// String fields.
    pub fields: FormFields,
}

/// Validates one request against an operation descriptor.
#[derive(Debug)]
pub struct UploadGate<'a> {
    store: &'a ArtifactStore,
    descriptor: &'a OperationDescriptor,
}

impl<'a> UploadGate<'a> {
    pub fn new(store: &'a ArtifactStore, descriptor: &'a OperationDescriptor) -> Self {
        Self { store, descriptor }
    }

    /// Read the request body. JSON bodies are accepted for operations that
    /// take no files, e.g. `{ "url": "https://..." }` for HTML to PDF.
    pub async fn receive(&self, request: Request) -> AppResult<AcceptedUpload> {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let upload = if content_type.starts_with("application/json") && !self.descriptor.takes_files() {
            let Json(body) = Json::<Map<String, Value>>::from_request(request, &())
                .await
                .map_err(|e| AppError::invalid_input(e.body_text()))?;
            AcceptedUpload {
                inputs: Vec::new(),
                fields: json_fields(body),
            }
        } else {
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| AppError::invalid_input(e.body_text()))?;
            self.receive_multipart(multipart).await?
        };

        self.check_count(upload.inputs.len())?;
        Ok(upload)
    }

    async fn receive_multipart(&self, mut multipart: Multipart) -> AppResult<AcceptedUpload> {
        let mut upload = AcceptedUpload::default();

        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            let Some(file_name) = file_name else {
                let value = field.text().await.map_err(multipart_error)?;
                upload.fields.insert(name, value);
                continue;
            };
            if file_name.is_empty() {
                // Browsers send an empty part for an untouched file input.
                continue;
            }
            if name != FILES_FIELD {
                return Err(AppError::invalid_input(format!(
                    "Unexpected file in field '{name}'. Files must be sent as '{FILES_FIELD}'"
                )));
            }

            if !self.descriptor.takes_files() {
                return Err(AppError::invalid_input(format!(
                    "{} does not accept file uploads",
                    self.descriptor.operation
                )));
            }
            if upload.inputs.len() >= self.descriptor.max_files {
                return Err(AppError::invalid_input(format!(
                    "Too many files. Maximum is {}",
                    self.descriptor.max_files
                )));
            }
            let extension = extension_of(&file_name);
            if !self.descriptor.accepts(&extension) {
                return Err(AppError::invalid_input(format!(
                    "Invalid file type. Allowed: {}",
                    self.descriptor.allowed_list()
                )));
            }

            let mut writer = self
                .store
                .begin_input(&file_name, self.descriptor.max_file_bytes)
                .await?;
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                writer.write_chunk(&chunk).await?;
            }
            upload.inputs.push(writer.finish().await?);
        }

        Ok(upload)
    }

    fn check_count(&self, count: usize) -> AppResult<()> {
        if count < self.descriptor.min_files {
            return Err(AppError::invalid_input(missing_files_message(
                self.descriptor.operation,
            )));
        }
        Ok(())
    }
}

/// Client-facing message for a request without enough files.
pub fn missing_files_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Merge => "Please upload at least 2 PDF files",
        Operation::JpgToPdf => "Please upload at least one image",
        Operation::WordToPdf => "Please upload a Word file",
        Operation::ExcelToPdf => "Please upload an Excel file",
        Operation::PptToPdf => "Please upload a PowerPoint file",
        _ => "Please upload a PDF file",
    }
}

fn json_fields(body: Map<String, Value>) -> FormFields {
    let mut fields = FormFields::default();
    for (key, value) in body {
        let value = match value {
            Value::String(s) => s,
            Value::Null => continue,
            other => other.to_string(),
        };
        fields.insert(key, value);
    }
    fields
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("Request body is too large")
    } else {
        AppError::invalid_input(format!("Malformed multipart body: {}", err.body_text()))
    }
}
