//! Shared test helpers for integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pdfdesk_core::config::AppConfig;
use pdfdesk_document::{PageSize, blank_document};

const BOUNDARY: &str = "pdfdesk-test-boundary";

/// Test application backed by a throwaway data root
pub struct TestApp {
    /// The Axum app, with the full middleware stack
    pub router: Router,
    /// Application config
    pub config: AppConfig,
    /// Keeps the data root alive for the test's duration
    pub data: TempDir,
}

impl TestApp {
    /// Create a new test application with default settings
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application after adjusting the config
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let data = tempfile::tempdir().expect("Failed to create data root");

        let mut config = AppConfig::default();
        config.storage.data_root = data.path().to_string_lossy().into_owned();
        config.sweeper.enabled = false;
        adjust(&mut config);

        let state = pdfdesk_api::AppState::new(config.clone())
            .await
            .expect("Failed to build app state");
        let router = pdfdesk_api::build_app(state);

        Self {
            router,
            config,
            data,
        }
    }

    /// Names of files currently under `uploads/`
    pub fn uploads(&self) -> Vec<String> {
        list_dir(&self.config.storage.uploads_dir())
    }

    /// Names of files currently under `outputs/`
    pub fn outputs(&self) -> Vec<String> {
        list_dir(&self.config.storage.outputs_dir())
    }

    /// POST a multipart form to `path`
    pub async fn upload(
        &self,
        path: &str,
        files: &[(&str, Vec<u8>)],
        fields: &[(&str, &str)],
    ) -> TestResponse {
        self.upload_under(path, "files", files, fields).await
    }

    /// POST a multipart form whose file parts use `file_field` as their name
    pub async fn upload_under(
        &self,
        path: &str,
        file_field: &str,
        files: &[(&str, Vec<u8>)],
        fields: &[(&str, &str)],
    ) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("Host", "localhost:5000")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(file_field, files, fields)))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Make a request with an optional JSON body
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Host", "localhost:5000")
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Send a prepared request
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body")
            .to_vec();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when the body is not JSON
    pub body: Value,
    /// Raw body
    pub bytes: Vec<u8>,
}

impl TestResponse {
    /// Path part of `downloadUrl`, e.g. `/outputs/<name>`
    pub fn download_path(&self) -> String {
        let url = self.body["downloadUrl"]
            .as_str()
            .expect("No downloadUrl in response");
        let start = url.find("/outputs/").expect("downloadUrl is not under /outputs");
        url[start..].to_string()
    }
}

/// A PDF with `pages` A4 pages
pub fn pdf(pages: usize) -> Vec<u8> {
    blank_document(&vec![PageSize::A4; pages]).expect("Failed to build fixture PDF")
}

/// A PDF whose pages have the given widths, to tell pages apart
pub fn pdf_with_widths(widths: &[f32]) -> Vec<u8> {
    let sizes: Vec<PageSize> = widths.iter().map(|w| PageSize::new(*w, 800.0)).collect();
    blank_document(&sizes).expect("Failed to build fixture PDF")
}

/// Page widths of a PDF
pub fn widths(bytes: &[u8]) -> Vec<f32> {
    pdfdesk_document::page_sizes(bytes)
        .expect("Output is not a readable PDF")
        .iter()
        .map(|s| s.width)
        .collect()
}

fn multipart_body(
    file_field: &str,
    files: &[(&str, Vec<u8>)],
    fields: &[(&str, &str)],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{file_field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn list_dir(dir: &std::path::Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}
