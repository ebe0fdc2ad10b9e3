//! Success payloads for finished jobs.

use serde_json::{Map, Value};

use pdfdesk_service::JobOutcome;

use crate::extractors::RequestOrigin;

/// Builds `{ success, downloadUrl, filename, size, note?, ...extras }`.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuilder {
    public_base_url: Option<String>,
}

impl ResponseBuilder {
    /// A configured public base URL replaces the request's scheme and host.
    pub fn new(public_base_url: Option<String>) -> Self {
        let public_base_url = public_base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        Self { public_base_url }
    }

    /// Absolute URL of an output under `/outputs`.
    pub fn download_url(&self, origin: &RequestOrigin, name: &str) -> String {
        let base = match &self.public_base_url {
            Some(base) => base.clone(),
            None => origin.base_url(),
        };
        format!("{base}/outputs/{name}")
    }

    /// Response body for `outcome`.
    pub fn success(&self, origin: &RequestOrigin, outcome: &JobOutcome) -> Value {
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(true));
        body.insert(
            "downloadUrl".into(),
            Value::String(self.download_url(origin, &outcome.output.name)),
        );
        body.insert("filename".into(), Value::String(outcome.filename.clone()));
        body.insert("size".into(), Value::from(outcome.output.size));
        if let Some(note) = &outcome.note {
            body.insert("note".into(), Value::String(note.clone()));
        }
        for (key, value) in &outcome.extras {
            body.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(body)
    }
}
