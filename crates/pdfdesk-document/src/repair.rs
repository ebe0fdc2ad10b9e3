//! Re-serialization transforms: compression and repair.

use serde::Serialize;

use crate::error::{DocumentError, DocumentResult};
use crate::pages;

/// Size comparison for a compression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionReport {
    pub original_size: u64,
    pub compressed_size: u64,
}

impl CompressionReport {
    /// Percentage saved, one decimal place, e.g. `"12.3%"`. Negative when
    /// the output grew.
    pub fn reduction(&self) -> String {
        if self.original_size == 0 {
            return "0.0%".to_string();
        }
        let saved = self.original_size as f64 - self.compressed_size as f64;
        format!("{:.1}%", saved / self.original_size as f64 * 100.0)
    }
}

/// Drop unreachable objects and empty streams, deflate what is left and
/// renumber.
pub fn compress(source: &[u8]) -> DocumentResult<(Vec<u8>, CompressionReport)> {
    let mut doc = pages::load(source)?;

    let pruned = doc.prune_objects().len();
    let emptied = doc.delete_zero_length_streams().len();
    doc.compress();
    doc.renumber_objects();

    let bytes = pages::save(&mut doc)?;
    let report = CompressionReport {
        original_size: source.len() as u64,
        compressed_size: bytes.len() as u64,
    };
    tracing::debug!(
        pruned,
        emptied,
        before = report.original_size,
        after = report.compressed_size,
        "Compressed PDF"
    );
    Ok((bytes, report))
}

/// Reload tolerantly and re-save. Leading junk before `%PDF-` and trailing
/// junk after the last `%%EOF` are cut off when a plain reload fails.
pub fn repair(source: &[u8]) -> DocumentResult<Vec<u8>> {
    let mut doc = match pages::load_any(source) {
        Ok(doc) => doc,
        Err(first) => {
            let trimmed = trim_to_body(source).ok_or(DocumentError::Unrepairable)?;
            tracing::debug!(error = %first, "Retrying repair on trimmed body");
            pages::load_any(trimmed).map_err(|_| DocumentError::Unrepairable)?
        }
    };

    if pages::is_encrypted(&doc) {
        return Err(DocumentError::Encrypted);
    }
    if doc.get_pages().is_empty() {
        return Err(DocumentError::Unrepairable);
    }

    pages::save(&mut doc).map_err(|_| DocumentError::Unrepairable)
}

/// The slice from the first `%PDF-` to the end of the last `%%EOF`, if that
/// differs from the whole input.
fn trim_to_body(bytes: &[u8]) -> Option<&[u8]> {
    let start = find(bytes, b"%PDF-")?;
    let end = rfind(bytes, b"%%EOF").map_or(bytes.len(), |i| i + b"%%EOF".len());
    (end > start && (start > 0 || end < bytes.len())).then(|| &bytes[start..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
