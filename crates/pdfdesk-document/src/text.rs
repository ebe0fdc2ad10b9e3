//! Plain text extraction.

use crate::error::DocumentResult;
use crate::pages;

/// Text of each page, in page order. Pages whose text cannot be decoded
/// yield an empty string.
pub fn page_texts(source: &[u8]) -> DocumentResult<Vec<String>> {
    let doc = pages::load(source)?;
    let texts = doc
        .get_pages()
        .keys()
        .map(|&number| {
            doc.extract_text(&[number]).unwrap_or_else(|e| {
                tracing::warn!(page = number, error = %e, "Text extraction failed for page");
                String::new()
            })
        })
        .collect();
    Ok(texts)
}

/// Non-blank lines of the whole document, at most `limit` of them.
pub fn text_lines(source: &[u8], limit: usize) -> DocumentResult<Vec<String>> {
    Ok(page_texts(source)?
        .iter()
        .flat_map(|text| text.lines())
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .take(limit)
        .map(str::to_string)
        .collect())
}

/// Lines describing a document whose text could not be recovered.
pub(crate) fn summary_lines(file_name: &str, page_count: usize) -> Vec<String> {
    vec![
        format!("File: {file_name}"),
        format!("Pages: {page_count}"),
        String::new(),
        "No extractable text was found in this document.".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::text_pdf;
    use crate::pages::{PageSize, blank_document};

    #[test]
    fn test_blank_pages_have_no_lines() {
        let source = blank_document(&[PageSize::A4, PageSize::A4]).unwrap();
        assert_eq!(page_texts(&source).unwrap().len(), 2);
        assert!(text_lines(&source, 10).unwrap().is_empty());
    }

    #[test]
    fn test_composed_text_is_extractable() {
        let pdf = text_pdf(&["Quarterly report".to_string(), "Revenue up".to_string()]).unwrap();
        let lines = text_lines(&pdf, 10).unwrap();
        let joined = lines.join(" ");
        assert!(joined.contains("Quarterly report"), "{joined}");
        assert!(joined.contains("Revenue up"), "{joined}");
    }

    #[test]
    fn test_summary_lines() {
        let lines = summary_lines("scan.pdf", 3);
        assert_eq!(lines[0], "File: scan.pdf");
        assert_eq!(lines[1], "Pages: 3");
    }
}
