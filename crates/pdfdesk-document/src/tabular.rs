//! CSV export of PDF text.

use crate::error::DocumentResult;
use crate::pages;
use crate::text::text_lines;

/// Most rows carried over from a PDF.
pub const MAX_CSV_ROWS: usize = 200;

/// One single-column CSV row per text line. Commas become spaces so every
/// line stays in one cell.
pub fn pdf_to_csv(source: &[u8], file_name: &str) -> DocumentResult<Vec<u8>> {
    let lines = text_lines(source, MAX_CSV_ROWS)?;

    let rows: Vec<String> = if lines.is_empty() {
        vec![
            "Filename,Pages".to_string(),
            format!("{},{}", cell(file_name), pages::page_count(source)?),
        ]
    } else {
        lines.iter().map(|line| cell(line)).collect()
    };

    Ok(rows.join("\n").into_bytes())
}

fn cell(value: &str) -> String {
    value.replace(',', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::text_pdf;
    use crate::pages::{PageSize, blank_document};

    #[test]
    fn test_commas_do_not_split_cells() {
        let pdf = text_pdf(&["Total, net".to_string()]).unwrap();
        let csv = String::from_utf8(pdf_to_csv(&pdf, "report.pdf").unwrap()).unwrap();
        assert!(!csv.contains(','), "{csv}");
        assert!(csv.contains("Total  net"), "{csv}");
    }

    #[test]
    fn test_textless_pdf_gets_summary_rows() {
        let pdf = blank_document(&[PageSize::A4; 3]).unwrap();
        let csv = String::from_utf8(pdf_to_csv(&pdf, "scan, final.pdf").unwrap()).unwrap();
        assert_eq!(csv, "Filename,Pages\nscan  final.pdf,3");
    }
}
