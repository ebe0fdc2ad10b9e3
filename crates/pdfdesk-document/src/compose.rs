//! Text-only PDFs built from lines.

use crate::canvas::{Color, TextRun, add_font, add_resource, append_content, resource_name, text_operations};
use crate::docx::docx_paragraphs;
use crate::error::DocumentResult;
use crate::fonts::StandardFont;
use crate::pages::{PageSize, new_blank_page, new_document, rebuild_page_tree, save};

const MARGIN: f32 = 50.0;
const FONT_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 16.0;
/// Longer lines are cut and suffixed with `...`.
const MAX_LINE_CHARS: usize = 95;

/// Lay `lines` out top to bottom on A4 pages in 11 pt Helvetica, starting a
/// new page when the bottom margin is reached. Always yields at least one
/// page.
pub fn text_pdf(lines: &[String]) -> DocumentResult<Vec<u8>> {
    let size = PageSize::A4;
    let mut doc = new_document();
    let font_id = add_font(&mut doc, StandardFont::Helvetica);
    let font_name = resource_name("F");

    let mut pages: Vec<Vec<(String, f32)>> = vec![Vec::new()];
    let mut y = size.height - MARGIN;
    for line in lines.iter().filter(|l| !l.is_empty()) {
        if y < MARGIN {
            pages.push(Vec::new());
            y = size.height - MARGIN;
        }
        if let Some(page) = pages.last_mut() {
            page.push((truncate(line), y));
        }
        y -= LINE_HEIGHT;
    }

    let mut ids = Vec::with_capacity(pages.len());
    for placed in pages {
        let page_id = new_blank_page(&mut doc, size);
        add_resource(&mut doc, page_id, b"Font", &font_name, font_id)?;

        let operations = placed
            .iter()
            .flat_map(|(text, y)| {
                text_operations(&TextRun {
                    text,
                    font: &font_name,
                    size: FONT_SIZE,
                    color: Color::rgb(0.0, 0.0, 0.0),
                    x: MARGIN,
                    y: *y,
                    angle: 0.0,
                    state: None,
                })
            })
            .collect();
        append_content(&mut doc, page_id, operations)?;
        ids.push(page_id);
    }

    rebuild_page_tree(&mut doc, &ids)?;
    save(&mut doc)
}

/// Text-only PDF rendering of a `.docx`. Formatting, images and tables are
/// lost; each paragraph line becomes one line of output.
pub fn docx_to_pdf(docx: &[u8]) -> DocumentResult<Vec<u8>> {
    let lines: Vec<String> = docx_paragraphs(docx)?
        .iter()
        .flat_map(|p| p.split('\n'))
        .map(|line| line.replace('\t', "    "))
        .collect();
    text_pdf(&lines)
}

fn truncate(line: &str) -> String {
    if line.chars().count() > MAX_LINE_CHARS {
        let cut: String = line.chars().take(MAX_LINE_CHARS).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::build_docx;
    use crate::pages::page_count;
    use crate::text::text_lines;

    #[test]
    fn test_empty_input_still_has_a_page() {
        assert_eq!(page_count(&text_pdf(&[]).unwrap()).unwrap(), 1);
    }

    #[test]
    fn test_long_text_flows_onto_more_pages() {
        // (842 - 50 - 50) / 16 rounds up to 47 lines per page.
        let lines: Vec<String> = (0..100).map(|i| format!("Line {i}")).collect();
        assert_eq!(page_count(&text_pdf(&lines).unwrap()).unwrap(), 3);
    }

    #[test]
    fn test_truncate_long_lines() {
        let long = "x".repeat(120);
        let cut = truncate(&long);
        assert_eq!(cut.len(), MAX_LINE_CHARS + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_docx_to_pdf_keeps_paragraph_text() {
        let docx = build_docx("Title", &["Body paragraph".to_string()]).unwrap();
        let pdf = docx_to_pdf(&docx).unwrap();
        let text = text_lines(&pdf, 10).unwrap().join(" ");
        assert!(text.contains("Body paragraph"), "{text}");
    }
}
