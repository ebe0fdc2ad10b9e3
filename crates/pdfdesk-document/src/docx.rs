//! Minimal WordprocessingML: writing text documents and reading their text.

use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::{Reader, Writer};
use zip::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::DocumentResult;
use crate::pages;
use crate::text::{summary_lines, text_lines};

/// Most lines carried over from a PDF.
pub const MAX_PDF_LINES: usize = 500;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";

type XmlResult = Result<(), quick_xml::Error>;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Build a `.docx` with a centred bold title followed by one paragraph per
/// non-blank line (12 pt Calibri).
pub fn build_docx(title: &str, lines: &[String]) -> DocumentResult<Vec<u8>> {
    let body = document_xml(title, lines)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        (DOCUMENT_PART, body.as_slice()),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content)?;
    }
    Ok(zip.finish()?.into_inner())
}

fn document_xml(title: &str, lines: &[String]) -> DocumentResult<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    writer
        .create_element("w:document")
        .with_attribute(("xmlns:w", WORD_NS))
        .write_inner_content(|w| -> XmlResult {
            w.create_element("w:body").write_inner_content(|w| -> XmlResult {
                paragraph(w, title, true)?;
                for line in lines.iter().filter(|l| !l.trim().is_empty()) {
                    paragraph(w, line, false)?;
                }
                w.create_element("w:sectPr").write_empty()?;
                Ok(())
            })?;
            Ok(())
        })?;

    Ok(writer.into_inner().into_inner())
}

fn paragraph<W: Write>(w: &mut Writer<W>, text: &str, heading: bool) -> XmlResult {
    w.create_element("w:p").write_inner_content(|w| -> XmlResult {
        w.create_element("w:pPr").write_inner_content(|w| -> XmlResult {
            if heading {
                w.create_element("w:jc").with_attribute(("w:val", "center")).write_empty()?;
            }
            let after = if heading { "300" } else { "120" };
            w.create_element("w:spacing").with_attribute(("w:after", after)).write_empty()?;
            Ok(())
        })?;
        w.create_element("w:r").write_inner_content(|w| -> XmlResult {
            w.create_element("w:rPr").write_inner_content(|w| -> XmlResult {
                if heading {
                    w.create_element("w:b").write_empty()?;
                }
                w.create_element("w:rFonts")
                    .with_attribute(("w:ascii", "Calibri"))
                    .with_attribute(("w:hAnsi", "Calibri"))
                    .write_empty()?;
                let size = if heading { "32" } else { "24" };
                w.create_element("w:sz").with_attribute(("w:val", size)).write_empty()?;
                Ok(())
            })?;
            w.create_element("w:t")
                .with_attribute(("xml:space", "preserve"))
                .write_text_content(BytesText::new(text))?;
            Ok(())
        })?;
        Ok(())
    })?;
    Ok(())
}

/// Paragraph texts of a `.docx`. Tabs and line breaks inside a paragraph
/// are kept as `\t` and `\n`.
pub fn docx_paragraphs(bytes: &[u8]) -> DocumentResult<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    reader.trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

/// A `.docx` holding the text of a PDF, titled `title`. Documents without
/// extractable text get a short summary instead.
pub fn pdf_to_docx(source: &[u8], title: &str) -> DocumentResult<Vec<u8>> {
    let mut lines = text_lines(source, MAX_PDF_LINES)?;
    if lines.is_empty() {
        lines = summary_lines(title, pages::page_count(source)?);
    }
    build_docx(title, &lines)
}

/// Whether `bytes` look like a WordprocessingML package.
pub fn is_docx(bytes: &[u8]) -> bool {
    ZipArchive::new(Cursor::new(bytes))
        .map(|archive| archive.index_for_name(DOCUMENT_PART).is_some())
        .unwrap_or(false)
}
