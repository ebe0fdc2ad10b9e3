//! Drawing onto existing pages.
//!
//! New marks go into a fresh content stream appended after the page's own
//! streams. The original streams are wrapped in `q`/`Q` first so a graphics
//! state they leave behind (a transform, a clip) cannot displace the mark.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::error::DocumentResult;
use crate::fonts::{StandardFont, encode_win_ansi};
use crate::pages::{inherited, page_dict_mut, real, resolve};

/// Resource name prefix for everything this crate adds to a page.
const RESOURCE_PREFIX: &str = "PDFDesk";

/// Fill color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Construct from components in `0.0..=1.0`.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// A run of text to draw.
pub(crate) struct TextRun<'a> {
    pub text: &'a str,
    pub font: &'a str,
    pub size: f32,
    pub color: Color,
    pub x: f32,
    pub y: f32,
    /// Counter-clockwise rotation around `(x, y)`, in degrees.
    pub angle: f32,
    /// Name of an `ExtGState` resource to apply, if any.
    pub state: Option<&'a str>,
}

/// Resource name for a kind of resource.
pub(crate) fn resource_name(kind: &str) -> String {
    format!("{RESOURCE_PREFIX}{kind}")
}

/// Add a shared font object for `font`.
pub(crate) fn add_font(doc: &mut Document, font: StandardFont) -> ObjectId {
    doc.add_object(font.dictionary())
}

/// Add a constant-alpha graphics state.
pub(crate) fn add_opacity_state(doc: &mut Document, opacity: f32) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => real(opacity),
        "CA" => real(opacity),
    })
}

/// Register `object` under `/Resources/<category>/<name>` for one page.
///
/// Resource dictionaries are often shared between pages, so the page gets
/// its own copy instead of the shared one being edited.
pub(crate) fn add_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    object: impl Into<Object>,
) -> DocumentResult<()> {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|o| resolve(doc, o).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut entries = resources
        .get(category)
        .ok()
        .and_then(|o| resolve(doc, o).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    entries.set(name, object.into());
    resources.set(category.to_vec(), entries);
    page_dict_mut(doc, page_id)?.set("Resources", resources);
    Ok(())
}

/// Append `operations` to the page, isolated from its existing content.
pub(crate) fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> DocumentResult<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(object) => match resolve(doc, object) {
            Object::Array(items) => items.clone(),
            Object::Stream(_) => vec![object.clone()],
            _ => Vec::new(),
        },
        Err(_) => Vec::new(),
    };

    let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut body = b"Q\n".to_vec();
    body.extend(Content { operations }.encode()?);
    let stamp = doc.add_object(Stream::new(Dictionary::new(), body));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open));
    contents.extend(existing);
    contents.push(Object::Reference(stamp));

    page_dict_mut(doc, page_id)?.set("Contents", contents);
    Ok(())
}

/// Operators drawing one text run.
pub(crate) fn text_operations(run: &TextRun<'_>) -> Vec<Operation> {
    let (sin, cos) = run.angle.to_radians().sin_cos();
    let mut ops = vec![Operation::new("q", vec![])];
    if let Some(state) = run.state {
        ops.push(Operation::new("gs", vec![Object::Name(state.as_bytes().to_vec())]));
    }
    ops.extend([
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(run.font.as_bytes().to_vec()), real(run.size)],
        ),
        Operation::new(
            "rg",
            vec![real(run.color.r), real(run.color.g), real(run.color.b)],
        ),
        Operation::new(
            "Tm",
            vec![real(cos), real(sin), real(-sin), real(cos), real(run.x), real(run.y)],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(run.text), StringFormat::Hexadecimal)],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]);
    ops
}

/// Operators painting image XObject `name` into the given box.
pub(crate) fn image_operations(name: &str, x: f32, y: f32, width: f32, height: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![real(width), real(0.0), real(0.0), real(height), real(x), real(y)],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}
