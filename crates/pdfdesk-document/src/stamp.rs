//! Text and image stamps: watermarks, page numbers and signatures.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::canvas::{
    TextRun, add_font, add_opacity_state, add_resource, append_content, image_operations,
    resource_name, text_operations,
};
use crate::error::{DocumentError, DocumentResult};
use crate::fonts::StandardFont;
use crate::images::embed_image;
use crate::pages::{self, page_ids, page_size};

pub use crate::canvas::Color;

/// Distance kept from the page edge by edge-aligned stamps.
const EDGE_MARGIN: f32 = 20.0;

/// Where on the page a stamp goes. Parsed from strings such as
/// `"center"`, `"top-left"` or `"bottom-center"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl Placement {
    /// Parse a position keyword. Unknown words are ignored, so anything
    /// without `top`/`bottom`/`left`/`right` means centred.
    pub fn parse(position: &str) -> Self {
        let position = position.to_ascii_lowercase();
        Self {
            top: position.contains("top"),
            bottom: position.contains("bottom"),
            left: position.contains("left"),
            right: position.contains("right"),
        }
    }

    /// Centred on both axes.
    pub fn is_center(&self) -> bool {
        *self == Self::default()
    }
}

/// Diagonal text over every page.
#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    pub text: String,
    /// Percent, `0..=100`.
    pub opacity: f32,
    pub font_size: f32,
    pub color: Color,
    pub placement: Placement,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: "CONFIDENTIAL".to_string(),
            opacity: 30.0,
            font_size: 48.0,
            color: Color::rgb(232.0 / 255.0, 48.0 / 255.0, 42.0 / 255.0),
            placement: Placement::default(),
        }
    }
}

/// Stamp a watermark on every page.
///
/// Centred watermarks are drawn at 45 degrees; edge-aligned ones are
/// horizontal.
pub fn watermark(source: &[u8], options: &WatermarkOptions) -> DocumentResult<Vec<u8>> {
    if !(options.font_size.is_finite() && options.font_size > 0.0) {
        return Err(DocumentError::InvalidOption(
            "Font size must be positive".to_string(),
        ));
    }
    if !options.opacity.is_finite() {
        return Err(DocumentError::InvalidOption(
            "Opacity must be a number".to_string(),
        ));
    }

    let mut doc = pages::load(source)?;
    let font = StandardFont::HelveticaBold;
    let font_id = add_font(&mut doc, font);
    let state_id = add_opacity_state(&mut doc, options.opacity.clamp(0.0, 100.0) / 100.0);
    let font_name = resource_name("F");
    let state_name = resource_name("GS");

    let text_width = font.text_width(&options.text, options.font_size);
    let text_height = font.height_at(options.font_size);
    let placement = options.placement;
    let angle = if placement.is_center() { 45.0 } else { 0.0 };

    for page_id in page_ids(&doc) {
        let size = page_size(&doc, page_id);

        let mut x = size.width / 2.0 - text_width / 2.0;
        let mut y = size.height / 2.0 - text_height / 2.0;
        if placement.left {
            x = EDGE_MARGIN;
        }
        if placement.right {
            x = size.width - text_width - EDGE_MARGIN;
        }
        if placement.top {
            y = size.height - text_height - EDGE_MARGIN;
        }
        if placement.bottom {
            y = EDGE_MARGIN;
        }

        add_resource(&mut doc, page_id, b"Font", &font_name, font_id)?;
        add_resource(&mut doc, page_id, b"ExtGState", &state_name, state_id)?;
        let run = TextRun {
            text: &options.text,
            font: &font_name,
            size: options.font_size,
            color: options.color,
            x,
            y,
            angle,
            state: Some(&state_name),
        };
        append_content(&mut doc, page_id, text_operations(&run))?;
    }

    pages::save(&mut doc)
}

/// Label style for page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberFormat {
    /// `7`
    #[default]
    Plain,
    /// `Page 7`
    Labelled,
    /// `7/10`
    OfTotal,
}

impl NumberFormat {
    /// Parse `"1"`, `"Page 1"` or `"1/10"`. Anything else is plain.
    pub fn parse(format: &str) -> Self {
        match format.trim() {
            "Page 1" => Self::Labelled,
            "1/10" => Self::OfTotal,
            _ => Self::Plain,
        }
    }

    /// Render the label for page `number` of `total`.
    pub fn label(&self, number: i64, total: usize) -> String {
        match self {
            Self::Plain => number.to_string(),
            Self::Labelled => format!("Page {number}"),
            Self::OfTotal => format!("{number}/{total}"),
        }
    }
}

/// Page number stamping options.
#[derive(Debug, Clone)]
pub struct PageNumberOptions {
    pub placement: Placement,
    pub format: NumberFormat,
    /// Number given to the first page.
    pub start: i64,
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        Self {
            placement: Placement::parse("bottom-center"),
            format: NumberFormat::Plain,
            start: 1,
        }
    }
}

const PAGE_NUMBER_SIZE: f32 = 11.0;
const PAGE_NUMBER_GRAY: f32 = 0.3;

/// Number every page.
pub fn page_numbers(source: &[u8], options: &PageNumberOptions) -> DocumentResult<Vec<u8>> {
    let mut doc = pages::load(source)?;
    let font = StandardFont::Helvetica;
    let font_id = add_font(&mut doc, font);
    let font_name = resource_name("F");
    let ids = page_ids(&doc);
    let total = ids.len();

    for (index, page_id) in ids.into_iter().enumerate() {
        let size = page_size(&doc, page_id);
        let label = options.format.label(options.start + index as i64, total);
        let text_width = font.text_width(&label, PAGE_NUMBER_SIZE);

        let mut x = size.width / 2.0 - text_width / 2.0;
        let mut y = EDGE_MARGIN;
        if options.placement.top {
            y = size.height - 30.0;
        }
        if options.placement.left {
            x = EDGE_MARGIN;
        }
        if options.placement.right {
            x = size.width - text_width - EDGE_MARGIN;
        }

        add_resource(&mut doc, page_id, b"Font", &font_name, font_id)?;
        let run = TextRun {
            text: &label,
            font: &font_name,
            size: PAGE_NUMBER_SIZE,
            color: Color::rgb(PAGE_NUMBER_GRAY, PAGE_NUMBER_GRAY, PAGE_NUMBER_GRAY),
            x,
            y,
            angle: 0.0,
            state: None,
        };
        append_content(&mut doc, page_id, text_operations(&run))?;
    }

    pages::save(&mut doc)
}

/// A signature to place on the last page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    /// Typed name, drawn in italics.
    Typed(String),
    /// A drawn signature image (PNG or JPEG bytes).
    Drawn(Vec<u8>),
}

impl Signature {
    /// Build a signature from form values. `draw` mode with a
    /// `data:image/...;base64,` URL yields an image; everything else is typed
    /// text, with `Signed` standing in for an empty value.
    pub fn from_form(mode: &str, value: &str) -> DocumentResult<Self> {
        if mode == "draw" && value.starts_with("data:image") {
            let payload = value
                .split_once(";base64,")
                .map(|(_, data)| data)
                .ok_or_else(|| {
                    DocumentError::InvalidOption("Signature image must be base64 encoded".to_string())
                })?;
            let bytes = STANDARD.decode(payload.trim()).map_err(|e| {
                DocumentError::InvalidOption(format!("Signature image is not valid base64: {e}"))
            })?;
            return Ok(Self::Drawn(bytes));
        }

        let text = value.trim();
        Ok(Self::Typed(if text.is_empty() {
            "Signed".to_string()
        } else {
            text.to_string()
        }))
    }
}

const SIGNATURE_ORIGIN: (f32, f32) = (40.0, 40.0);
const SIGNATURE_IMAGE_SIZE: (f32, f32) = (150.0, 50.0);
const SIGNATURE_FONT_SIZE: f32 = 24.0;
const SIGNATURE_INK: Color = Color::rgb(0.1, 0.1, 0.6);

/// Place a signature near the bottom-left corner of the last page.
pub fn sign(source: &[u8], signature: &Signature) -> DocumentResult<Vec<u8>> {
    let mut doc = pages::load(source)?;
    let page_id = *page_ids(&doc).last().ok_or(DocumentError::NoPages)?;
    let (x, y) = SIGNATURE_ORIGIN;

    let operations = match signature {
        Signature::Typed(text) => {
            let font_id = add_font(&mut doc, StandardFont::TimesItalic);
            let font_name = resource_name("Sig");
            add_resource(&mut doc, page_id, b"Font", &font_name, font_id)?;
            text_operations(&TextRun {
                text,
                font: &font_name,
                size: SIGNATURE_FONT_SIZE,
                color: SIGNATURE_INK,
                x,
                y,
                angle: 0.0,
                state: None,
            })
        }
        Signature::Drawn(bytes) => {
            let image = embed_image(&mut doc, bytes)?;
            let name = resource_name("SigIm");
            add_resource(&mut doc, page_id, b"XObject", &name, image.id)?;
            let (width, height) = SIGNATURE_IMAGE_SIZE;
            image_operations(&name, x, y, width, height)
        }
    };

    append_content(&mut doc, page_id, operations)?;
    pages::save(&mut doc)
}
