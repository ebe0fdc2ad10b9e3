//! Typed, validated options for every operation.
//!
//! Multipart string fields are parsed once into the option struct of the
//! requested operation. Numbers that do not parse and values outside their
//! range are rejected as invalid input before any transform runs.

use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

use validator::{Validate, ValidationError, ValidationErrors};

use pdfdesk_convert::RasterQuality;
use pdfdesk_core::error::AppError;
use pdfdesk_core::operation::Operation;
use pdfdesk_core::result::AppResult;
use pdfdesk_document::organize::MAX_BLANK_PAGES;
use pdfdesk_document::{
    BlankPages, Color, CropMargins, NumberFormat, OrganizeOptions, PageNumberOptions, PageSelection,
    PageSize, Placement, SplitMode, WatermarkOptions,
};

/// String fields of a multipart request.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: HashMap<String, String>,
}

impl FormFields {
    /// Wrap collected fields.
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Record a field. A repeated name keeps the last value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Raw value, `None` when absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value or `default` when absent or blank.
    pub fn text_or(&self, name: &str, default: &str) -> String {
        match self.get(name) {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            _ => default.to_string(),
        }
    }

    /// Parsed number, `default` when absent or blank.
    pub fn number_or<T: FromStr>(&self, name: &str, default: T) -> AppResult<T> {
        match self.get(name).map(str::trim) {
            None | Some("") => Ok(default),
            Some(value) => value
                .parse()
                .map_err(|_| AppError::invalid_input(format!("'{name}' must be a number, got '{value}'"))),
        }
    }

    /// Parsed finite decimal, `default` when absent or blank. `NaN` and
    /// infinities are rejected.
    pub fn decimal_or(&self, name: &str, default: f32) -> AppResult<f32> {
        let value: f32 = self.number_or(name, default)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(AppError::invalid_input(format!("'{name}' must be a finite number")))
        }
    }
}

/// `all`, `odd` or `even`; anything else means all pages.
pub fn parse_selection(value: &str) -> PageSelection {
    match value.trim().to_ascii_lowercase().as_str() {
        "odd" => PageSelection::Odd,
        "even" => PageSelection::Even,
        _ => PageSelection::All,
    }
}

/// Split options.
#[derive(Debug, Clone, Validate)]
pub struct SplitOptions {
    /// `range`, `every` or `all`.
    #[validate(custom(function = "validate_split_mode"))]
    pub mode: String,
    /// 1-based range expression for `range` mode.
    pub page_range: String,
    /// Chunk size for `every` mode.
    #[validate(range(min = 1, message = "everyN must be at least 1"))]
    pub every_n: usize,
}

impl SplitOptions {
    /// The document-level split mode. An empty range splits every page.
    pub fn split_mode(&self) -> SplitMode {
        match self.mode.as_str() {
            "range" if !self.page_range.trim().is_empty() => SplitMode::Range(self.page_range.clone()),
            "every" => SplitMode::Every(self.every_n),
            _ => SplitMode::All,
        }
    }
}

fn validate_split_mode(mode: &str) -> Result<(), ValidationError> {
    match mode {
        "range" | "every" | "all" => Ok(()),
        _ => Err(invalid("splitMode", "splitMode must be one of range, every, all")),
    }
}

/// Rotate options.
#[derive(Debug, Clone, Validate)]
pub struct RotateOptions {
    /// Degrees, a multiple of 90.
    #[validate(custom(function = "validate_quarter_turn"))]
    pub rotation: i64,
    /// Pages to rotate.
    pub pages: PageSelection,
}

fn validate_quarter_turn(degrees: i64) -> Result<(), ValidationError> {
    if degrees % 90 == 0 {
        Ok(())
    } else {
        Err(invalid("rotation", "Rotation must be a multiple of 90 degrees"))
    }
}

/// Watermark form values before conversion to [`WatermarkOptions`].
#[derive(Debug, Clone, Validate)]
pub struct WatermarkForm {
    #[validate(length(min = 1, max = 200, message = "Watermark text must be 1 to 200 characters"))]
    pub text: String,
    #[validate(range(min = 0.0, max = 100.0, message = "Opacity must be between 0 and 100"))]
    pub opacity: f32,
    #[validate(range(min = 1.0, max = 400.0, message = "Font size must be between 1 and 400"))]
    pub font_size: f32,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: String,
    pub position: String,
}

impl WatermarkForm {
    /// Document-level watermark options.
    pub fn to_options(&self) -> WatermarkOptions {
        WatermarkOptions {
            text: self.text.clone(),
            opacity: self.opacity,
            font_size: self.font_size,
            color: Color::from_hex(&self.color).unwrap_or(WatermarkOptions::default().color),
            placement: Placement::parse(&self.position),
        }
    }
}

fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    match Color::from_hex(color) {
        Some(_) => Ok(()),
        None => Err(invalid("color", "Color must be a #RRGGBB hex value")),
    }
}

/// Protect options.
#[derive(Debug, Clone, Validate)]
pub struct ProtectOptions {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Unlock options.
#[derive(Debug, Clone, Validate)]
pub struct UnlockOptions {
    /// May be empty for documents with only an owner password.
    pub password: String,
}

/// Crop margins form, millimetres.
#[derive(Debug, Clone, Validate)]
pub struct CropForm {
    #[validate(range(min = 0.0, max = 2000.0, message = "Margins must be between 0 and 2000 mm"))]
    pub top: f32,
    #[validate(range(min = 0.0, max = 2000.0, message = "Margins must be between 0 and 2000 mm"))]
    pub right: f32,
    #[validate(range(min = 0.0, max = 2000.0, message = "Margins must be between 0 and 2000 mm"))]
    pub bottom: f32,
    #[validate(range(min = 0.0, max = 2000.0, message = "Margins must be between 0 and 2000 mm"))]
    pub left: f32,
}

impl CropForm {
    /// Document-level margins.
    pub fn margins(&self) -> CropMargins {
        CropMargins {
            top: self.top,
            right: self.right,
            bottom: self.bottom,
            left: self.left,
        }
    }
}

/// Page number form.
#[derive(Debug, Clone, Validate)]
pub struct PageNumberForm {
    pub position: String,
    pub format: NumberFormat,
    #[validate(range(min = 0, max = 100000, message = "startNum must be between 0 and 100000"))]
    pub start_num: i64,
}

impl PageNumberForm {
    /// Document-level options.
    pub fn to_options(&self) -> PageNumberOptions {
        PageNumberOptions {
            placement: Placement::parse(&self.position),
            format: self.format,
            start: self.start_num,
        }
    }
}

/// Organize form.
#[derive(Debug, Clone, Validate)]
pub struct OrganizeForm {
    /// `0` when the form said `none`.
    #[validate(custom(function = "validate_quarter_turn"))]
    pub rotation: i64,
    pub apply_to: PageSelection,
    pub blank_page: BlankPages,
    /// Clamped, never rejected.
    pub blank_count: usize,
}

impl OrganizeForm {
    /// Document-level options.
    pub fn to_options(&self) -> OrganizeOptions {
        OrganizeOptions {
            rotation: self.rotation,
            apply_to: self.apply_to,
            blank_pages: self.blank_page,
            blank_count: self.blank_count.clamp(1, MAX_BLANK_PAGES),
        }
    }
}

/// Sign form.
#[derive(Debug, Clone, Validate)]
pub struct SignForm {
    /// `type` or `draw`.
    pub mode: String,
    /// Text or a `data:image/...;base64,` URL.
    #[validate(length(max = 5_000_000, message = "Signature is too large"))]
    pub signature: String,
}

/// OCR options.
#[derive(Debug, Clone, Validate)]
pub struct OcrOptions {
    /// Tesseract language codes joined by `+`, e.g. `eng+deu`.
    #[validate(custom(function = "validate_language"))]
    pub language: String,
}

fn validate_language(language: &str) -> Result<(), ValidationError> {
    let valid = !language.is_empty()
        && language.len() <= 64
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+');
    if valid {
        Ok(())
    } else {
        Err(invalid("lang", "lang must be a Tesseract language code such as eng"))
    }
}

/// HTML to PDF options.
#[derive(Debug, Clone, Validate)]
pub struct HtmlOptions {
    #[validate(
        url(message = "Please provide a valid URL"),
        custom(function = "validate_web_scheme")
    )]
    pub url: String,
}

fn validate_web_scheme(url: &str) -> Result<(), ValidationError> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(invalid("url", "Only http and https URLs can be converted"))
    }
}

/// Image to PDF options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePageOptions {
    /// Page size after orientation.
    pub page_size: PageSize,
}

impl ImagePageOptions {
    fn parse(size: &str, orientation: &str) -> Self {
        let base = match size.trim().to_ascii_lowercase().as_str() {
            "a3" => PageSize::A3,
            "a5" => PageSize::A5,
            "letter" => PageSize::LETTER,
            _ => PageSize::A4,
        };
        let page_size = if orientation.trim().eq_ignore_ascii_case("landscape") {
            base.landscape()
        } else {
            base
        };
        Self { page_size }
    }
}

/// Options of one job, one variant per operation.
#[derive(Debug, Clone)]
pub enum OperationOptions {
    Merge,
    Split(SplitOptions),
    Compress,
    Rotate(RotateOptions),
    Watermark(WatermarkForm),
    Protect(ProtectOptions),
    Unlock(UnlockOptions),
    Crop(CropForm),
    PageNumbers(PageNumberForm),
    Organize(OrganizeForm),
    Repair,
    Sign(SignForm),
    Ocr(OcrOptions),
    PdfToWord,
    WordToPdf,
    PdfToExcel,
    ExcelToPdf,
    PdfToPpt,
    PptToPdf,
    HtmlToPdf(HtmlOptions),
    JpgToPdf(ImagePageOptions),
    PdfToJpg(RasterQuality),
}

impl OperationOptions {
    /// Parse and validate the fields of an `operation` request. Field names
    /// and defaults follow the web client's form.
    pub fn parse(operation: Operation, fields: &FormFields) -> AppResult<Self> {
        let options = match operation {
            Operation::Merge => Self::Merge,
            Operation::Split => Self::Split(validated(SplitOptions {
                mode: fields.text_or("splitMode", "all").to_ascii_lowercase(),
                page_range: fields.get("pageRange").unwrap_or_default().to_string(),
                every_n: fields.number_or("everyN", 1)?,
            })?),
            Operation::Compress => Self::Compress,
            Operation::Rotate => Self::Rotate(validated(RotateOptions {
                rotation: fields.number_or("rotation", 90)?,
                pages: parse_selection(&fields.text_or("pages", "all")),
            })?),
            Operation::Watermark => Self::Watermark(validated(WatermarkForm {
                text: fields.text_or("text", "CONFIDENTIAL"),
                opacity: fields.decimal_or("opacity", 30.0)?,
                font_size: fields.decimal_or("fontSize", 48.0)?,
                color: fields.text_or("color", "#E8302A"),
                position: fields.text_or("position", "center"),
            })?),
            Operation::Protect => Self::Protect(validated(ProtectOptions {
                password: fields.get("password").unwrap_or_default().to_string(),
            })?),
            Operation::Unlock => Self::Unlock(UnlockOptions {
                password: fields.get("password").unwrap_or_default().to_string(),
            }),
            Operation::Crop => Self::Crop(validated(CropForm {
                top: fields.decimal_or("top", 0.0)?,
                right: fields.decimal_or("right", 0.0)?,
                bottom: fields.decimal_or("bottom", 0.0)?,
                left: fields.decimal_or("left", 0.0)?,
            })?),
            Operation::PageNumbers => Self::PageNumbers(validated(PageNumberForm {
                position: fields.text_or("position", "bottom-center"),
                format: NumberFormat::parse(&fields.text_or("format", "1")),
                start_num: fields.number_or("startNum", 1)?,
            })?),
            Operation::Organize => {
                let rotation = match fields.text_or("rotation", "none").trim() {
                    "none" => 0,
                    _ => fields.number_or("rotation", 0)?,
                };
                Self::Organize(validated(OrganizeForm {
                    rotation,
                    apply_to: parse_selection(&fields.text_or("applyTo", "all")),
                    blank_page: BlankPages::parse(&fields.text_or("blankPage", "none")),
                    blank_count: fields.number_or("blankCount", 1)?,
                })?)
            }
            Operation::Repair => Self::Repair,
            Operation::Sign => Self::Sign(validated(SignForm {
                mode: fields.text_or("signMode", "type"),
                signature: fields.text_or("signature", "Signature"),
            })?),
            Operation::Ocr => Self::Ocr(validated(OcrOptions {
                language: fields.text_or("lang", "eng"),
            })?),
            Operation::PdfToWord => Self::PdfToWord,
            Operation::WordToPdf => Self::WordToPdf,
            Operation::PdfToExcel => Self::PdfToExcel,
            Operation::ExcelToPdf => Self::ExcelToPdf,
            Operation::PdfToPpt => Self::PdfToPpt,
            Operation::PptToPdf => Self::PptToPdf,
            Operation::HtmlToPdf => {
                let url = fields.get("url").map(str::trim).unwrap_or_default();
                if url.is_empty() {
                    return Err(AppError::invalid_input("Please provide a URL"));
                }
                Self::HtmlToPdf(validated(HtmlOptions {
                    url: url.to_string(),
                })?)
            }
            Operation::JpgToPdf => Self::JpgToPdf(ImagePageOptions::parse(
                &fields.text_or("pageSize", "A4"),
                &fields.text_or("orientation", "portrait"),
            )),
            Operation::PdfToJpg => Self::PdfToJpg(RasterQuality::parse(&fields.text_or("quality", "high"))),
        };
        Ok(options)
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Run the derived validation and turn the first failure into an
/// `InvalidInput` error.
fn validated<T: Validate>(options: T) -> AppResult<T> {
    options
        .validate()
        .map_err(|errors| AppError::invalid_input(first_message(&errors)))?;
    Ok(options)
}

fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid options".to_string())
}
