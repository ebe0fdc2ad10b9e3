//! Standard 14 font metrics and WinAnsi text encoding.

use lopdf::{Dictionary, dictionary};

/// Glyph widths for codes 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const TIMES_ITALIC_WIDTHS: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278, //
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500, //
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722, //
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500, //
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500, //
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

/// The standard fonts stamps are drawn with. None of them need embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesItalic,
}

struct Metrics {
    widths: &'static [u16; 95],
    fallback_width: u16,
    ascender: i16,
    descender: i16,
}

impl StandardFont {
    /// PostScript name used as `/BaseFont`.
    pub fn base_font(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesItalic => "Times-Italic",
        }
    }

    fn metrics(&self) -> Metrics {
        match self {
            Self::Helvetica => Metrics {
                widths: &HELVETICA_WIDTHS,
                fallback_width: 556,
                ascender: 718,
                descender: -207,
            },
            Self::HelveticaBold => Metrics {
                widths: &HELVETICA_BOLD_WIDTHS,
                fallback_width: 556,
                ascender: 718,
                descender: -207,
            },
            Self::TimesItalic => Metrics {
                widths: &TIMES_ITALIC_WIDTHS,
                fallback_width: 500,
                ascender: 683,
                descender: -205,
            },
        }
    }

    /// Advance width of `text` at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let metrics = self.metrics();
        let units: u32 = encode_win_ansi(text)
            .iter()
            .map(|&code| match code {
                32..=126 => metrics.widths[usize::from(code - 32)],
                _ => metrics.fallback_width,
            })
            .map(u32::from)
            .sum();
        units as f32 * size / 1000.0
    }

    /// Line height (ascender to descender) at `size` points.
    pub fn height_at(&self, size: f32) -> f32 {
        let metrics = self.metrics();
        f32::from(metrics.ascender - metrics.descender) * size / 1000.0
    }

    /// A simple font dictionary for this face.
    pub(crate) fn dictionary(&self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        }
    }
}

/// Encode text as WinAnsi bytes. Characters outside the code page become
/// `?` and control characters become spaces.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            c if c.is_control() => b' ',
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_digit_width() {
        // Every digit is 556 units wide.
        let width = StandardFont::Helvetica.text_width("10", 11.0);
        assert!((width - 2.0 * 556.0 * 11.0 / 1000.0).abs() < 1e-4);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "CONFIDENTIAL";
        assert!(
            StandardFont::HelveticaBold.text_width(text, 48.0)
                > StandardFont::Helvetica.text_width(text, 48.0)
        );
    }

    #[test]
    fn test_height_scales_with_size() {
        let h = StandardFont::HelveticaBold.height_at(48.0);
        assert!((h - 0.925 * 48.0).abs() < 1e-3);
        assert!(StandardFont::TimesItalic.height_at(24.0) < StandardFont::Helvetica.height_at(24.0));
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Page 1"), b"Page 1".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("a—b"), vec![b'a', 0x97, b'b']);
        assert_eq!(encode_win_ansi("日\n"), vec![b'?', b' ']);
    }
}
