//! Page-level edits: rotation, cropping and blank page insertion.

use lopdf::Object;

use crate::error::{DocumentError, DocumentResult};
use crate::pages::{
    self, PageSelection, media_box, new_blank_page, page_dict_mut, page_ids, page_size, real,
    rebuild_page_tree, rotation,
};

/// Points per millimetre.
pub const POINTS_PER_MM: f32 = 2.83465;

/// Largest number of blank pages inserted at one end.
pub const MAX_BLANK_PAGES: usize = 10;

/// Add `angle` degrees to the rotation of the selected pages.
pub fn rotate(source: &[u8], angle: i64, selection: PageSelection) -> DocumentResult<Vec<u8>> {
    let mut doc = pages::load(source)?;
    rotate_pages(&mut doc, angle, selection)?;
    pages::save(&mut doc)
}

fn rotate_pages(doc: &mut lopdf::Document, angle: i64, selection: PageSelection) -> DocumentResult<()> {
    if angle % 90 != 0 {
        return Err(DocumentError::InvalidOption(format!(
            "Rotation must be a multiple of 90 degrees, got {angle}"
        )));
    }

    let angle = angle.rem_euclid(360);
    for (index, page_id) in page_ids(doc).into_iter().enumerate() {
        if !selection.includes(index) {
            continue;
        }
        let rotated = (rotation(doc, page_id) + angle) % 360;
        page_dict_mut(doc, page_id)?.set("Rotate", rotated);
    }
    Ok(())
}

/// Crop margins in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CropMargins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// Trim the margins off every page by setting a CropBox inside the MediaBox.
pub fn crop(source: &[u8], margins: CropMargins) -> DocumentResult<Vec<u8>> {
    let CropMargins {
        top,
        right,
        bottom,
        left,
    } = margins;
    if [top, right, bottom, left].iter().any(|m| *m < 0.0 || !m.is_finite()) {
        return Err(DocumentError::InvalidOption(
            "Crop margins must be non-negative".to_string(),
        ));
    }

    let mut doc = pages::load(source)?;
    for (index, page_id) in page_ids(&doc).into_iter().enumerate() {
        let [x0, y0, x1, y1] = media_box(&doc, page_id);
        let crop_box = [
            x0 + left * POINTS_PER_MM,
            y0 + bottom * POINTS_PER_MM,
            x1 - right * POINTS_PER_MM,
            y1 - top * POINTS_PER_MM,
        ];
        if crop_box[2] <= crop_box[0] || crop_box[3] <= crop_box[1] {
            return Err(DocumentError::InvalidOption(format!(
                "Crop margins are larger than page {}",
                index + 1
            )));
        }

        let values: Vec<Object> = crop_box.into_iter().map(real).collect();
        page_dict_mut(&mut doc, page_id)?.set("CropBox", values);
    }

    pages::save(&mut doc)
}

/// Where blank pages are inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlankPages {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl BlankPages {
    /// Parse `none`, `start`, `end` or `both`. Unknown values mean none.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "end" => Self::End,
            "both" => Self::Both,
            _ => Self::None,
        }
    }
}

/// Combined organize options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrganizeOptions {
    /// Degrees to add, `0` for none.
    pub rotation: i64,
    pub apply_to: PageSelection,
    pub blank_pages: BlankPages,
    /// Pages per insertion point; clamped to `1..=MAX_BLANK_PAGES`.
    pub blank_count: usize,
}

/// Rotate selected pages, then insert blank pages sized like the first page.
pub fn organize(source: &[u8], options: &OrganizeOptions) -> DocumentResult<Vec<u8>> {
    let mut doc = pages::load(source)?;

    if options.rotation != 0 {
        rotate_pages(&mut doc, options.rotation, options.apply_to)?;
    }

    if options.blank_pages != BlankPages::None {
        let mut order = page_ids(&doc);
        let size = page_size(&doc, order[0]);
        let count = options.blank_count.clamp(1, MAX_BLANK_PAGES);

        if matches!(options.blank_pages, BlankPages::Start | BlankPages::Both) {
            let blanks: Vec<_> = (0..count).map(|_| new_blank_page(&mut doc, size)).collect();
            order.splice(0..0, blanks);
        }
        if matches!(options.blank_pages, BlankPages::End | BlankPages::Both) {
            for _ in 0..count {
                let blank = new_blank_page(&mut doc, size);
                order.push(blank);
            }
        }
        rebuild_page_tree(&mut doc, &order)?;
    }

    pages::save(&mut doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{PageSize, blank_document, page_count, page_sizes};
    use lopdf::Document;

    fn rotations(bytes: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(bytes).unwrap();
        page_ids(&doc).into_iter().map(|id| rotation(&doc, id)).collect()
    }

    #[test]
    fn test_rotate_even_pages() {
        let source = blank_document(&[PageSize::A4; 4]).unwrap();
        let out = rotate(&source, 90, PageSelection::Even).unwrap();
        assert_eq!(rotations(&out), vec![0, 90, 0, 90]);
    }

    #[test]
    fn test_rotation_accumulates_modulo_360() {
        let source = blank_document(&[PageSize::A4]).unwrap();
        let once = rotate(&source, 270, PageSelection::All).unwrap();
        let twice = rotate(&once, 180, PageSelection::All).unwrap();
        assert_eq!(rotations(&twice), vec![90]);
        let back = rotate(&twice, -90, PageSelection::All).unwrap();
        assert_eq!(rotations(&back), vec![0]);
    }

    #[test]
    fn test_rotate_rejects_odd_angles() {
        let source = blank_document(&[PageSize::A4]).unwrap();
        assert!(rotate(&source, 45, PageSelection::All).is_err());
    }

    #[test]
    fn test_rotate_huge_angle_wraps_without_overflow() {
        let source = blank_document(&[PageSize::A4]).unwrap();
        let turned = rotate(&source, 90, PageSelection::All).unwrap();
        // A multiple of 360 near i64::MAX.
        let out = rotate(&turned, 9_223_372_036_854_775_800, PageSelection::All).unwrap();
        assert_eq!(rotations(&out), vec![90]);
        let out = rotate(&turned, -9_223_372_036_854_775_800, PageSelection::All).unwrap();
        assert_eq!(rotations(&out), vec![90]);
    }

    #[test]
    fn test_crop_sets_crop_box_in_points() {
        let source = blank_document(&[PageSize::A4]).unwrap();
        let margins = CropMargins {
            top: 10.0,
            right: 0.0,
            bottom: 10.0,
            left: 20.0,
        };
        let out = crop(&source, margins).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let page = page_ids(&doc)[0];
        let values: Vec<f32> = doc
            .get_dictionary(page)
            .unwrap()
            .get(b"CropBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .filter_map(pages::number)
            .collect();
        let expected = [20.0 * POINTS_PER_MM, 10.0 * POINTS_PER_MM, 595.0, 842.0 - 10.0 * POINTS_PER_MM];
        for (got, want) in values.iter().zip(expected) {
            assert!((got - want).abs() < 0.01, "{got} vs {want}");
        }
        // MediaBox is untouched.
        assert_eq!(page_sizes(&out).unwrap(), vec![PageSize::A4]);
    }

    #[test]
    fn test_crop_rejects_oversized_margins() {
        let source = blank_document(&[PageSize::A5]).unwrap();
        let margins = CropMargins {
            left: 100.0,
            right: 100.0,
            ..CropMargins::default()
        };
        assert!(matches!(crop(&source, margins), Err(DocumentError::InvalidOption(_))));
    }

    #[test]
    fn test_organize_inserts_blank_pages_at_both_ends() {
        let source = blank_document(&[PageSize::A5, PageSize::A4]).unwrap();
        let options = OrganizeOptions {
            blank_pages: BlankPages::Both,
            blank_count: 2,
            ..OrganizeOptions::default()
        };
        let out = organize(&source, &options).unwrap();
        assert_eq!(
            page_sizes(&out).unwrap(),
            vec![
                PageSize::A5,
                PageSize::A5,
                PageSize::A5,
                PageSize::A4,
                PageSize::A5,
                PageSize::A5
            ]
        );
    }

    #[test]
    fn test_organize_clamps_blank_count() {
        let source = blank_document(&[PageSize::A4]).unwrap();
        let options = OrganizeOptions {
            blank_pages: BlankPages::End,
            blank_count: 50,
            ..OrganizeOptions::default()
        };
        assert_eq!(page_count(&organize(&source, &options).unwrap()).unwrap(), 1 + MAX_BLANK_PAGES);

        let zero = OrganizeOptions {
            blank_count: 0,
            ..options
        };
        assert_eq!(page_count(&organize(&source, &zero).unwrap()).unwrap(), 2);
    }

    #[test]
    fn test_organize_rotation_and_parity() {
        let source = blank_document(&[PageSize::A4; 3]).unwrap();
        let options = OrganizeOptions {
            rotation: 180,
            apply_to: PageSelection::Odd,
            ..OrganizeOptions::default()
        };
        assert_eq!(rotations(&organize(&source, &options).unwrap()), vec![180, 0, 180]);
    }
}
