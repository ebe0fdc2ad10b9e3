//! Split one PDF into several.

use crate::error::DocumentResult;
use crate::pages::{self, page_ids, rebuild_page_tree};
use crate::range::{SplitMode, plan_chunks};

/// One split result.
#[derive(Debug, Clone)]
pub struct SplitPart {
    /// Zero-based source pages in this part.
    pub pages: Vec<usize>,
    /// The serialized PDF.
    pub bytes: Vec<u8>,
}

/// Split `source` according to `mode`. Parts keep source page order.
pub fn split(source: &[u8], mode: &SplitMode) -> DocumentResult<Vec<SplitPart>> {
    let doc = pages::load(source)?;
    let ids = page_ids(&doc);
    let chunks = plan_chunks(mode, ids.len())?;

    tracing::debug!(pages = ids.len(), parts = chunks.len(), "Splitting PDF");

    chunks
        .into_iter()
        .map(|chunk| {
            let mut part = doc.clone();
            let selected: Vec<_> = chunk.iter().map(|&i| ids[i]).collect();
            rebuild_page_tree(&mut part, &selected)?;
            let bytes = pages::save(&mut part)?;
            Ok(SplitPart {
                pages: chunk,
                bytes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{PageSize, blank_document, page_count, page_sizes};

    fn sized_fixture(count: usize) -> Vec<u8> {
        // Distinct widths let tests identify which source page ended up where.
        let sizes: Vec<PageSize> = (0..count)
            .map(|i| PageSize::new(100.0 + i as f32, 200.0))
            .collect();
        blank_document(&sizes).unwrap()
    }

    #[test]
    fn test_range_split_keeps_selected_pages_in_order() {
        let parts = split(&sized_fixture(6), &SplitMode::Range("2,4-5".into())).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].pages, vec![1, 3, 4]);

        let widths: Vec<f32> = page_sizes(&parts[0].bytes)
            .unwrap()
            .iter()
            .map(|s| s.width)
            .collect();
        assert_eq!(widths, vec![101.0, 103.0, 104.0]);
    }

    #[test]
    fn test_every_two_on_five_pages() {
        let parts = split(&sized_fixture(5), &SplitMode::Every(2)).unwrap();
        assert_eq!(parts.len(), 3);
        let counts: Vec<usize> = parts.iter().map(|p| page_count(&p.bytes).unwrap()).collect();
        assert_eq!(counts, vec![2, 2, 1]);
    }

    #[test]
    fn test_all_mode_one_page_per_part() {
        let parts = split(&sized_fixture(3), &SplitMode::All).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(page_sizes(&parts[2].bytes).unwrap()[0].width, 102.0);
    }
}
