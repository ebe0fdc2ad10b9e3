//! Concatenate PDFs.

use lopdf::ObjectId;

use crate::error::{DocumentError, DocumentResult};
use crate::pages::{self, flatten_inherited, new_document, page_ids, rebuild_page_tree};

/// Merge `sources` into one document: all pages of the first source, then
/// all pages of the second, and so on.
pub fn merge<S: AsRef<[u8]>>(sources: &[S]) -> DocumentResult<Vec<u8>> {
    if sources.is_empty() {
        return Err(DocumentError::InvalidOption("Nothing to merge".to_string()));
    }

    let mut merged = new_document();
    let mut next_id = merged.max_id + 1;
    let mut order: Vec<ObjectId> = Vec::new();

    for source in sources {
        let mut doc = pages::load(source.as_ref())?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        // Each page must stand on its own once its old parent is gone.
        let ids = page_ids(&doc);
        for &page_id in &ids {
            flatten_inherited(&mut doc, page_id)?;
        }
        order.extend(ids);
        merged.objects.extend(doc.objects);
    }

    merged.max_id = next_id - 1;
    tracing::debug!(sources = sources.len(), pages = order.len(), "Merging PDFs");

    rebuild_page_tree(&mut merged, &order)?;
    pages::save(&mut merged)
}
