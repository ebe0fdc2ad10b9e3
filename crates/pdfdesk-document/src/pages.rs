//! Loading, saving and page-tree surgery shared by the transforms.

use std::collections::BTreeSet;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::error::{DocumentError, DocumentResult};

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains in broken files.
const MAX_TREE_DEPTH: usize = 64;

/// Width and height of a page in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Width in points.
    pub width: f32,
    /// Height in points.
    pub height: f32,
}

impl PageSize {
    /// ISO A3.
    pub const A3: PageSize = PageSize::new(842.0, 1191.0);
    /// ISO A4.
    pub const A4: PageSize = PageSize::new(595.0, 842.0);
    /// ISO A5.
    pub const A5: PageSize = PageSize::new(420.0, 595.0);
    /// US Letter.
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);

    /// Construct a size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The same size turned on its side.
    pub fn landscape(self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// Which pages an operation applies to, by 1-based parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSelection {
    /// Every page.
    #[default]
    All,
    /// Pages 1, 3, 5, ...
    Odd,
    /// Pages 2, 4, 6, ...
    Even,
}

impl PageSelection {
    /// Whether the page at zero-based `index` is selected.
    pub fn includes(&self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Odd => index % 2 == 0,
            Self::Even => index % 2 == 1,
        }
    }
}

/// Parse a PDF, refusing encrypted or page-less documents.
pub fn load(bytes: &[u8]) -> DocumentResult<Document> {
    let doc = load_any(bytes)?;
    if is_encrypted(&doc) {
        return Err(DocumentError::Encrypted);
    }
    if doc.get_pages().is_empty() {
        return Err(DocumentError::NoPages);
    }
    Ok(doc)
}

/// Parse a PDF without any policy checks.
pub(crate) fn load_any(bytes: &[u8]) -> DocumentResult<Document> {
    Document::load_mem(bytes).map_err(DocumentError::Parse)
}

/// Serialize a document.
pub fn save(doc: &mut Document) -> DocumentResult<Vec<u8>> {
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| DocumentError::Save(e.to_string()))?;
    Ok(out)
}

/// Whether the trailer declares a security handler.
pub(crate) fn is_encrypted(doc: &Document) -> bool {
    doc.trailer.get(b"Encrypt").is_ok()
}

/// Number of pages in a PDF.
pub fn page_count(bytes: &[u8]) -> DocumentResult<usize> {
    Ok(load(bytes)?.get_pages().len())
}

/// Size of every page in a PDF, in page order.
pub fn page_sizes(bytes: &[u8]) -> DocumentResult<Vec<PageSize>> {
    let doc = load(bytes)?;
    Ok(doc
        .get_pages()
        .values()
        .map(|&id| page_size(&doc, id))
        .collect())
}

/// Page object ids in page order.
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Follow a reference once.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// Numeric value of an integer or real object.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// A real-number object.
pub(crate) fn real(value: f32) -> Object {
    Object::Real(value as _)
}

/// Look up a page attribute, walking up `/Parent` links when absent.
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// The page's MediaBox as `[x0, y0, x1, y1]`, defaulting to US Letter.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let default = [0.0, 0.0, 612.0, 792.0];
    let Some(object) = inherited(doc, page_id, b"MediaBox") else {
        return default;
    };
    let Ok(array) = resolve(doc, object).as_array() else {
        return default;
    };
    let values: Vec<f32> = array
        .iter()
        .filter_map(|v| number(resolve(doc, v)))
        .collect();
    match values.as_slice() {
        [a, b, c, d] => [a.min(*c), b.min(*d), a.max(*c), b.max(*d)],
        _ => default,
    }
}

/// Page width and height from its MediaBox.
pub(crate) fn page_size(doc: &Document, page_id: ObjectId) -> PageSize {
    let [x0, y0, x1, y1] = media_box(doc, page_id);
    PageSize::new(x1 - x0, y1 - y0)
}

/// Current `/Rotate` of a page, normalized to `0..360`.
pub(crate) fn rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited(doc, page_id, b"Rotate")
        .and_then(|o| resolve(doc, o).as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360)
}

/// Mutable page dictionary.
pub(crate) fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> DocumentResult<&mut Dictionary> {
    Ok(doc.get_object_mut(page_id)?.as_dict_mut()?)
}

/// Copy inherited attributes onto the page itself so it can be moved to
/// another parent without changing its appearance.
pub(crate) fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> DocumentResult<()> {
    let page = doc.get_dictionary(page_id)?;
    let missing: Vec<(&[u8], Object)> = INHERITABLE
        .iter()
        .filter(|key| !page.has(key))
        .filter_map(|key| inherited(doc, page_id, key).map(|value| (*key, value.clone())))
        .collect();

    let page = page_dict_mut(doc, page_id)?;
    for (key, value) in missing {
        page.set(key.to_vec(), value);
    }
    Ok(())
}

/// Object id of the document catalog.
pub(crate) fn catalog_id(doc: &Document) -> DocumentResult<ObjectId> {
    Ok(doc.trailer.get(b"Root")?.as_reference()?)
}

/// Replace the page tree with a single flat `/Pages` node holding `pages`
/// in the given order, then drop everything no longer reachable.
pub(crate) fn rebuild_page_tree(doc: &mut Document, pages: &[ObjectId]) -> DocumentResult<()> {
    let previous: BTreeSet<ObjectId> = doc.get_pages().into_values().collect();
    let subset = previous.iter().any(|id| !pages.contains(id));

    for &page_id in pages {
        flatten_inherited(doc, page_id)?;
    }

    let pages_id = doc.new_object_id();
    for &page_id in pages {
        page_dict_mut(doc, page_id)?.set("Parent", pages_id);
    }

    let kids: Vec<Object> = pages.iter().map(|&id| Object::Reference(id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );

    let root = catalog_id(doc)?;
    let catalog = doc.get_object_mut(root)?.as_dict_mut()?;
    catalog.set("Pages", pages_id);
    if subset {
        // These index into the old page list and would keep dropped pages alive.
        for key in [&b"Outlines"[..], b"PageLabels", b"StructTreeRoot", b"Dests"] {
            catalog.remove(key);
        }
    }

    doc.prune_objects();
    Ok(())
}

/// Create an empty page of `size` (not yet attached to the page tree).
pub(crate) fn new_blank_page(doc: &mut Document, size: PageSize) -> ObjectId {
    let contents = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), real(size.width), real(size.height)],
        "Resources" => Dictionary::new(),
        "Contents" => contents,
    })
}

/// A new, empty document with a catalog and no pages.
pub(crate) fn new_document() -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Build a document of blank pages. Used for fixtures and as the base of
/// composed documents.
pub fn blank_document(sizes: &[PageSize]) -> DocumentResult<Vec<u8>> {
    let mut doc = new_document();
    let pages: Vec<ObjectId> = sizes.iter().map(|&s| new_blank_page(&mut doc, s)).collect();
    rebuild_page_tree(&mut doc, &pages)?;
    save(&mut doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_document_round_trip() {
        let bytes = blank_document(&[PageSize::A4, PageSize::LETTER, PageSize::A5]).unwrap();
        assert_eq!(page_count(&bytes).unwrap(), 3);
        assert_eq!(
            page_sizes(&bytes).unwrap(),
            vec![PageSize::A4, PageSize::LETTER, PageSize::A5]
        );
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = load(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
    }

    #[test]
    fn test_page_selection_parity_is_one_based() {
        let odd: Vec<usize> = (0..5).filter(|i| PageSelection::Odd.includes(*i)).collect();
        let even: Vec<usize> = (0..5).filter(|i| PageSelection::Even.includes(*i)).collect();
        assert_eq!(odd, vec![0, 2, 4]);
        assert_eq!(even, vec![1, 3]);
        assert!((0..5).all(|i| PageSelection::All.includes(i)));
    }

    #[test]
    fn test_inherited_media_box_is_flattened() {
        let mut doc = new_document();
        let page = doc.add_object(dictionary! { "Type" => "Page" });
        rebuild_page_tree(&mut doc, &[page]).unwrap();

        let pages_id = doc.get_dictionary(page).unwrap().get(b"Parent").unwrap().as_reference().unwrap();
        doc.get_object_mut(pages_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("MediaBox", vec![0.into(), 0.into(), 200.into(), 100.into()]);

        assert_eq!(page_size(&doc, page), PageSize::new(200.0, 100.0));
        flatten_inherited(&mut doc, page).unwrap();
        assert!(doc.get_dictionary(page).unwrap().has(b"MediaBox"));
    }

    #[test]
    fn test_landscape_swaps_dimensions() {
        assert_eq!(PageSize::A4.landscape(), PageSize::new(842.0, 595.0));
    }
}
