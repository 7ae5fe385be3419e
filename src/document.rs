//! Source document model.
//!
//! Wraps a loaded [`lopdf::Document`] together with the page geometry the
//! pipeline needs (MediaBox, rotation), and provides the object-resolution
//! helpers the content interpreter and font loader share.

use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

/// Maximum number of indirect references followed when resolving an object.
const MAX_RESOLVE_DEPTH: usize = 32;

/// Maximum depth of the page tree walked for inherited attributes.
const MAX_INHERIT_DEPTH: usize = 64;

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: Rect = Rect {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Geometry of a single page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    /// Zero-based page index
    pub index: usize,
    /// Page object id
    pub id: ObjectId,
    /// MediaBox in PDF user space (y up)
    pub media_box: Rect,
    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i64,
}

impl PageInfo {
    /// Page width in points.
    pub fn width(&self) -> f32 {
        self.media_box.width()
    }

    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.media_box.height()
    }

    /// Convert a user-space point to top-left page coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_retext::document::PageInfo;
    /// use pdf_retext::geometry::Rect;
    ///
    /// let page = PageInfo {
    ///     index: 0,
    ///     id: (1, 0),
    ///     media_box: Rect::new(0.0, 0.0, 612.0, 792.0),
    ///     rotation: 0,
    /// };
    /// let p = page.user_to_page(72.0, 720.0);
    /// assert_eq!((p.x, p.y), (72.0, 72.0));
    /// ```
    pub fn user_to_page(&self, x: f32, y: f32) -> Point {
        Point::new(x - self.media_box.x0, self.media_box.y1 - y)
    }
}

/// A read-only input PDF.
pub struct SourceDocument {
    doc: Document,
    pages: Vec<PageInfo>,
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("version", &self.doc.version)
            .field("pages", &self.pages.len())
            .finish_non_exhaustive()
    }
}

impl SourceDocument {
    /// Open a PDF from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pdf_retext::SourceDocument;
    ///
    /// let doc = SourceDocument::open("handout.pdf")?;
    /// println!("{} pages", doc.page_count());
    /// # Ok::<(), pdf_retext::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Opening {}", path.display());
        let doc = Document::load(path)?;
        Self::from_document(doc)
    }

    /// Load a PDF from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Self::from_document(doc)
    }

    /// Wrap an already-loaded document.
    pub fn from_document(doc: Document) -> Result<Self> {
        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(Error::InvalidPdf("document has no pages".to_string()));
        }

        let pages = page_ids
            .values()
            .enumerate()
            .map(|(index, &id)| read_page_info(&doc, index, id))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Loaded document with {} pages", pages.len());
        Ok(Self { doc, pages })
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Geometry of every page, in document order.
    pub fn pages(&self) -> &[PageInfo] {
        &self.pages
    }

    /// Geometry of one page.
    pub fn page(&self, index: usize) -> Option<&PageInfo> {
        self.pages.get(index)
    }

    /// The underlying object model.
    pub fn inner(&self) -> &Document {
        &self.doc
    }

    /// The page dictionary for a page.
    pub fn page_dict(&self, page: &PageInfo) -> Result<&Dictionary> {
        match self.doc.get_object(page.id)? {
            Object::Dictionary(dict) => Ok(dict),
            _ => Err(Error::InvalidPdf(format!(
                "page {} is not a dictionary",
                page.index
            ))),
        }
    }

    /// The page's concatenated content stream, decompressed.
    ///
    /// A page with no `/Contents` yields an empty buffer.
    pub fn page_content(&self, page: &PageInfo) -> Result<Vec<u8>> {
        let dict = self.page_dict(page)?;
        let Some(contents) = dict_get(&self.doc, dict, b"Contents") else {
            return Ok(Vec::new());
        };
        match contents {
            Object::Stream(_) | Object::Array(_) => {
                Ok(self.doc.get_page_content(page.id).map_err(|e| Error::Content {
                    page: page.index,
                    reason: e.to_string(),
                })?)
            },
            _ => Ok(Vec::new()),
        }
    }

    /// The page's resource dictionary, honoring inheritance.
    pub fn page_resources(&self, page: &PageInfo) -> Option<&Dictionary> {
        let dict = self.page_dict(page).ok()?;
        match inherited_attr(&self.doc, dict, b"Resources")? {
            Object::Dictionary(res) => Some(res),
            _ => None,
        }
    }
}

fn read_page_info(doc: &Document, index: usize, id: ObjectId) -> Result<PageInfo> {
    let dict = match doc.get_object(id)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(Error::InvalidPdf(format!("page {} is not a dictionary", index))),
    };

    let media_box = inherited_attr(doc, dict, b"MediaBox")
        .and_then(|obj| rect_from_array(doc, obj))
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| {
            log::warn!("Page {} has no usable MediaBox, assuming Letter", index);
            DEFAULT_MEDIA_BOX
        });

    let rotation = inherited_attr(doc, dict, b"Rotate")
        .and_then(|obj| match obj {
            Object::Integer(i) => Some(i.rem_euclid(360)),
            Object::Real(r) => Some((*r as i64).rem_euclid(360)),
            _ => None,
        })
        .unwrap_or(0);

    Ok(PageInfo {
        index,
        id,
        media_box,
        rotation,
    })
}

/// Follow indirect references until a direct object is reached.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_RESOLVE_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            _ => return Some(current),
        }
    }
    log::warn!("Reference chain too deep, giving up");
    None
}

/// Look up a dictionary key and resolve the value.
pub fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let obj = dict.get(key).ok()?;
    resolve(doc, obj)
}

/// Look up a key that resolves to a dictionary.
pub fn dict_get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    match dict_get(doc, dict, key)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// Look up a page attribute, walking up `/Parent` links when absent.
pub fn inherited_attr<'a>(
    doc: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Some(value) = dict_get(doc, node, key) {
            return Some(value);
        }
        node = match dict_get(doc, node, b"Parent")? {
            Object::Dictionary(parent) => parent,
            _ => return None,
        };
    }
    None
}

/// Raw bytes of a stream, decompressed when it carries a filter.
///
/// Returns `None` when the filter is unsupported.
pub fn stream_data(stream: &lopdf::Stream) -> Option<Vec<u8>> {
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content().ok()
    } else {
        Some(stream.content.clone())
    }
}

/// Numeric value of an object.
pub fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Name value of an object as a string.
pub fn name(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        _ => None,
    }
}

/// Read a four-number array as a normalized rectangle.
pub fn rect_from_array(doc: &Document, obj: &Object) -> Option<Rect> {
    let Object::Array(items) = resolve(doc, obj)? else {
        return None;
    };
    if items.len() != 4 {
        return None;
    }
    let mut v = [0.0f32; 4];
    for (slot, item) in v.iter_mut().zip(items) {
        *slot = number(resolve(doc, item)?)?;
    }
    Some(Rect::new(
        v[0].min(v[2]),
        v[1].min(v[3]),
        v[0].max(v[2]),
        v[1].max(v[3]),
    ))
}

/// Read a six-number array as a matrix.
pub fn matrix_from_array(doc: &Document, obj: &Object) -> Option<[f32; 6]> {
    let Object::Array(items) = resolve(doc, obj)? else {
        return None;
    };
    if items.len() != 6 {
        return None;
    }
    let mut m = [0.0f32; 6];
    for (slot, item) in m.iter_mut().zip(items) {
        *slot = number(resolve(doc, item)?)?;
    }
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn doc_with_page(page_extra: Dictionary, parent_extra: Dictionary) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        for (k, v) in page_extra.iter() {
            page.set(k.clone(), v.clone());
        }
        let page_id = doc.add_object(page);
        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        for (k, v) in parent_extra.iter() {
            pages.set(k.clone(), v.clone());
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_media_box_and_rotation_inherited() {
        let doc = doc_with_page(
            Dictionary::new(),
            dictionary! {
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
                "Rotate" => 90,
            },
        );
        let source = SourceDocument::from_document(doc).unwrap();
        assert_eq!(source.page_count(), 1);
        let page = source.page(0).unwrap();
        assert_eq!(page.media_box, Rect::new(0.0, 0.0, 300.0, 400.0));
        assert_eq!(page.rotation, 90);
    }

    #[test]
    fn test_missing_media_box_defaults_to_letter() {
        let doc = doc_with_page(Dictionary::new(), Dictionary::new());
        let source = SourceDocument::from_document(doc).unwrap();
        let page = source.page(0).unwrap();
        assert_eq!(page.width(), 612.0);
        assert_eq!(page.height(), 792.0);
        assert!(source.page_content(page).unwrap().is_empty());
    }

    #[test]
    fn test_user_to_page_with_offset_media_box() {
        let page = PageInfo {
            index: 0,
            id: (1, 0),
            media_box: Rect::new(10.0, 20.0, 210.0, 320.0),
            rotation: 0,
        };
        let p = page.user_to_page(10.0, 320.0);
        assert_eq!((p.x, p.y), (0.0, 0.0));
    }

    #[test]
    fn test_resolve_follows_references() {
        let mut doc = Document::with_version("1.5");
        let target = doc.add_object(Object::Integer(42));
        let reference = Object::Reference(target);
        assert_eq!(resolve(&doc, &reference), Some(&Object::Integer(42)));
        assert_eq!(resolve(&doc, &Object::Reference((99, 0))), None);
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(SourceDocument::from_bytes(b"not a pdf").is_err());
    }
}
