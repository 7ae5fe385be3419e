//! PDF document writer.
//!
//! Assembles the produced document with [`lopdf`]. A rebuilt page carries
//! its synthesized background as a full-page image followed by the placed
//! text in standard Type1 fonts; a page with nothing replaced is copied
//! from the source document with everything it references.

use super::content_stream::ContentStreamBuilder;
use crate::document::{inherited_attr, PageInfo, SourceDocument};
use crate::error::{Error, Result};
use crate::layout::unpack_rgb;
use crate::placement::PageCanvas;
use image::RgbImage;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

/// Page attributes a copied page must carry itself once it leaves its page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Resource name of the background image on every page.
const BACKGROUND_XOBJECT: &str = "Im0";

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version (e.g., "1.7")
    pub version: String,
    /// Producer recorded in the document information
    pub producer: Option<String>,
    /// Whether to compress content streams
    pub compress: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            producer: Some("pdf_retext".to_string()),
            compress: true,
        }
    }
}

impl PdfWriterConfig {
    /// Enable or disable content stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Compress data using Flate/Deflate compression.
fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// PDF document writer.
///
/// Fonts are shared between pages and named `F1`, `F2`, ... in order of
/// first use.
pub struct PdfWriter {
    config: PdfWriterConfig,
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    fonts: BTreeMap<&'static str, (String, ObjectId)>,
    /// Source object id to output object id, for copied pages
    imported: HashMap<ObjectId, ObjectId>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    /// Create a new PDF writer with default config.
    pub fn new() -> Self {
        Self::with_config(PdfWriterConfig::default())
    }

    /// Create a PDF writer with custom config.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        let mut doc = Document::with_version(config.version.as_str());
        let pages_id = doc.new_object_id();
        Self {
            config,
            doc,
            pages_id,
            kids: Vec::new(),
            fonts: BTreeMap::new(),
            imported: HashMap::new(),
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Resource name of a standard font, creating the font object if needed.
    fn font_resource(&mut self, base_font: &'static str) -> (String, ObjectId) {
        if let Some(entry) = self.fonts.get(base_font) {
            return entry.clone();
        }
        let name = format!("F{}", self.fonts.len() + 1);
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base_font,
            "Encoding" => "WinAnsiEncoding",
        });
        self.fonts.insert(base_font, (name.clone(), id));
        (name, id)
    }

    /// Add a page of `canvas.width` x `canvas.height` points.
    ///
    /// `background` is stretched over the whole page; the canvas text is
    /// drawn on top. Canvas coordinates have a top-left origin.
    pub fn add_page(&mut self, canvas: &PageCanvas, background: &RgbImage, rotation: i64) -> Result<ObjectId> {
        let (width, height) = (canvas.width, canvas.height);
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidPdf(format!("page size {}x{}", width, height)));
        }
        let image_id = self.add_image(background)?;

        let mut content = ContentStreamBuilder::new();
        content.draw_image(BACKGROUND_XOBJECT, 0.0, 0.0, width, height);

        let mut page_fonts = Dictionary::new();
        for op in canvas.ops() {
            let (resource, font_id) = self.font_resource(op.font);
            page_fonts.set(resource.as_str(), font_id);
            let [r, g, b] = unpack_rgb(op.color);
            content
                .set_fill_color(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
                .set_font(&resource, op.size)
                .text(&op.text, op.x, height - op.baseline);
        }

        let content_id = self.add_content(content.build()?)?;
        let resources = dictionary! {
            "Font" => page_fonts,
            "XObject" => dictionary! { BACKGROUND_XOBJECT => image_id },
        };
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(width), Object::Real(height)],
            "Contents" => content_id,
            "Resources" => resources,
        };
        if rotation.rem_euclid(360) != 0 {
            page.set("Rotate", Object::Integer(rotation.rem_euclid(360)));
        }
        let page_id = self.doc.add_object(page);
        self.kids.push(page_id.into());
        Ok(page_id)
    }

    /// Copy a page of `source` unchanged.
    ///
    /// Objects shared between copied pages (fonts, images) are copied once.
    /// Inherited attributes are written onto the page itself.
    pub fn import_page(&mut self, source: &SourceDocument, info: &PageInfo) -> Result<ObjectId> {
        let doc = source.inner();
        let dict = source.page_dict(info)?;
        let page_id = match self.imported.get(&info.id) {
            Some(id) => *id,
            None => {
                let id = self.doc.new_object_id();
                self.imported.insert(info.id, id);
                id
            },
        };

        let mut page = self.import_dict(doc, dict);
        for key in INHERITABLE {
            if page.get(key).is_err() {
                if let Some(value) = inherited_attr(doc, dict, key) {
                    let value = self.import_object(doc, value);
                    page.set(key.to_vec(), value);
                }
            }
        }
        if page.get(b"Resources").is_err() {
            page.set("Resources", Dictionary::new());
        }
        page.set("Parent", self.pages_id);

        self.doc.objects.insert(page_id, Object::Dictionary(page));
        self.kids.push(page_id.into());
        log::debug!("Copied page {} from the source as {:?}", info.index, page_id);
        Ok(page_id)
    }

    /// Deep-copy a source object, renumbering references. `/Parent` links
    /// are dropped so no page tree comes along.
    fn import_object(&mut self, source: &Document, obj: &Object) -> Object {
        match obj {
            Object::Reference(id) => Object::Reference(self.import_reference(source, *id)),
            Object::Array(items) => Object::Array(items.iter().map(|o| self.import_object(source, o)).collect()),
            Object::Dictionary(dict) => Object::Dictionary(self.import_dict(source, dict)),
            Object::Stream(stream) => Object::Stream(Stream::new(self.import_dict(source, &stream.dict), stream.content.clone())),
            other => other.clone(),
        }
    }

    fn import_dict(&mut self, source: &Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            let value = self.import_object(source, value);
            copy.set(key.clone(), value);
        }
        copy
    }

    fn import_reference(&mut self, source: &Document, id: ObjectId) -> ObjectId {
        if let Some(copied) = self.imported.get(&id) {
            return *copied;
        }
        let new_id = self.doc.new_object_id();
        // registered before recursing so cycles terminate
        self.imported.insert(id, new_id);
        let object = match source.get_object(id) {
            Ok(obj) => self.import_object(source, obj),
            Err(_) => Object::Null,
        };
        self.doc.objects.insert(new_id, object);
        new_id
    }

    fn add_image(&mut self, image: &RgbImage) -> Result<ObjectId> {
        let data = compress_data(image.as_raw())?;
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(image.width() as i64),
            "Height" => Object::Integer(image.height() as i64),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => "FlateDecode",
        };
        Ok(self.doc.add_object(Stream::new(dict, data)))
    }

    fn add_content(&mut self, bytes: Vec<u8>) -> Result<ObjectId> {
        let stream = if self.config.compress {
            Stream::new(dictionary! { "Filter" => "FlateDecode" }, compress_data(&bytes)?)
        } else {
            Stream::new(Dictionary::new(), bytes)
        };
        Ok(self.doc.add_object(stream))
    }

    /// Build the complete PDF document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => Object::Integer(count),
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        if let Some(producer) = &self.config.producer {
            let info_id = self.doc.add_object(dictionary! {
                "Producer" => Object::string_literal(producer.as_str()),
            });
            self.doc.trailer.set("Info", info_id);
        }

        let mut output = Vec::new();
        self.doc.save_to(&mut output)?;
        log::debug!("Wrote PDF: {} pages, {} fonts, {} bytes", count, self.fonts.len(), output.len());
        Ok(output)
    }
}
