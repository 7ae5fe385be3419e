//! Shared fixture builder for integration tests.
//!
//! Builds small PDFs in memory with lopdf: standard fonts, optional solid
//! color images, and hand-written content streams.

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};

/// A text run to show on a fixture page, in PDF user space.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub font: &'static str,
    pub size: f32,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

pub fn run(text: &str, x: f32, y: f32, size: f32) -> TextRun {
    TextRun {
        font: "F1",
        size,
        x,
        y,
        text: text.to_string(),
    }
}

/// A solid image drawn at `(x, y, width, height)` in user space.
#[derive(Debug, Clone, Copy)]
pub struct ImageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: [u8; 3],
}

#[derive(Debug, Clone)]
struct FixturePage {
    width: f32,
    height: f32,
    runs: Vec<TextRun>,
    images: Vec<ImageBox>,
    raw_content: Option<Vec<u8>>,
}

/// Builder for fixture documents.
#[derive(Debug, Default)]
pub struct PdfFixture {
    pages: Vec<FixturePage>,
}

impl PdfFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A US Letter page with text runs.
    pub fn page(self, runs: Vec<TextRun>) -> Self {
        self.sized_page(612.0, 792.0, runs, Vec::new())
    }

    /// A US Letter page with images painted before the text runs.
    pub fn page_with_images(self, runs: Vec<TextRun>, images: Vec<ImageBox>) -> Self {
        self.sized_page(612.0, 792.0, runs, images)
    }

    pub fn sized_page(mut self, width: f32, height: f32, runs: Vec<TextRun>, images: Vec<ImageBox>) -> Self {
        self.pages.push(FixturePage {
            width,
            height,
            runs,
            images,
            raw_content: None,
        });
        self
    }

    /// A page whose content stream is given verbatim.
    pub fn raw_page(mut self, content: &[u8]) -> Self {
        self.pages.push(FixturePage {
            width: 612.0,
            height: 792.0,
            runs: Vec::new(),
            images: Vec::new(),
            raw_content: Some(content.to_vec()),
        });
        self
    }

    pub fn build_document(&self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let helvetica = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let times = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids = Vec::new();
        for page in &self.pages {
            let mut xobjects = lopdf::Dictionary::new();
            let mut content = String::new();
            for (i, image) in page.images.iter().enumerate() {
                let name = format!("Im{}", i + 1);
                let pixels: Vec<u8> = image.color.iter().copied().cycle().take(2 * 2 * 3).collect();
                let stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 2,
                        "Height" => 2,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                    },
                    pixels,
                );
                xobjects.set(name.as_str(), doc.add_object(stream));
                content.push_str(&format!(
                    "q {} 0 0 {} {} {} cm /{} Do Q\n",
                    image.width, image.height, image.x, image.y, name
                ));
            }
            for run in &page.runs {
                content.push_str(&format!(
                    "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
                    run.font, run.size, run.x, run.y, run.text
                ));
            }
            let bytes = page.raw_content.clone().unwrap_or_else(|| content.into_bytes());
            let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), Object::Real(page.width), Object::Real(page.height)],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => helvetica, "F2" => times },
                    "XObject" => xobjects,
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = self.build_document();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("fixture PDF serializes");
        bytes
    }
}

/// One page showing "Hello World" at 12 pt near the top-left corner.
pub fn hello_world() -> Vec<u8> {
    PdfFixture::new().page(vec![run("Hello World", 72.0, 700.0, 12.0)]).build()
}
