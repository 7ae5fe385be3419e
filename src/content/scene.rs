//! Display list produced by interpreting a page.
//!
//! A [`PageScene`] owns everything later stages need from a page: positioned
//! glyph runs for extraction, painted paths and placed images for region
//! detection and rasterization. Scenes hold no references into the source
//! document, so pages can be processed on worker threads.

use super::graphics_state::Matrix;
use super::operators::FillRule;
use crate::document::PageInfo;
use crate::geometry::{Point, Rect};

/// One interpreted page.
#[derive(Debug, Clone)]
pub struct PageScene {
    /// Page geometry
    pub page: PageInfo,
    /// Painted items in content order
    pub items: Vec<SceneItem>,
}

impl PageScene {
    /// An empty scene (nothing painted).
    pub fn empty(page: PageInfo) -> Self {
        Self {
            page,
            items: Vec::new(),
        }
    }

    /// Glyph runs in content order.
    pub fn glyph_runs(&self) -> impl Iterator<Item = &GlyphRun> {
        self.items.iter().filter_map(|item| match item {
            SceneItem::Text(run) => Some(run),
            _ => None,
        })
    }

    /// Whether the page shows any text at all.
    pub fn has_text(&self) -> bool {
        self.glyph_runs().next().is_some()
    }
}

/// A painted element.
#[derive(Debug, Clone)]
pub enum SceneItem {
    /// Text shown by one `Tj`/`TJ`/`'`/`"` operator
    Text(GlyphRun),
    /// A filled and/or stroked path
    Path(PaintedPath),
    /// An image XObject
    Image(PlacedImage),
}

/// One shown glyph, positioned along the run's baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Unicode text of the glyph (may be empty or several characters)
    pub text: String,
    /// Start offset along the baseline, in run space
    pub x: f32,
    /// Glyph advance without spacing, in run space
    pub width: f32,
}

/// A run of glyphs sharing one text rendering matrix.
///
/// Run space is text space scaled by font size and horizontal scaling;
/// `matrix` maps it to user space.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    /// Glyphs in show order
    pub glyphs: Vec<Glyph>,
    /// Run space to user space (text matrix × CTM)
    pub matrix: Matrix,
    /// Top of the glyph boxes in run space
    pub ascent: f32,
    /// Bottom of the glyph boxes in run space (negative)
    pub descent: f32,
    /// `/BaseFont` of the font in use
    pub font_name: String,
    /// Rendered font size in points
    pub font_size: f32,
    /// Fill color (RGB, 0-1)
    pub color: [f32; 3],
    /// Fill alpha
    pub alpha: f32,
    /// Text rendering mode (3 and 7 paint nothing)
    pub render_mode: u8,
}

impl GlyphRun {
    /// Whether the run paints anything.
    pub fn is_visible(&self) -> bool {
        !matches!(self.render_mode, 3 | 7)
    }

    /// Glyph box corners in user space.
    pub fn glyph_quad(&self, glyph: &Glyph) -> [Point; 4] {
        let x1 = glyph.x + glyph.width;
        [
            self.matrix.transform_point(glyph.x, self.descent),
            self.matrix.transform_point(x1, self.descent),
            self.matrix.transform_point(x1, self.ascent),
            self.matrix.transform_point(glyph.x, self.ascent),
        ]
    }

    /// Glyph box in top-left page coordinates.
    pub fn glyph_rect(&self, glyph: &Glyph, page: &PageInfo) -> Rect {
        let quad = self.glyph_quad(glyph);
        Rect::bounding(quad.iter().map(|p| page.user_to_page(p.x, p.y)))
            .unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0))
    }
}

/// Path construction segment in user space (before CTM).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Begin subpath
    MoveTo(f32, f32),
    /// Straight line
    LineTo(f32, f32),
    /// Cubic Bézier: two control points and end point
    CurveTo(f32, f32, f32, f32, f32, f32),
    /// Rectangle `x y w h`
    Rect(f32, f32, f32, f32),
    /// Close subpath
    Close,
}

/// A painted path.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintedPath {
    /// Construction segments
    pub segments: Vec<PathSegment>,
    /// CTM at paint time
    pub ctm: Matrix,
    /// Fill rule, when filled
    pub fill: Option<FillRule>,
    /// Whether the path is stroked
    pub stroke: bool,
    /// Fill color (RGB, 0-1)
    pub fill_color: [f32; 3],
    /// Stroke color (RGB, 0-1)
    pub stroke_color: [f32; 3],
    /// Fill alpha
    pub fill_alpha: f32,
    /// Stroke alpha
    pub stroke_alpha: f32,
    /// Line width in user space
    pub line_width: f32,
    /// Line cap style
    pub line_cap: u8,
    /// Line join style
    pub line_join: u8,
    /// Miter limit
    pub miter_limit: f32,
    /// Dash array and phase
    pub dash: (Vec<f32>, f32),
}

impl PaintedPath {
    /// Page-space rectangles when the path is made of `re` segments only.
    pub fn filled_rects(&self, page: &PageInfo) -> Vec<Rect> {
        if self.fill.is_none() {
            return Vec::new();
        }
        let mut rects = Vec::new();
        for seg in &self.segments {
            match *seg {
                PathSegment::Rect(x, y, w, h) => {
                    let corners = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
                    let points = corners.iter().map(|&(px, py)| {
                        let p = self.ctm.transform_point(px, py);
                        page.user_to_page(p.x, p.y)
                    });
                    if let Some(rect) = Rect::bounding(points) {
                        rects.push(rect);
                    }
                },
                PathSegment::Close => {},
                _ => return Vec::new(),
            }
        }
        rects
    }
}

/// An image painted with the CTM mapping the unit square onto the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    /// CTM at paint time
    pub ctm: Matrix,
    /// Image data
    pub source: ImageSource,
}

impl PlacedImage {
    /// Placement rectangle in top-left page coordinates.
    pub fn rect(&self, page: &PageInfo) -> Rect {
        let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        Rect::bounding(corners.iter().map(|&(x, y)| {
            let p = self.ctm.transform_point(x, y);
            page.user_to_page(p.x, p.y)
        }))
        .unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0))
    }
}

/// Image payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Image data that could be read from the XObject
    Encoded(EncodedImage),
    /// Image whose encoding is not supported; painted as a placeholder
    Unsupported,
}

/// Image samples as stored in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    /// Width in samples
    pub width: u32,
    /// Height in samples
    pub height: u32,
    /// Bits per component
    pub bits_per_component: u8,
    /// Color space of the samples
    pub color: ImageColor,
    /// Encoding of `data`
    pub filter: ImageFilter,
    /// Sample bytes
    pub data: Vec<u8>,
    /// Stencil mask painted with `mask_color`
    pub is_mask: bool,
    /// Fill color for stencil masks
    pub mask_color: [f32; 3],
    /// Invert sample values (`/Decode [1 0]`)
    pub inverted: bool,
}

/// Color space of image samples.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageColor {
    /// One component
    Gray,
    /// Three components
    Rgb,
    /// Four components
    Cmyk,
    /// Palette lookup
    Indexed {
        /// Components per palette entry
        base_components: usize,
        /// Palette bytes
        palette: Vec<u8>,
    },
    /// Unknown space; decoded by component count when possible
    Unknown,
}

/// Encoding of image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// Raw (already decompressed) samples
    Raw,
    /// Baseline JPEG
    Dct,
}
