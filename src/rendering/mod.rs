//! Page rasterization.
//!
//! Interpreted pages are rasterized with the pure-Rust `tiny-skia` library.
//! The result is an opaque RGB [`Raster`] in top-left page orientation that
//! the background synthesizer edits and the writer embeds.
//!
//! ## Architecture
//!
//! 1. Interpret the content stream into a [`PageScene`](crate::content::PageScene)
//! 2. Replay the scene's paths, images and (optionally) glyph boxes onto a
//!    pixmap
//! 3. Flatten the pixmap into an RGB buffer
//!
//! Page backgrounds are rendered without text: every text run is written
//! back as real text by the placement stage. The quality diagnostics draw
//! text as glyph-sized boxes, which is enough ink for a similarity score.

mod image_decoder;
mod page_renderer;
mod path_rasterizer;
mod text_rasterizer;

pub use page_renderer::PageRenderer;

use crate::content::PageScene;
use crate::error::Result;
use crate::geometry::Rect;
use image::{imageops, Rgb, RgbImage};
use tiny_skia::{Color, Paint};

/// Options for page rasterization.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Dots per inch of page backgrounds (default: 150)
    pub dpi: u32,
    /// Pixels per point used by the quality diagnostics (default: 0.25)
    pub diagnostics_scale: f32,
    /// Paper color
    pub paper: [u8; 3],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 150,
            diagnostics_scale: 0.25,
            paper: [255, 255, 255],
        }
    }
}

impl RenderOptions {
    /// Create options with custom DPI.
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi: dpi.max(1),
            ..Default::default()
        }
    }

    /// Pixels per point of page backgrounds.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}

/// Something that turns an interpreted page into pixels.
pub trait Rasterizer: Send + Sync {
    /// Rasterize `scene` at `scale` pixels per point.
    fn rasterize(&self, scene: &PageScene, scale: f32) -> Result<Raster>;
}

/// The tiny-skia background rasterizer; text runs are left out.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkiaRasterizer;

impl Rasterizer for SkiaRasterizer {
    fn rasterize(&self, scene: &PageScene, scale: f32) -> Result<Raster> {
        PageRenderer::new().without_text().render(scene, scale)
    }
}

/// An opaque RGB page image with a known point-to-pixel scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Pixels, top row first
    pub image: RgbImage,
    /// Pixels per point
    pub scale: f32,
}

impl Raster {
    /// A raster of the given page size filled with one color.
    pub fn blank(width: f32, height: f32, scale: f32, color: [u8; 3]) -> Self {
        let (w, h) = pixel_size(width, height, scale);
        Self {
            image: RgbImage::from_pixel(w, h, Rgb(color)),
            scale,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Color at a page point, or `None` off the page.
    pub fn sample(&self, x: f32, y: f32) -> Option<[u8; 3]> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let px = (x * self.scale).floor() as u32;
        let py = (y * self.scale).floor() as u32;
        if px >= self.width() || py >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(px, py).0)
    }

    /// Pixel span `(x0, y0, x1, y1)` covered by a page rectangle, end
    /// exclusive; `None` when nothing of it is on the raster.
    pub fn pixel_bounds(&self, rect: &Rect) -> Option<(u32, u32, u32, u32)> {
        let clamp_x = |v: f32| (v * self.scale).clamp(0.0, self.width() as f32);
        let clamp_y = |v: f32| (v * self.scale).clamp(0.0, self.height() as f32);
        let x0 = clamp_x(rect.x0).floor() as u32;
        let y0 = clamp_y(rect.y0).floor() as u32;
        let x1 = clamp_x(rect.x1).ceil() as u32;
        let y1 = clamp_y(rect.y1).ceil() as u32;
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    /// Paint a page rectangle, leaving pixels inside `protected` untouched.
    ///
    /// Returns the number of pixels painted.
    pub fn fill_rect(&mut self, rect: &Rect, color: [u8; 3], protected: &[Rect]) -> usize {
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(rect) else {
            return 0;
        };
        let guards: Vec<(u32, u32, u32, u32)> = protected
            .iter()
            .filter(|p| p.intersects(rect))
            .filter_map(|p| self.pixel_bounds(p))
            .collect();
        let mut painted = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                let guarded = guards
                    .iter()
                    .any(|&(gx0, gy0, gx1, gy1)| x >= gx0 && x < gx1 && y >= gy0 && y < gy1);
                if !guarded {
                    self.image.put_pixel(x, y, Rgb(color));
                    painted += 1;
                }
            }
        }
        painted
    }

    /// Resample to another scale.
    pub fn resized(&self, scale: f32) -> Raster {
        let width = self.width() as f32 / self.scale;
        let height = self.height() as f32 / self.scale;
        let (w, h) = pixel_size(width, height, scale);
        Raster {
            image: imageops::resize(&self.image, w, h, imageops::FilterType::Triangle),
            scale,
        }
    }
}

/// Pixel dimensions of a page at `scale`, at least one pixel each way.
pub(crate) fn pixel_size(width: f32, height: f32, scale: f32) -> (u32, u32) {
    let w = (width * scale).ceil().max(1.0) as u32;
    let h = (height * scale).ceil().max(1.0) as u32;
    (w, h)
}

/// Create a Paint for a 0-1 RGB color with alpha.
pub(crate) fn create_paint(rgb: [f32; 3], alpha: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(
        Color::from_rgba(
            rgb[0].clamp(0.0, 1.0),
            rgb[1].clamp(0.0, 1.0),
            rgb[2].clamp(0.0, 1.0),
            alpha.clamp(0.0, 1.0),
        )
        .unwrap_or(Color::BLACK),
    );
    paint.anti_alias = true;
    paint
}
