//! Page renderer - replays an interpreted page onto a pixmap.

use super::image_decoder::decode_to_pixmap;
use super::path_rasterizer::PathRasterizer;
use super::text_rasterizer::TextRasterizer;
use super::{create_paint, pixel_size, Raster};
use crate::content::{ImageSource, Matrix, PageScene, PlacedImage, SceneItem};
use crate::error::{Error, Result};
use image::RgbImage;
use tiny_skia::{Color, FilterQuality, PathBuilder, Pixmap, PixmapPaint, Transform};

/// Gray used for images that cannot be decoded.
const PLACEHOLDER_GRAY: f32 = 0.75;

/// Page renderer that converts interpreted pages to rasters.
#[derive(Debug)]
pub struct PageRenderer {
    path_rasterizer: PathRasterizer,
    text_rasterizer: TextRasterizer,
    draw_text: bool,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer {
    /// Create a new page renderer that draws text as glyph boxes.
    pub fn new() -> Self {
        Self {
            path_rasterizer: PathRasterizer::new(),
            text_rasterizer: TextRasterizer::new(),
            draw_text: true,
        }
    }

    /// Skip text runs, leaving only paths and images.
    pub fn without_text(mut self) -> Self {
        self.draw_text = false;
        self
    }

    /// Render a page at `scale` pixels per point onto white paper.
    pub fn render(&self, scene: &PageScene, scale: f32) -> Result<Raster> {
        let page = &scene.page;
        let (width, height) = pixel_size(page.width(), page.height(), scale);
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| Error::Render(format!("failed to create pixmap {}x{}", width, height)))?;
        pixmap.fill(Color::WHITE);

        // PDF user space to pixels: shift to the MediaBox origin and flip y
        let mb = &page.media_box;
        let base = Transform::from_row(scale, 0.0, 0.0, -scale, -mb.x0 * scale, mb.y1 * scale);

        for item in &scene.items {
            match item {
                SceneItem::Path(path) => self.path_rasterizer.draw(&mut pixmap, path, base),
                SceneItem::Text(run) if self.draw_text => self.text_rasterizer.draw(&mut pixmap, run, base),
                SceneItem::Text(_) => {},
                SceneItem::Image(image) => self.draw_image(&mut pixmap, image, base),
            }
        }

        Ok(Raster {
            image: to_rgb_image(&pixmap),
            scale,
        })
    }

    /// Draw an image into the unit square mapped by its CTM.
    fn draw_image(&self, pixmap: &mut Pixmap, placed: &PlacedImage, base: Transform) {
        let transform = base.pre_concat(to_transform(&placed.ctm));
        let decoded = match &placed.source {
            ImageSource::Encoded(encoded) => match decode_to_pixmap(encoded) {
                Ok(img) => Some(img),
                Err(e) => {
                    log::debug!("Image decode failed, drawing placeholder: {}", e);
                    None
                },
            },
            ImageSource::Unsupported => None,
        };

        match decoded {
            Some(img) => {
                // image space has its origin at the top-left of the unit square
                let (w, h) = (img.width() as f32, img.height() as f32);
                let unit = Transform::from_row(1.0 / w, 0.0, 0.0, -1.0 / h, 0.0, 1.0);
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                pixmap.draw_pixmap(0, 0, img.as_ref(), &paint, transform.pre_concat(unit), None);
            },
            None => {
                let paint = create_paint([PLACEHOLDER_GRAY; 3], 1.0);
                if let Some(rect) = tiny_skia::Rect::from_ltrb(0.0, 0.0, 1.0, 1.0) {
                    let path = PathBuilder::from_rect(rect);
                    pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, transform, None);
                }
            },
        }
    }
}

fn to_transform(m: &Matrix) -> Transform {
    Transform::from_row(m.a, m.b, m.c, m.d, m.e, m.f)
}

/// Flatten an opaque pixmap to RGB.
fn to_rgb_image(pixmap: &Pixmap) -> RgbImage {
    let mut data = Vec::with_capacity(pixmap.pixels().len() * 3);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue()]);
    }
    RgbImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbImage::new(pixmap.width(), pixmap.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{EncodedImage, FillRule, Glyph, GlyphRun, ImageColor, ImageFilter, PaintedPath, PathSegment};
    use crate::document::PageInfo;
    use crate::geometry::Rect;

    fn scene(items: Vec<SceneItem>) -> PageScene {
        PageScene {
            page: PageInfo {
                index: 0,
                id: (1, 0),
                media_box: Rect::new(0.0, 0.0, 100.0, 100.0),
                rotation: 0,
            },
            items,
        }
    }

    fn red_box() -> SceneItem {
        SceneItem::Path(PaintedPath {
            segments: vec![PathSegment::Rect(10.0, 10.0, 30.0, 20.0)],
            ctm: Matrix::identity(),
            fill: Some(FillRule::NonZero),
            stroke: false,
            fill_color: [1.0, 0.0, 0.0],
            stroke_color: [0.0, 0.0, 0.0],
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            line_width: 1.0,
            line_cap: 0,
            line_join: 0,
            miter_limit: 10.0,
            dash: (Vec::new(), 0.0),
        })
    }

    #[test]
    fn test_empty_page_is_white() {
        let raster = PageRenderer::new().render(&scene(vec![]), 1.0).unwrap();
        assert_eq!((raster.width(), raster.height()), (100, 100));
        assert!(raster.image.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_fill_is_flipped_to_top_left() {
        let raster = PageRenderer::new().render(&scene(vec![red_box()]), 1.0).unwrap();
        // user y 10..30 is page y 70..90
        assert_eq!(raster.sample(25.0, 80.0), Some([255, 0, 0]));
        assert_eq!(raster.sample(25.0, 20.0), Some([255, 255, 255]));
    }

    #[test]
    fn test_image_fills_its_placement() {
        let image = SceneItem::Image(PlacedImage {
            ctm: Matrix::new(50.0, 0.0, 0.0, 50.0, 0.0, 50.0),
            source: ImageSource::Encoded(EncodedImage {
                width: 2,
                height: 2,
                bits_per_component: 8,
                color: ImageColor::Rgb,
                filter: ImageFilter::Raw,
                data: vec![0, 0, 255, 0, 0, 255, 0, 0, 255, 0, 0, 255],
                is_mask: false,
                mask_color: [0.0; 3],
                inverted: false,
            }),
        });
        let raster = PageRenderer::new().render(&scene(vec![image]), 1.0).unwrap();
        assert_eq!(raster.sample(25.0, 25.0), Some([0, 0, 255]));
        assert_eq!(raster.sample(75.0, 75.0), Some([255, 255, 255]));
    }

    #[test]
    fn test_unsupported_image_placeholder_and_text_boxes() {
        let placeholder = SceneItem::Image(PlacedImage {
            ctm: Matrix::new(20.0, 0.0, 0.0, 20.0, 70.0, 70.0),
            source: ImageSource::Unsupported,
        });
        let text = SceneItem::Text(GlyphRun {
            glyphs: vec![Glyph {
                text: "H".to_string(),
                x: 0.0,
                width: 1.0,
            }],
            matrix: Matrix::new(20.0, 0.0, 0.0, 20.0, 10.0, 10.0),
            ascent: 1.0,
            descent: -0.2,
            font_name: "Helvetica".to_string(),
            font_size: 20.0,
            color: [0.0, 0.0, 0.0],
            alpha: 1.0,
            render_mode: 0,
        });
        let raster = PageRenderer::new().render(&scene(vec![placeholder.clone(), text.clone()]), 1.0).unwrap();
        assert_eq!(raster.sample(80.0, 20.0), Some([191, 191, 191]));
        // glyph box spans user y 10..28, page y 72..90
        assert_eq!(raster.sample(20.0, 80.0), Some([0, 0, 0]));

        let bare = PageRenderer::new()
            .without_text()
            .render(&scene(vec![placeholder, text]), 1.0)
            .unwrap();
        assert_eq!(bare.sample(80.0, 20.0), Some([191, 191, 191]));
        assert_eq!(bare.sample(20.0, 80.0), Some([255, 255, 255]));
    }
}
