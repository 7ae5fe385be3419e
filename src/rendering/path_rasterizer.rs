//! Path rasterizer - renders painted paths using tiny-skia.

use super::create_paint;
use crate::content::{FillRule, PaintedPath, PathSegment};
use tiny_skia::{LineCap, LineJoin, Path, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};

/// Rasterizer for painted paths.
#[derive(Debug, Default)]
pub struct PathRasterizer;

impl PathRasterizer {
    /// Create a new path rasterizer.
    pub fn new() -> Self {
        Self
    }

    /// Fill and/or stroke a path. `base` maps user space to pixels.
    pub fn draw(&self, pixmap: &mut Pixmap, painted: &PaintedPath, base: Transform) {
        let Some(path) = build_path(&painted.segments) else {
            return;
        };
        let ctm = &painted.ctm;
        let transform = base.pre_concat(Transform::from_row(ctm.a, ctm.b, ctm.c, ctm.d, ctm.e, ctm.f));

        if let Some(rule) = painted.fill {
            let paint = create_paint(painted.fill_color, painted.fill_alpha);
            let rule = match rule {
                FillRule::NonZero => tiny_skia::FillRule::Winding,
                FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
            };
            pixmap.fill_path(&path, &paint, rule, transform, None);
        }

        if painted.stroke {
            let paint = create_paint(painted.stroke_color, painted.stroke_alpha);
            let (array, phase) = &painted.dash;
            let dash = if array.is_empty() {
                None
            } else {
                StrokeDash::new(array.clone(), *phase)
            };
            let stroke = Stroke {
                width: painted.line_width.max(0.0),
                line_cap: line_cap_to_skia(painted.line_cap),
                line_join: line_join_to_skia(painted.line_join),
                miter_limit: painted.miter_limit.max(1.0),
                dash,
            };
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }
    }
}

/// Build a tiny-skia path in user space.
fn build_path(segments: &[PathSegment]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for seg in segments {
        match *seg {
            PathSegment::MoveTo(x, y) => pb.move_to(x, y),
            PathSegment::LineTo(x, y) => pb.line_to(x, y),
            PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => pb.cubic_to(x1, y1, x2, y2, x3, y3),
            PathSegment::Rect(x, y, w, h) => {
                // negative extents are legal in `re`
                let (l, r) = if w < 0.0 { (x + w, x) } else { (x, x + w) };
                let (b, t) = if h < 0.0 { (y + h, y) } else { (y, y + h) };
                if let Some(rect) = tiny_skia::Rect::from_ltrb(l, b, r, t) {
                    pb.push_rect(rect);
                }
            },
            PathSegment::Close => pb.close(),
        }
    }
    pb.finish()
}

/// Convert PDF line cap style to tiny-skia.
fn line_cap_to_skia(cap: u8) -> LineCap {
    match cap {
        1 => LineCap::Round,
        2 => LineCap::Square,
        _ => LineCap::Butt,
    }
}

/// Convert PDF line join style to tiny-skia.
fn line_join_to_skia(join: u8) -> LineJoin {
    match join {
        1 => LineJoin::Round,
        2 => LineJoin::Bevel,
        _ => LineJoin::Miter,
    }
}
