//! Content stream interpreter.
//!
//! Executes a page's operators against a [`GraphicsStateStack`] and records
//! what gets painted into a [`PageScene`]. Form XObjects are followed with
//! their own resources and matrix.

use super::graphics_state::{ColorSpace, GraphicsState, GraphicsStateStack, Matrix};
use super::image::read_image;
use super::operators::{FillRule, Operator, TextElement};
use super::scene::{
    Glyph, GlyphRun, ImageSource, PageScene, PaintedPath, PathSegment, PlacedImage, SceneItem,
};
use crate::document::{
    dict_get, dict_get_dict, matrix_from_array, name, number, resolve, stream_data, PageInfo,
    SourceDocument,
};
use crate::error::{Error, Result};
use crate::fonts::PdfFont;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::rc::Rc;

/// Nesting limit for Form XObjects.
const MAX_FORM_DEPTH: usize = 8;

/// Interpret one page of a document.
///
/// A page without content yields an empty scene. A content stream that
/// cannot be tokenized is an error for that page only.
pub fn interpret_page(source: &SourceDocument, page: &PageInfo) -> Result<PageScene> {
    let content = source.page_content(page)?;
    let resources = source.page_resources(page);

    let mut interpreter = Interpreter::new(source.inner(), page.index);
    interpreter.run(&content, resources, 0)?;

    log::debug!(
        "Page {}: interpreted {} painted items",
        page.index,
        interpreter.items.len()
    );
    Ok(PageScene {
        page: page.clone(),
        items: interpreter.items,
    })
}

struct Interpreter<'a> {
    doc: &'a Document,
    page_index: usize,
    fonts: HashMap<ObjectId, Rc<PdfFont>>,
    fallback_font: Rc<PdfFont>,
    stack: GraphicsStateStack,
    path: Vec<PathSegment>,
    current_point: (f32, f32),
    items: Vec<SceneItem>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document, page_index: usize) -> Self {
        Self {
            doc,
            page_index,
            fonts: HashMap::new(),
            fallback_font: Rc::new(PdfFont::fallback()),
            stack: GraphicsStateStack::new(),
            path: Vec::new(),
            current_point: (0.0, 0.0),
            items: Vec::new(),
        }
    }

    fn state(&self) -> &GraphicsState {
        self.stack.current()
    }

    fn state_mut(&mut self) -> &mut GraphicsState {
        self.stack.current_mut()
    }

    fn run(&mut self, content: &[u8], resources: Option<&'a Dictionary>, depth: usize) -> Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        let decoded = Content::decode(content).map_err(|e| Error::Content {
            page: self.page_index,
            reason: e.to_string(),
        })?;

        for operation in &decoded.operations {
            match Operator::from_operation(operation) {
                Some(op) => self.execute(op, resources, depth),
                None => log::trace!(
                    "Skipping malformed '{}' operator on page {}",
                    operation.operator,
                    self.page_index
                ),
            }
        }
        Ok(())
    }

    fn execute(&mut self, op: Operator, resources: Option<&'a Dictionary>, depth: usize) {
        match op {
            // Text objects
            Operator::BeginText => {
                let state = self.state_mut();
                state.text_matrix = Matrix::identity();
                state.text_line_matrix = Matrix::identity();
            },
            Operator::EndText => {},
            Operator::Td { tx, ty } => self.move_text(tx, ty),
            Operator::TD { tx, ty } => {
                self.state_mut().leading = -ty;
                self.move_text(tx, ty);
            },
            Operator::Tm { matrix } => {
                let state = self.state_mut();
                state.text_matrix = Matrix::from_array(matrix);
                state.text_line_matrix = state.text_matrix;
            },
            Operator::TStar => self.next_line(),
            Operator::Tj { text } => self.show(&[TextElement::String(text)]),
            Operator::TJ { array } => self.show(&array),
            Operator::Quote { text } => {
                self.next_line();
                self.show(&[TextElement::String(text)]);
            },
            Operator::DoubleQuote {
                word_space,
                char_space,
                text,
            } => {
                let state = self.state_mut();
                state.word_space = word_space;
                state.char_space = char_space;
                self.next_line();
                self.show(&[TextElement::String(text)]);
            },
            Operator::Tc { char_space } => self.state_mut().char_space = char_space,
            Operator::Tw { word_space } => self.state_mut().word_space = word_space,
            Operator::Tz { scale } => self.state_mut().horizontal_scaling = scale,
            Operator::TL { leading } => self.state_mut().leading = leading,
            Operator::Tr { render } => self.state_mut().render_mode = render,
            Operator::Ts { rise } => self.state_mut().text_rise = rise,
            Operator::Tf { font, size } => {
                let loaded = self.load_font(resources, &font);
                let state = self.state_mut();
                state.font = Some(loaded);
                state.font_name = Some(font);
                state.font_size = size;
            },

            // Graphics state
            Operator::SaveState => self.stack.save(),
            Operator::RestoreState => self.stack.restore(),
            Operator::Cm { matrix } => {
                let state = self.state_mut();
                state.ctm = Matrix::from_array(matrix).multiply(&state.ctm);
            },
            Operator::SetLineWidth { width } => self.state_mut().line_width = width,
            Operator::SetDash { array, phase } => self.state_mut().dash_pattern = (array, phase),
            Operator::SetLineCap { cap_style } => self.state_mut().line_cap = cap_style,
            Operator::SetLineJoin { join_style } => self.state_mut().line_join = join_style,
            Operator::SetMiterLimit { limit } => self.state_mut().miter_limit = limit,
            Operator::SetExtGState { dict_name } => self.apply_ext_gstate(resources, &dict_name),

            // Color
            Operator::SetFillRgb { rgb } => {
                let state = self.state_mut();
                state.fill_space = ColorSpace::Rgb;
                state.fill_color = ColorSpace::Rgb.to_rgb(&rgb);
            },
            Operator::SetStrokeRgb { rgb } => {
                let state = self.state_mut();
                state.stroke_space = ColorSpace::Rgb;
                state.stroke_color = ColorSpace::Rgb.to_rgb(&rgb);
            },
            Operator::SetFillGray { gray } => {
                let state = self.state_mut();
                state.fill_space = ColorSpace::Gray;
                state.fill_color = ColorSpace::Gray.to_rgb(&[gray]);
            },
            Operator::SetStrokeGray { gray } => {
                let state = self.state_mut();
                state.stroke_space = ColorSpace::Gray;
                state.stroke_color = ColorSpace::Gray.to_rgb(&[gray]);
            },
            Operator::SetFillCmyk { cmyk } => {
                let state = self.state_mut();
                state.fill_space = ColorSpace::Cmyk;
                state.fill_color = ColorSpace::Cmyk.to_rgb(&cmyk);
            },
            Operator::SetStrokeCmyk { cmyk } => {
                let state = self.state_mut();
                state.stroke_space = ColorSpace::Cmyk;
                state.stroke_color = ColorSpace::Cmyk.to_rgb(&cmyk);
            },
            Operator::SetFillColorSpace { name } => {
                let space = self.color_space(resources, &name);
                let state = self.state_mut();
                state.fill_color = space.initial_color();
                state.fill_space = space;
            },
            Operator::SetStrokeColorSpace { name } => {
                let space = self.color_space(resources, &name);
                let state = self.state_mut();
                state.stroke_color = space.initial_color();
                state.stroke_space = space;
            },
            Operator::SetFillColor {
                components,
                pattern,
            } => {
                let color = self.resolve_color(resources, true, &components, pattern.as_deref());
                self.state_mut().fill_color = color;
            },
            Operator::SetStrokeColor {
                components,
                pattern,
            } => {
                let color = self.resolve_color(resources, false, &components, pattern.as_deref());
                self.state_mut().stroke_color = color;
            },

            // XObjects
            Operator::Do { name } => self.paint_xobject(resources, &name, depth),

            // Paths
            Operator::MoveTo { x, y } => {
                self.path.push(PathSegment::MoveTo(x, y));
                self.current_point = (x, y);
            },
            Operator::LineTo { x, y } => {
                self.path.push(PathSegment::LineTo(x, y));
                self.current_point = (x, y);
            },
            Operator::CurveTo { c1, c2, end } => {
                let (x1, y1) = c1.unwrap_or(self.current_point);
                let (x2, y2) = c2.unwrap_or(end);
                self.path
                    .push(PathSegment::CurveTo(x1, y1, x2, y2, end.0, end.1));
                self.current_point = end;
            },
            Operator::ClosePath => self.path.push(PathSegment::Close),
            Operator::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                self.path.push(PathSegment::Rect(x, y, width, height));
                self.current_point = (x, y);
            },
            Operator::Paint {
                close,
                fill,
                stroke,
            } => {
                if close {
                    self.path.push(PathSegment::Close);
                }
                self.paint_path(fill, stroke);
            },
            Operator::EndPath => self.path.clear(),
            Operator::Clip => {},
            Operator::Other { .. } => {},
        }
    }

    fn move_text(&mut self, tx: f32, ty: f32) {
        let state = self.state_mut();
        state.text_line_matrix = Matrix::translation(tx, ty).multiply(&state.text_line_matrix);
        state.text_matrix = state.text_line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state().leading;
        self.move_text(0.0, -leading);
    }

    /// Show strings, advancing the text matrix.
    fn show(&mut self, elements: &[TextElement]) {
        let state = self.state();
        let font = state.font.clone().unwrap_or_else(|| self.fallback_font.clone());
        let fs = state.font_size;
        let th = state.horizontal_scaling / 100.0;
        let tc = state.char_space;
        let tw = state.word_space;
        let rise = state.text_rise;
        let render_mode = state.render_mode;
        let matrix = state.text_matrix.multiply(&state.ctm);
        let (color, alpha) = if render_mode == 1 || render_mode == 5 {
            (state.stroke_color, state.stroke_alpha)
        } else {
            (state.fill_color, state.fill_alpha)
        };

        let mut glyphs = Vec::new();
        let mut tx = 0.0f32;
        for element in elements {
            match element {
                TextElement::Offset(adjust) => tx -= adjust / 1000.0 * fs * th,
                TextElement::String(bytes) => {
                    for decoded in font.decode(bytes) {
                        let w0 = decoded.width / 1000.0;
                        glyphs.push(Glyph {
                            text: decoded.text,
                            x: tx,
                            width: w0 * fs * th,
                        });
                        let spacing = tc + if decoded.is_space { tw } else { 0.0 };
                        tx += (w0 * fs + spacing) * th;
                    }
                },
            }
        }

        if !glyphs.is_empty() {
            let run = GlyphRun {
                glyphs,
                matrix,
                ascent: rise + font.ascent * fs,
                descent: rise + font.descent * fs,
                font_name: font.base_font.clone(),
                font_size: fs.abs() * matrix.vertical_scale(),
                color,
                alpha,
                render_mode,
            };
            self.items.push(SceneItem::Text(run));
        }

        let state = self.state_mut();
        state.text_matrix = Matrix::translation(tx, 0.0).multiply(&state.text_matrix);
    }

    fn load_font(&mut self, resources: Option<&'a Dictionary>, font_name: &str) -> Rc<PdfFont> {
        let entry = resources
            .and_then(|res| dict_get_dict(self.doc, res, b"Font"))
            .and_then(|fonts| fonts.get(font_name.as_bytes()).ok());

        let Some(entry) = entry else {
            log::warn!(
                "Font /{} missing from resources on page {}, using Helvetica",
                font_name,
                self.page_index
            );
            return self.fallback_font.clone();
        };

        let id = match entry {
            Object::Reference(id) => Some(*id),
            _ => None,
        };
        if let Some(cached) = id.and_then(|id| self.fonts.get(&id)) {
            return cached.clone();
        }

        let font = match resolve(self.doc, entry) {
            Some(Object::Dictionary(dict)) => Rc::new(PdfFont::load(self.doc, dict)),
            _ => self.fallback_font.clone(),
        };
        if let Some(id) = id {
            self.fonts.insert(id, font.clone());
        }
        font
    }

    fn apply_ext_gstate(&mut self, resources: Option<&'a Dictionary>, gs_name: &str) {
        let Some(gs) = resources
            .and_then(|res| dict_get_dict(self.doc, res, b"ExtGState"))
            .and_then(|all| dict_get_dict(self.doc, all, gs_name.as_bytes()))
        else {
            return;
        };
        let doc = self.doc;
        let state = self.stack.current_mut();
        if let Some(v) = dict_get(doc, gs, b"ca").and_then(number) {
            state.fill_alpha = v.clamp(0.0, 1.0);
        }
        if let Some(v) = dict_get(doc, gs, b"CA").and_then(number) {
            state.stroke_alpha = v.clamp(0.0, 1.0);
        }
        if let Some(v) = dict_get(doc, gs, b"LW").and_then(number) {
            state.line_width = v;
        }
    }

    fn color_space(&self, resources: Option<&'a Dictionary>, cs_name: &str) -> ColorSpace {
        match cs_name {
            "DeviceGray" | "G" | "CalGray" => return ColorSpace::Gray,
            "DeviceRGB" | "RGB" | "CalRGB" => return ColorSpace::Rgb,
            "DeviceCMYK" | "CMYK" => return ColorSpace::Cmyk,
            "Pattern" => return ColorSpace::Pattern,
            _ => {},
        }
        let named = resources
            .and_then(|res| dict_get_dict(self.doc, res, b"ColorSpace"))
            .and_then(|all| dict_get(self.doc, all, cs_name.as_bytes()));
        match named {
            Some(obj) => self.color_space_object(obj),
            None => ColorSpace::Gray,
        }
    }

    fn color_space_object(&self, obj: &Object) -> ColorSpace {
        let doc = self.doc;
        match obj {
            Object::Name(n) => match n.as_slice() {
                b"DeviceRGB" | b"CalRGB" => ColorSpace::Rgb,
                b"DeviceCMYK" => ColorSpace::Cmyk,
                b"Pattern" => ColorSpace::Pattern,
                _ => ColorSpace::Gray,
            },
            Object::Array(items) => {
                let family = items.first().and_then(|o| resolve(doc, o)).and_then(name);
                match family.as_deref() {
                    Some("ICCBased") => {
                        let n = match items.get(1).and_then(|o| resolve(doc, o)) {
                            Some(Object::Stream(s)) => dict_get(doc, &s.dict, b"N").and_then(number),
                            _ => None,
                        };
                        match n.map(|n| n as u32) {
                            Some(1) => ColorSpace::Gray,
                            Some(4) => ColorSpace::Cmyk,
                            _ => ColorSpace::Rgb,
                        }
                    },
                    Some("CalRGB") | Some("Lab") => ColorSpace::Rgb,
                    Some("CalGray") => ColorSpace::Gray,
                    Some("Separation") | Some("DeviceN") => ColorSpace::Tint,
                    Some("Pattern") => ColorSpace::Pattern,
                    Some("Indexed") | Some("I") => {
                        let base = items
                            .get(1)
                            .and_then(|o| resolve(doc, o))
                            .map(|b| self.color_space_object(b))
                            .unwrap_or(ColorSpace::Rgb);
                        let palette = match items.get(3).and_then(|o| resolve(doc, o)) {
                            Some(Object::String(bytes, _)) => bytes.clone(),
                            Some(Object::Stream(s)) => stream_data(s).unwrap_or_default(),
                            _ => Vec::new(),
                        };
                        ColorSpace::Indexed {
                            base_components: base.components().max(1),
                            palette,
                        }
                    },
                    _ => ColorSpace::Gray,
                }
            },
            _ => ColorSpace::Gray,
        }
    }

    fn resolve_color(
        &self,
        resources: Option<&'a Dictionary>,
        fill: bool,
        components: &[f32],
        pattern: Option<&str>,
    ) -> [f32; 3] {
        let space = if fill {
            &self.state().fill_space
        } else {
            &self.state().stroke_space
        };
        if let ColorSpace::Pattern = space {
            return pattern
                .and_then(|p| self.pattern_color(resources, p))
                .unwrap_or([0.5, 0.5, 0.5]);
        }
        space.to_rgb(components)
    }

    /// Approximate a shading pattern by the mean of its end colors.
    fn pattern_color(&self, resources: Option<&'a Dictionary>, pattern: &str) -> Option<[f32; 3]> {
        let doc = self.doc;
        let pattern = resources
            .and_then(|res| dict_get_dict(doc, res, b"Pattern"))
            .and_then(|all| dict_get_dict(doc, all, pattern.as_bytes()))?;
        let shading = dict_get_dict(doc, pattern, b"Shading")?;
        let function = dict_get_dict(doc, shading, b"Function")?;
        let read = |key: &[u8]| -> Option<Vec<f32>> {
            match dict_get(doc, function, key)? {
                Object::Array(items) => Some(
                    items
                        .iter()
                        .filter_map(|o| resolve(doc, o).and_then(number))
                        .collect(),
                ),
                _ => None,
            }
        };
        let c0 = read(b"C0").unwrap_or_else(|| vec![0.0]);
        let c1 = read(b"C1").unwrap_or_else(|| vec![1.0]);
        let space = dict_get(doc, shading, b"ColorSpace")
            .map(|cs| self.color_space_object(cs))
            .unwrap_or(ColorSpace::Rgb);
        let a = space.to_rgb(&c0);
        let b = space.to_rgb(&c1);
        Some([(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0, (a[2] + b[2]) / 2.0])
    }

    fn paint_path(&mut self, fill: Option<FillRule>, stroke: bool) {
        let segments = std::mem::take(&mut self.path);
        if segments.is_empty() {
            return;
        }
        let state = self.state();
        let path = PaintedPath {
            segments,
            ctm: state.ctm,
            fill,
            stroke,
            fill_color: state.fill_color,
            stroke_color: state.stroke_color,
            fill_alpha: state.fill_alpha,
            stroke_alpha: state.stroke_alpha,
            line_width: state.line_width,
            line_cap: state.line_cap,
            line_join: state.line_join,
            miter_limit: state.miter_limit,
            dash: state.dash_pattern.clone(),
        };
        self.items.push(SceneItem::Path(path));
    }

    fn paint_xobject(&mut self, resources: Option<&'a Dictionary>, xobject: &str, depth: usize) {
        let doc = self.doc;
        let entry = resources
            .and_then(|res| dict_get_dict(doc, res, b"XObject"))
            .and_then(|all| dict_get(doc, all, xobject.as_bytes()));
        let Some(Object::Stream(stream)) = entry else {
            log::debug!("XObject /{} not found on page {}", xobject, self.page_index);
            return;
        };

        let subtype = dict_get(doc, &stream.dict, b"Subtype").and_then(name);
        match subtype.as_deref() {
            Some("Image") => {
                let ctm = self.state().ctm;
                let source = read_image(doc, stream, self.state().fill_color);
                if matches!(source, ImageSource::Unsupported) {
                    log::debug!("Image /{} drawn as placeholder", xobject);
                }
                self.items.push(SceneItem::Image(PlacedImage { ctm, source }));
            },
            Some("Form") => {
                if depth >= MAX_FORM_DEPTH {
                    log::warn!("Form XObject nesting too deep on page {}", self.page_index);
                    return;
                }
                let Some(data) = stream_data(stream) else {
                    log::warn!("Form XObject /{} could not be decompressed", xobject);
                    return;
                };
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| matrix_from_array(doc, m))
                    .map(Matrix::from_array)
                    .unwrap_or_default();
                let form_resources = match dict_get(doc, &stream.dict, b"Resources") {
                    Some(Object::Dictionary(res)) => Some(res),
                    _ => resources,
                };

                self.stack.save();
                let saved_path = std::mem::take(&mut self.path);
                {
                    let state = self.state_mut();
                    state.ctm = form_matrix.multiply(&state.ctm);
                }
                if let Err(e) = self.run(&data, form_resources, depth + 1) {
                    log::warn!("Skipping Form XObject /{}: {}", xobject, e);
                }
                self.path = saved_path;
                self.stack.restore();
            },
            other => log::trace!("Ignoring XObject /{} of subtype {:?}", xobject, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn single_page(content: &[u8], resources: Dictionary) -> SourceDocument {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.to_vec()));
        let resources_id = doc.add_object(resources);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        SourceDocument::from_document(doc).unwrap()
    }

    fn helvetica_resources() -> Dictionary {
        dictionary! {
            "Font" => dictionary! {
                "F1" => dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                },
            },
        }
    }

    #[test]
    fn test_text_run_geometry() {
        let source = single_page(
            b"BT /F1 12 Tf 72 700 Td (Hi) Tj ET",
            helvetica_resources(),
        );
        let scene = interpret_page(&source, source.page(0).unwrap()).unwrap();
        let runs: Vec<_> = scene.glyph_runs().collect();
        assert_eq!(runs.len(), 1);
        let run = runs[0];
        assert_eq!(run.font_name, "Helvetica");
        assert_eq!(run.font_size, 12.0);
        assert_eq!(run.glyphs.len(), 2);
        // H is 722 units wide
        assert!((run.glyphs[1].x - 8.664).abs() < 1e-3);

        let rect = run.glyph_rect(&run.glyphs[0], &scene.page);
        assert!((rect.x0 - 72.0).abs() < 1e-3);
        assert!(rect.y0 < 92.0 && rect.y1 > 92.0);
    }

    #[test]
    fn test_tj_offsets_and_text_matrix_advance() {
        let source = single_page(
            b"BT /F1 10 Tf 0 0 Td [(A) -1000 (B)] TJ (C) Tj ET",
            helvetica_resources(),
        );
        let scene = interpret_page(&source, source.page(0).unwrap()).unwrap();
        let runs: Vec<_> = scene.glyph_runs().collect();
        assert_eq!(runs.len(), 2);
        // A (6.67) + 10pt adjustment
        assert!((runs[0].glyphs[1].x - 16.67).abs() < 1e-2);
        // Second run starts after A, the gap and B
        assert!((runs[1].matrix.e - 23.34).abs() < 1e-2);
    }

    #[test]
    fn test_paths_images_and_state_restore() {
        let mut resources = helvetica_resources();
        resources.set(
            "XObject",
            dictionary! {
                "Im1" => Stream::new(
                    dictionary! {
                        "Subtype" => "Image",
                        "Width" => 1,
                        "Height" => 1,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    vec![128],
                ),
            },
        );
        let source = single_page(
            b"q 1 0 0 rg 10 10 100 100 re f Q q 200 0 0 100 50 600 cm /Im1 Do Q 0 0 m 10 10 l S",
            resources,
        );
        let scene = interpret_page(&source, source.page(0).unwrap()).unwrap();
        assert_eq!(scene.items.len(), 3);

        let SceneItem::Path(fill) = &scene.items[0] else {
            panic!("expected path");
        };
        assert_eq!(fill.fill_color, [1.0, 0.0, 0.0]);
        let rects = fill.filled_rects(&scene.page);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].y0, 682.0);

        let SceneItem::Image(image) = &scene.items[1] else {
            panic!("expected image");
        };
        let rect = image.rect(&scene.page);
        assert_eq!((rect.x0, rect.y0, rect.x1, rect.y1), (50.0, 92.0, 250.0, 192.0));

        let SceneItem::Path(stroke) = &scene.items[2] else {
            panic!("expected path");
        };
        assert!(stroke.stroke && stroke.fill.is_none());
        assert_eq!(stroke.fill_color, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_font_falls_back() {
        let source = single_page(b"BT /F9 12 Tf (x) Tj ET", Dictionary::new());
        let scene = interpret_page(&source, source.page(0).unwrap()).unwrap();
        assert_eq!(scene.glyph_runs().next().unwrap().font_name, "Helvetica");
    }

    #[test]
    fn test_empty_content() {
        let source = single_page(b"", Dictionary::new());
        let scene = interpret_page(&source, source.page(0).unwrap()).unwrap();
        assert!(scene.items.is_empty());
        assert!(!scene.has_text());
    }
}
