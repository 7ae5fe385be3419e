//! PDF content stream builder.
//!
//! Builds the page content of a produced document: one background image
//! and runs of text in standard fonts.

use crate::error::Result;
use crate::fonts::encoding::{encode_winansi, escape_literal_bytes};
use std::io::Write;

/// Operations that can be added to a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Set transformation matrix (cm)
    Transform(f32, f32, f32, f32, f32, f32),
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font resource and size (Tf)
    SetFont(String, f32),
    /// Set text matrix (Tm)
    SetTextMatrix(f32, f32, f32, f32, f32, f32),
    /// Show text (Tj), already encoded for the font
    ShowText(Vec<u8>),
    /// Set fill color RGB (rg)
    SetFillColorRGB(f32, f32, f32),
    /// Paint XObject (Do)
    PaintXObject(String),
}

/// Builder for content streams.
#[derive(Debug, Default)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
    in_text_object: bool,
    current_font: Option<(String, f32)>,
    current_fill: Option<[f32; 3]>,
}

impl ContentStreamBuilder {
    /// Create a new content stream builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation to the stream.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Operations added so far.
    pub fn operations(&self) -> &[ContentStreamOp] {
        &self.operations
    }

    /// Begin a text object.
    pub fn begin_text(&mut self) -> &mut Self {
        if !self.in_text_object {
            self.op(ContentStreamOp::BeginText);
            self.in_text_object = true;
        }
        self
    }

    /// End a text object.
    pub fn end_text(&mut self) -> &mut Self {
        if self.in_text_object {
            self.op(ContentStreamOp::EndText);
            self.in_text_object = false;
        }
        self
    }

    /// Set the font resource and size; repeated settings are dropped.
    pub fn set_font(&mut self, resource: &str, size: f32) -> &mut Self {
        let unchanged = self
            .current_font
            .as_ref()
            .is_some_and(|(name, s)| name == resource && *s == size);
        if !unchanged {
            self.op(ContentStreamOp::SetFont(resource.to_string(), size));
            self.current_font = Some((resource.to_string(), size));
        }
        self
    }

    /// Set the fill color; repeated settings are dropped.
    pub fn set_fill_color(&mut self, r: f32, g: f32, b: f32) -> &mut Self {
        if self.current_fill != Some([r, g, b]) {
            self.op(ContentStreamOp::SetFillColorRGB(r, g, b));
            self.current_fill = Some([r, g, b]);
        }
        self
    }

    /// Show WinAnsi-encoded text with its baseline origin at `(x, y)`.
    pub fn text(&mut self, text: &str, x: f32, y: f32) -> &mut Self {
        self.begin_text();
        self.op(ContentStreamOp::SetTextMatrix(1.0, 0.0, 0.0, 1.0, x, y));
        self.op(ContentStreamOp::ShowText(encode_winansi(text)));
        self
    }

    /// Paint an image XObject over the rectangle `(x, y, width, height)`.
    pub fn draw_image(&mut self, name: &str, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.end_text();
        self.op(ContentStreamOp::SaveState)
            .op(ContentStreamOp::Transform(width, 0.0, 0.0, height, x, y))
            .op(ContentStreamOp::PaintXObject(name.to_string()))
            .op(ContentStreamOp::RestoreState)
    }

    /// Serialize the operations, closing an open text object.
    pub fn build(&mut self) -> Result<Vec<u8>> {
        self.end_text();
        let mut buf = Vec::new();
        for op in &self.operations {
            write_op(&mut buf, op)?;
            writeln!(buf)?;
        }
        Ok(buf)
    }
}

/// Format a number without superfluous digits.
fn num(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

fn write_op<W: Write>(w: &mut W, op: &ContentStreamOp) -> std::io::Result<()> {
    match op {
        ContentStreamOp::SaveState => write!(w, "q"),
        ContentStreamOp::RestoreState => write!(w, "Q"),
        ContentStreamOp::Transform(a, b, c, d, e, f) => write!(
            w,
            "{} {} {} {} {} {} cm",
            num(*a),
            num(*b),
            num(*c),
            num(*d),
            num(*e),
            num(*f)
        ),
        ContentStreamOp::BeginText => write!(w, "BT"),
        ContentStreamOp::EndText => write!(w, "ET"),
        ContentStreamOp::SetFont(name, size) => write!(w, "/{} {} Tf", name, num(*size)),
        ContentStreamOp::SetTextMatrix(a, b, c, d, e, f) => write!(
            w,
            "{} {} {} {} {} {} Tm",
            num(*a),
            num(*b),
            num(*c),
            num(*d),
            num(*e),
            num(*f)
        ),
        ContentStreamOp::ShowText(bytes) => {
            w.write_all(b"(")?;
            w.write_all(&escape_literal_bytes(bytes))?;
            w.write_all(b") Tj")
        },
        ContentStreamOp::SetFillColorRGB(r, g, b) => {
            write!(w, "{} {} {} rg", num(*r), num(*g), num(*b))
        },
        ContentStreamOp::PaintXObject(name) => write!(w, "/{} Do", name),
    }
}
