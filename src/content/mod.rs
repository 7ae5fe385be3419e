//! PDF content stream interpretation.
//!
//! Content streams are tokenized by `lopdf`, converted to typed
//! [`Operator`]s and executed into a [`PageScene`] display list that the
//! extractors and the rasterizer consume.

pub mod ccitt;
pub mod graphics_state;
pub mod image;
pub mod interpreter;
pub mod operators;
pub mod scene;

pub use graphics_state::{ColorSpace, GraphicsState, GraphicsStateStack, Matrix};
pub use interpreter::interpret_page;
pub use operators::{FillRule, Operator, TextElement};
pub use scene::{
    EncodedImage, Glyph, GlyphRun, ImageColor, ImageFilter, ImageSource, PageScene, PaintedPath,
    PathSegment, PlacedImage, SceneItem,
};
