//! Graphics state management for content stream execution.
//!
//! This module provides the graphics state machine that tracks transformations,
//! text positioning, colors, and line style as operators are executed.

use crate::fonts::PdfFont;
use crate::geometry::Point;
use std::rc::Rc;

/// A 2D transformation matrix.
///
/// PDF uses matrices of the form:
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
///
/// Where (a,b,c,d) define scaling/rotation/skewing and (e,f) define translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Matrix {
    /// Create an identity matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_retext::content::Matrix;
    ///
    /// let m = Matrix::identity();
    /// assert_eq!(m.a, 1.0);
    /// assert_eq!(m.d, 1.0);
    /// assert_eq!(m.e, 0.0);
    /// ```
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Create a matrix from its six components.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create a matrix from a `[a b c d e f]` array.
    pub fn from_array(m: [f32; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// Create a translation matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_retext::content::Matrix;
    ///
    /// let m = Matrix::translation(10.0, 20.0);
    /// let p = m.transform_point(5.0, 10.0);
    /// assert_eq!((p.x, p.y), (15.0, 30.0));
    /// ```
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Create a scaling matrix.
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Multiply this matrix with another matrix.
    ///
    /// The result applies `self` first, then `other`, so
    /// `text_matrix.multiply(&ctm)` maps text space to device-independent
    /// user space.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_retext::content::Matrix;
    ///
    /// let m = Matrix::translation(10.0, 20.0).multiply(&Matrix::scaling(2.0, 2.0));
    /// let p = m.transform_point(5.0, 5.0);
    /// assert_eq!((p.x, p.y), (30.0, 50.0));
    /// ```
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point using this matrix.
    pub fn transform_point(&self, x: f32, y: f32) -> Point {
        Point {
            x: self.a * x + self.c * y + self.e,
            y: self.b * x + self.d * y + self.f,
        }
    }

    /// Length of the transformed unit y vector.
    ///
    /// Used to turn a nominal font size into the rendered size.
    pub fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    /// Get the determinant of this matrix.
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Check if this matrix is invertible.
    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() > f32::EPSILON
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Color space of the current fill or stroke color.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    /// DeviceGray, CalGray, 1-component ICC
    Gray,
    /// DeviceRGB, CalRGB, Lab, 3-component ICC
    Rgb,
    /// DeviceCMYK, 4-component ICC
    Cmyk,
    /// Indexed lookup into a base space
    Indexed {
        /// Components per palette entry
        base_components: usize,
        /// Palette bytes
        palette: Vec<u8>,
    },
    /// Separation/DeviceN, approximated as a gray tint
    Tint,
    /// Pattern; paints use an approximated solid color
    Pattern,
}

impl ColorSpace {
    /// Number of operands `sc`/`scn` take in this space.
    pub fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Tint | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
            ColorSpace::Pattern => 0,
        }
    }

    /// Initial color when the space is selected.
    pub fn initial_color(&self) -> [f32; 3] {
        match self {
            ColorSpace::Indexed { .. } => self.to_rgb(&[0.0]),
            ColorSpace::Tint => [1.0, 1.0, 1.0],
            _ => [0.0, 0.0, 0.0],
        }
    }

    /// Convert operands in this space to RGB.
    pub fn to_rgb(&self, comps: &[f32]) -> [f32; 3] {
        let at = |i: usize| comps.get(i).copied().unwrap_or(0.0).clamp(0.0, 1.0);
        match self {
            ColorSpace::Gray => [at(0), at(0), at(0)],
            ColorSpace::Rgb => [at(0), at(1), at(2)],
            ColorSpace::Cmyk => cmyk_to_rgb(at(0), at(1), at(2), at(3)),
            ColorSpace::Tint => {
                let v = 1.0 - at(0);
                [v, v, v]
            },
            ColorSpace::Indexed {
                base_components,
                palette,
            } => {
                let index = comps.first().copied().unwrap_or(0.0).max(0.0) as usize;
                let start = index * base_components;
                let entry: Vec<f32> = palette
                    .get(start..start + base_components)
                    .map(|s| s.iter().map(|b| *b as f32 / 255.0).collect())
                    .unwrap_or_default();
                match base_components {
                    1 => ColorSpace::Gray.to_rgb(&entry),
                    4 => ColorSpace::Cmyk.to_rgb(&entry),
                    _ => ColorSpace::Rgb.to_rgb(&entry),
                }
            },
            ColorSpace::Pattern => [0.5, 0.5, 0.5],
        }
    }
}

/// Naive CMYK to RGB conversion.
pub fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> [f32; 3] {
    [
        (1.0 - c) * (1.0 - k),
        (1.0 - m) * (1.0 - k),
        (1.0 - y) * (1.0 - k),
    ]
}

/// Graphics state parameters.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix (maps user space to the page)
    pub ctm: Matrix,
    /// Text matrix (maps text space to user space)
    pub text_matrix: Matrix,
    /// Text line matrix (saved position at start of line)
    pub text_line_matrix: Matrix,

    // Text state parameters
    /// Character spacing (Tc)
    pub char_space: f32,
    /// Word spacing (Tw)
    pub word_space: f32,
    /// Horizontal scaling percentage (Tz)
    pub horizontal_scaling: f32,
    /// Text leading (TL)
    pub leading: f32,
    /// Current font resource name
    pub font_name: Option<String>,
    /// Current font, once resolved
    pub font: Option<Rc<PdfFont>>,
    /// Current font size (Tf)
    pub font_size: f32,
    /// Text rise (Ts)
    pub text_rise: f32,
    /// Text rendering mode (Tr)
    pub render_mode: u8,

    // Color parameters
    /// Fill color space
    pub fill_space: ColorSpace,
    /// Stroke color space
    pub stroke_space: ColorSpace,
    /// Fill color (RGB, 0-1)
    pub fill_color: [f32; 3],
    /// Stroke color (RGB, 0-1)
    pub stroke_color: [f32; 3],

    // Line parameters
    /// Line width
    pub line_width: f32,
    /// Line dash pattern ([on1, off1, ...], phase); empty means solid
    pub dash_pattern: (Vec<f32>, f32),
    /// Line cap style (J): 0=butt, 1=round, 2=projecting square
    pub line_cap: u8,
    /// Line join style (j): 0=miter, 1=round, 2=bevel
    pub line_join: u8,
    /// Miter limit (M)
    pub miter_limit: f32,

    // Transparency parameters (from ExtGState)
    /// Fill alpha (ca)
    pub fill_alpha: f32,
    /// Stroke alpha (CA)
    pub stroke_alpha: f32,
}

impl GraphicsState {
    /// Create a new graphics state with PDF default values.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_retext::content::GraphicsState;
    ///
    /// let state = GraphicsState::new();
    /// assert_eq!(state.font_size, 12.0);
    /// assert_eq!(state.horizontal_scaling, 100.0);
    /// ```
    pub fn new() -> Self {
        Self {
            ctm: Matrix::identity(),
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            font_name: None,
            font: None,
            font_size: 12.0,
            text_rise: 0.0,
            render_mode: 0,
            fill_space: ColorSpace::Gray,
            stroke_space: ColorSpace::Gray,
            fill_color: [0.0, 0.0, 0.0],
            stroke_color: [0.0, 0.0, 0.0],
            line_width: 1.0,
            dash_pattern: (Vec::new(), 0.0),
            line_cap: 0,
            line_join: 0,
            miter_limit: 10.0,
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack of graphics states for save/restore operations.
///
/// `q` pushes a copy of the current state and `Q` pops it. Unbalanced `Q`
/// operators are ignored.
#[derive(Debug, Clone, Default)]
pub struct GraphicsStateStack {
    current: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl GraphicsStateStack {
    /// Create a new graphics state stack with an initial state.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_retext::content::GraphicsStateStack;
    ///
    /// let mut stack = GraphicsStateStack::new();
    /// stack.save();
    /// stack.current_mut().font_size = 20.0;
    /// stack.restore();
    /// stack.restore(); // no effect on an empty stack
    /// assert_eq!(stack.current().font_size, 12.0);
    /// assert_eq!(stack.depth(), 1);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a reference to the current graphics state.
    pub fn current(&self) -> &GraphicsState {
        &self.current
    }

    /// Get a mutable reference to the current graphics state.
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        &mut self.current
    }

    /// Save the current graphics state (q operator).
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Restore the previous graphics state (Q operator).
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.current = state;
        }
    }

    /// Get the current stack depth (always at least 1).
    pub fn depth(&self) -> usize {
        self.saved.len() + 1
    }
}
