//! Coordinate normalization and the canvas/PDF transforms.
//!
//! Editor coordinates have their origin at the page top-left with Y growing
//! downwards. PDF user space has its origin at the bottom-left with Y growing
//! upwards. [`canvas_to_pdf_y`] is the only place where that flip happens.

/// Number of decimal digits kept by [`normalize`].
pub const NORMALIZE_DIGITS: i32 = 15;

/// Fraction of the font size between the bottom of a text box and the baseline.
pub const BASELINE_FACTOR: f64 = 0.2;

// Above this magnitude every f64 is already an integer, so scaling and
// rounding would only add error.
const EXACT_LIMIT: f64 = 4_503_599_627_370_496.0; // 2^52

/// Round `value` to a fixed 15-decimal resolution.
///
/// Values whose float spacing is already coarser than that resolution are
/// returned unchanged, which keeps the function idempotent.
pub fn normalize(value: f64) -> f64 {
    let factor = 10f64.powi(NORMALIZE_DIGITS);
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= EXACT_LIMIT {
        return value;
    }
    scaled.round() / factor
}

/// `normalize(value * scale + offset)`
pub fn transform(value: f64, scale: f64, offset: f64) -> f64 {
    normalize(value * scale + offset)
}

/// Baseline for text drawn inside a box in a Y-down space.
pub fn text_baseline(field_y: f64, field_height: f64, font_size: f64) -> f64 {
    normalize(field_y + field_height - font_size * BASELINE_FACTOR)
}

/// Convert the top edge of a box in editor space to the bottom edge in PDF space.
pub fn canvas_to_pdf_y(canvas_y: f64, box_height: f64, page_height: f64) -> f64 {
    normalize(page_height - canvas_y - box_height)
}

/// A point in PDF user space (Y up).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

/// Axis aligned box. `y` is the bottom edge in PDF space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Rect {
        Rect { x, y, width, height }
    }
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
    /// Length of the shorter side.
    pub fn size(&self) -> f64 {
        self.width.min(self.height)
    }
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}
