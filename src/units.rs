//! Coordinate values and unit conversion.
//!
//! OFD coordinates are millimetres. Conversion to device pixels goes through
//! an explicit [`UnitConverter`] owned by the caller.

use serde::Serialize;

const MM_PER_INCH: f64 = 25.4;

/// Converts millimetres to device pixels at a fixed scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitConverter {
    /// Pixels per millimetre.
    scale: f64,
}

impl Default for UnitConverter {
    /// 96 DPI.
    fn default() -> Self {
        Self::from_dpi(96.0)
    }
}

impl UnitConverter {
    /// Creates a converter from dots per inch.
    pub fn from_dpi(dpi: f64) -> Self {
        Self {
            scale: dpi / MM_PER_INCH,
        }
    }

    /// Creates a converter from pixels per millimetre.
    pub fn with_scale(scale: f64) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dpi(&self) -> f64 {
        self.scale * MM_PER_INCH
    }

    pub fn mm_to_px(&self, mm: f64) -> f64 {
        mm * self.scale
    }

    pub fn px_to_mm(&self, px: f64) -> f64 {
        if self.scale == 0.0 {
            0.0
        } else {
            px / self.scale
        }
    }

    /// Converts a rectangle to pixels.
    pub fn rect_to_px(&self, rect: &Rect) -> Rect {
        Rect {
            x: self.mm_to_px(rect.x),
            y: self.mm_to_px(rect.y),
            width: self.mm_to_px(rect.width),
            height: self.mm_to_px(rect.height),
        }
    }
}

/// A box such as `Boundary` or `PhysicalBox`: `x y width height`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Parses four space-separated numbers.
    pub fn parse(value: &str) -> Option<Self> {
        match parse_numbers(value)?.as_slice() {
            [x, y, width, height] => Some(Self {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            }),
            _ => None,
        }
    }
}

/// A `CTM` transformation matrix `a b c d e f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ctm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Ctm {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl Ctm {
    /// Parses six space-separated numbers.
    pub fn parse(value: &str) -> Option<Self> {
        match parse_numbers(value)?.as_slice() {
            [a, b, c, d, e, f] => Some(Self {
                a: *a,
                b: *b,
                c: *c,
                d: *d,
                e: *e,
                f: *f,
            }),
            _ => None,
        }
    }

    /// Applies the matrix to a point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

fn parse_numbers(value: &str) -> Option<Vec<f64>> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok())
        .collect()
}
