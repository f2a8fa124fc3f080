//! Unit conversion utilities
//!
//! Resolves CSS/SVG dimension tokens (`12pt`, `50%`, `3.5e1px`, `20vmin`, …)
//! to millimetres against the current viewport. Resolution never fails:
//! unparseable dimensions resolve to zero.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Signed decimal with optional exponent, as used by SVG attributes.
pub const NUMBER_PATTERN: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{}", NUMBER_PATTERN)).unwrap_or_else(|e| panic!("bad pattern: {e}"))
});

static ANY_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(NUMBER_PATTERN).unwrap_or_else(|e| panic!("bad pattern: {e}"))
});

const MM_PER_INCH: f64 = 25.4;

/// Which viewport dimension a length is measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
    /// Lengths without a direction (radii, stroke widths).
    Diagonal,
}

/// The coordinate system established by an `<svg>` element.
///
/// `viewport_*` is the user-space rectangle (the `viewBox`), `image_*` is its
/// physical size in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub viewport_x: f64,
    pub viewport_y: f64,
    pub viewport_w: f64,
    pub viewport_h: f64,
    pub image_w: f64,
    pub image_h: f64,
}

impl Viewport {
    /// A viewport spanning the build plate with one user unit per mm.
    pub fn for_build_area(width: f64, depth: f64) -> Self {
        Self {
            viewport_x: 0.0,
            viewport_y: 0.0,
            viewport_w: width,
            viewport_h: depth,
            image_w: width,
            image_h: depth,
        }
    }

    /// Millimetres per horizontal user unit.
    pub fn unit_w(&self) -> f64 {
        if self.viewport_w > 0.0 {
            self.image_w / self.viewport_w
        } else {
            1.0
        }
    }

    /// Millimetres per vertical user unit.
    pub fn unit_h(&self) -> f64 {
        if self.viewport_h > 0.0 {
            self.image_h / self.viewport_h
        } else {
            1.0
        }
    }

    /// Offset in mm that moves the viewBox origin onto the image origin.
    pub fn origin_offset(&self) -> (f64, f64) {
        (
            -self.viewport_x * self.unit_w(),
            -self.viewport_y * self.unit_h(),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::for_build_area(100.0, 100.0)
    }
}

/// Converts dimension tokens to millimetres for one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitResolver {
    pub viewport: Viewport,
}

impl UnitResolver {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn unit_w(&self) -> f64 {
        self.viewport.unit_w()
    }

    pub fn unit_h(&self) -> f64 {
        self.viewport.unit_h()
    }

    /// Converts a CSS dimension to millimetres.
    ///
    /// Pixels assume 96 dots per inch. `reference` overrides the size that
    /// percentages resolve against.
    pub fn convert_length(&self, dimension: &str, axis: Axis, reference: Option<f64>) -> f64 {
        let Some((number, unit)) = split_dimension(dimension) else {
            return 0.0;
        };
        let vp = &self.viewport;

        match unit.to_ascii_lowercase().as_str() {
            "mm" => number,
            "px" => number / 96.0 * MM_PER_INCH,
            "cm" => number * 10.0,
            "q" => number / 4.0,
            "in" => number * MM_PER_INCH,
            "pc" => number * 12.0 / 72.0 * MM_PER_INCH,
            "pt" => number / 72.0 * MM_PER_INCH,
            "%" => {
                let size = reference.unwrap_or(match axis {
                    Axis::Horizontal => vp.image_w,
                    Axis::Vertical => vp.image_h,
                    Axis::Diagonal => {
                        ((vp.image_w * vp.image_w + vp.image_h * vp.image_h) / 2.0).sqrt()
                    }
                });
                number / 100.0 * size
            }
            "vh" | "vb" => number / 100.0 * vp.image_w,
            "vw" | "vi" => number / 100.0 * vp.image_h,
            "vmin" => number / 100.0 * vp.image_w.min(vp.image_h),
            "vmax" => number / 100.0 * vp.image_w.max(vp.image_h),
            // Unit-less and unrecognised units are user units.
            _ => match axis {
                Axis::Vertical => number * vp.unit_h(),
                Axis::Horizontal | Axis::Diagonal => number * vp.unit_w(),
            },
        }
    }

    /// Horizontal length shorthand.
    pub fn horizontal(&self, dimension: &str) -> f64 {
        self.convert_length(dimension, Axis::Horizontal, None)
    }

    /// Vertical length shorthand.
    pub fn vertical(&self, dimension: &str) -> f64 {
        self.convert_length(dimension, Axis::Vertical, None)
    }

    /// Direction-less length shorthand.
    pub fn diagonal(&self, dimension: &str) -> f64 {
        self.convert_length(dimension, Axis::Diagonal, None)
    }
}

/// Splits `"12.5mm"` into `(12.5, "mm")`. Returns `None` without a leading number.
pub fn split_dimension(dimension: &str) -> Option<(f64, &str)> {
    let trimmed = dimension.trim();
    let found = LEADING_NUMBER.find(trimmed)?;
    let number = found.as_str().parse::<f64>().ok()?;
    Some((number, trimmed[found.end()..].trim()))
}

/// Returns `true` if the whole string is a single number with an optional unit.
pub fn is_dimension(value: &str) -> bool {
    match split_dimension(value) {
        Some((_, unit)) => unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%'),
        None => false,
    }
}

/// Extracts every well-formed number from a string, skipping garbage between them.
pub fn parse_numbers(text: &str) -> Vec<f64> {
    ANY_NUMBER
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}
