//! 2D affine transforms.
//!
//! Compiles CSS/SVG transform lists such as
//! `translate(10, 5) rotate(45 5 5) scale(2)` into a single homogeneous
//! matrix. Malformed functions are skipped individually; the rest of the
//! list still applies.

use nalgebra::{Matrix3, Vector3};
use std::ops::Mul;
use svgtoolpath_core::Point;
use tracing::warn;

/// A 3×3 affine matrix with bottom row `[0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix3<f64>,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Builds from SVG `matrix(a, b, c, d, e, f)` arguments.
    pub fn from_svg_matrix(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            matrix: Matrix3::new(a, c, e, b, d, f, 0.0, 0.0, 1.0),
        }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::from_svg_matrix(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::from_svg_matrix(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `degrees` around the origin.
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::from_svg_matrix(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Rotation by `degrees` around `(cx, cy)`.
    pub fn rotate_around(degrees: f64, cx: f64, cy: f64) -> Self {
        Self::translate(cx, cy) * Self::rotate(degrees) * Self::translate(-cx, -cy)
    }

    /// Skew by `ax` degrees along X and `ay` degrees along Y.
    pub fn skew(ax: f64, ay: f64) -> Self {
        Self::from_svg_matrix(
            1.0,
            ay.to_radians().tan(),
            ax.to_radians().tan(),
            1.0,
            0.0,
            0.0,
        )
    }

    /// Parses a transform list. See [`parse_transform_list`].
    pub fn parse(transform: &str) -> Self {
        parse_transform_list(transform)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let v = self.matrix * Vector3::new(x, y, 1.0);
        (v.x, v.y)
    }

    pub fn apply_point(&self, point: Point) -> Point {
        let (x, y) = self.apply(point.x, point.y);
        Point::new(x, y)
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix3::identity()
    }

    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    /// `self · inner · self⁻¹`, i.e. `inner` expressed in the coordinate
    /// system this transform maps into. Identity when `self` is singular.
    pub fn conjugate(&self, inner: &AffineTransform) -> AffineTransform {
        match self.inverse() {
            Some(inverse) => *self * *inner * inverse,
            None => *inner,
        }
    }
}

impl Mul for AffineTransform {
    type Output = AffineTransform;

    fn mul(self, rhs: AffineTransform) -> AffineTransform {
        AffineTransform {
            matrix: self.matrix * rhs.matrix,
        }
    }
}

/// One parsed transform function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformFunction {
    /// No-op (`none`)
    None,
    /// Discard everything before (`initial`)
    Reset,
    Matrix([f64; 6]),
    Translate(f64, f64),
    Scale(f64, f64),
    Rotate { degrees: f64, cx: f64, cy: f64 },
    Skew(f64, f64),
}

impl TransformFunction {
    pub fn to_transform(&self) -> AffineTransform {
        match *self {
            TransformFunction::None | TransformFunction::Reset => AffineTransform::identity(),
            TransformFunction::Matrix([a, b, c, d, e, f]) => {
                AffineTransform::from_svg_matrix(a, b, c, d, e, f)
            }
            TransformFunction::Translate(x, y) => AffineTransform::translate(x, y),
            TransformFunction::Scale(x, y) => AffineTransform::scale(x, y),
            TransformFunction::Rotate { degrees, cx, cy } => {
                AffineTransform::rotate_around(degrees, cx, cy)
            }
            TransformFunction::Skew(ax, ay) => AffineTransform::skew(ax, ay),
        }
    }
}

/// Splits a transform list into functions, warning about and dropping the
/// malformed ones.
pub fn parse_transform_functions(transform: &str) -> Vec<TransformFunction> {
    let mut functions = Vec::new();
    let mut rest = transform;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let name_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        let name = rest[..name_len].to_ascii_lowercase();
        let after_name = rest[name_len..].trim_start();

        if !after_name.starts_with('(') {
            match name.as_str() {
                "none" => functions.push(TransformFunction::None),
                "initial" => functions.push(TransformFunction::Reset),
                _ => warn!(transform = %transform, token = %name, "Transform token is not a function call"),
            }
            if name_len == 0 {
                // Skip one stray character so the loop advances.
                let skip = rest.chars().next().map_or(1, char::len_utf8);
                rest = &rest[skip..];
            } else {
                rest = after_name;
            }
            continue;
        }

        let body_start = &after_name[1..];
        let Some(close) = body_start.find(')') else {
            warn!(transform = %transform, function = %name, "Unbalanced parenthesis in transform");
            break;
        };
        let body = &body_start[..close];
        rest = &body_start[close + 1..];

        if body.contains('(') {
            warn!(transform = %transform, function = %name, "Unbalanced parenthesis in transform");
            continue;
        }

        let args: Option<Vec<f64>> = body
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|token| token.parse::<f64>().ok().filter(|value| value.is_finite()))
            .collect();
        let Some(args) = args else {
            warn!(transform = %transform, function = %name, "Invalid number in transform arguments");
            continue;
        };

        match build_function(&name, &args) {
            Some(function) => functions.push(function),
            None => warn!(
                transform = %transform,
                function = %name,
                arguments = args.len(),
                "Unsupported transform function or wrong argument count"
            ),
        }
    }

    functions
}

fn build_function(name: &str, args: &[f64]) -> Option<TransformFunction> {
    use TransformFunction as F;
    let function = match (name, args) {
        ("matrix", &[a, b, c, d, e, f]) => F::Matrix([a, b, c, d, e, f]),
        ("translate", &[x]) => F::Translate(x, 0.0),
        ("translate", &[x, y]) => F::Translate(x, y),
        ("translatex", &[x]) => F::Translate(x, 0.0),
        ("translatey", &[y]) => F::Translate(0.0, y),
        ("scale", &[s]) => F::Scale(s, s),
        ("scale", &[x, y]) => F::Scale(x, y),
        ("scalex", &[x]) => F::Scale(x, 1.0),
        ("scaley", &[y]) => F::Scale(1.0, y),
        ("rotate" | "rotatez", &[degrees]) => F::Rotate {
            degrees,
            cx: 0.0,
            cy: 0.0,
        },
        ("rotate" | "rotatez", &[degrees, cx, cy]) => F::Rotate { degrees, cx, cy },
        ("skew", &[ax, ay]) => F::Skew(ax, ay),
        ("skewx", &[a]) => F::Skew(a, 0.0),
        ("skewy", &[a]) => F::Skew(0.0, a),
        _ => return None,
    };
    Some(function)
}

/// Compiles a transform list into one matrix, `M = M(f1)·…·M(fn)`.
pub fn parse_transform_list(transform: &str) -> AffineTransform {
    parse_transform_functions(transform)
        .iter()
        .fold(AffineTransform::identity(), |acc, function| match function {
            TransformFunction::Reset => AffineTransform::identity(),
            other => acc * other.to_transform(),
        })
}
