//! Curve flattening.
//!
//! Arcs and Bézier curves are walked in output (transformed) space: each
//! emitted point lies one `resolution` step from the previous one, found by
//! bisecting the curve parameter until the step is within 1 µm of the target.
//! The final point is always the exact transformed endpoint.

use crate::transform::AffineTransform;
use std::f64::consts::TAU;
use svgtoolpath_core::Point;

/// Allowed deviation of a step from the target length, in mm.
pub const STEP_TOLERANCE: f64 = 0.001;

/// Flattens curves to polylines with segments of about `resolution` mm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFlattener {
    pub resolution: f64,
}

/// Endpoint-parameterized elliptical arc, as in path data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticalArc {
    pub start: Point,
    pub rx: f64,
    pub ry: f64,
    /// Rotation of the ellipse's X axis in degrees
    pub rotation: f64,
    pub large_arc: bool,
    pub sweep: bool,
    pub end: Point,
}

struct EllipseParams {
    center: Point,
    rx: f64,
    ry: f64,
    sin_rot: f64,
    cos_rot: f64,
    start_angle: f64,
    delta_angle: f64,
}

impl EllipseParams {
    fn point_at(&self, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        let x = cos * self.rx;
        let y = sin * self.ry;
        Point::new(
            self.cos_rot * x - self.sin_rot * y + self.center.x,
            self.sin_rot * x + self.cos_rot * y + self.center.y,
        )
    }
}

impl CurveFlattener {
    pub fn new(resolution: f64) -> Self {
        Self { resolution }
    }

    fn is_usable(&self) -> bool {
        self.resolution > 0.0 && self.resolution.is_finite()
    }

    fn within_step(&self, a: Point, b: Point) -> bool {
        a.distance_squared_to(&b) <= self.resolution * self.resolution
    }

    /// Flattens an elliptical arc. Returns transformed points after `start`.
    pub fn arc(&self, arc: &EllipticalArc, transform: &AffineTransform) -> Vec<Point> {
        if arc.start == arc.end {
            return Vec::new();
        }
        let end_t = transform.apply_point(arc.end);
        let rx = arc.rx.abs();
        let ry = arc.ry.abs();
        if rx == 0.0 || ry == 0.0 || !self.is_usable() {
            return vec![end_t];
        }
        let start_t = transform.apply_point(arc.start);
        if self.within_step(start_t, end_t) {
            return vec![end_t];
        }

        let Some(ellipse) = center_parameterization(arc, rx, ry) else {
            return vec![end_t];
        };

        let mut points = Vec::new();
        let mut angle = ellipse.start_angle;
        let end_angle = ellipse.start_angle + ellipse.delta_angle;
        let mut current_t = start_t;

        while !self.within_step(current_t, end_t) {
            let mut lower = angle;
            let mut upper = end_angle;
            let mut candidate_angle = angle;
            let mut candidate_t = current_t;
            loop {
                let mid = (lower + upper) / 2.0;
                if mid == lower || mid == upper {
                    break;
                }
                candidate_angle = mid;
                candidate_t = transform.apply_point(ellipse.point_at(mid));
                let error = current_t.distance_to(&candidate_t) - self.resolution;
                if error.abs() <= STEP_TOLERANCE {
                    break;
                }
                if error > 0.0 {
                    upper = mid;
                } else {
                    lower = mid;
                }
            }
            if candidate_t == current_t {
                break;
            }
            points.push(candidate_t);
            current_t = candidate_t;
            angle = candidate_angle;
        }

        points.push(end_t);
        points
    }

    /// Flattens a cubic Bézier. Returns transformed points after `start`.
    pub fn cubic(
        &self,
        start: Point,
        h1: Point,
        h2: Point,
        end: Point,
        transform: &AffineTransform,
    ) -> Vec<Point> {
        let at = |t: f64| cubic_point(start, h1, h2, end, t);
        // Biasing toward the low end keeps the search on the near side of a
        // self-intersecting loop.
        self.bisect_curve(start, end, transform, at, |lo, hi| (3.0 * lo + hi) / 4.0)
    }

    /// Flattens a quadratic Bézier. Returns transformed points after `start`.
    pub fn quadratic(
        &self,
        start: Point,
        handle: Point,
        end: Point,
        transform: &AffineTransform,
    ) -> Vec<Point> {
        if is_on_chord(start, handle, end) {
            return vec![transform.apply_point(end)];
        }
        let at = |t: f64| quadratic_point(start, handle, end, t);
        self.bisect_curve(start, end, transform, at, |lo, hi| (lo + hi) / 2.0)
    }

    fn bisect_curve(
        &self,
        start: Point,
        end: Point,
        transform: &AffineTransform,
        at: impl Fn(f64) -> Point,
        split: impl Fn(f64, f64) -> f64,
    ) -> Vec<Point> {
        let end_t = transform.apply_point(end);
        if !self.is_usable() {
            return vec![end_t];
        }

        let mut points = Vec::new();
        let mut current_t = transform.apply_point(start);
        let mut t_current = 0.0;

        while !self.within_step(current_t, end_t) {
            let mut lower = t_current;
            let mut upper = 1.0;
            let mut candidate = t_current;
            let mut candidate_t = current_t;
            loop {
                let t = split(lower, upper);
                if t == lower || t == upper {
                    break;
                }
                candidate = t;
                candidate_t = transform.apply_point(at(t));
                let error = current_t.distance_to(&candidate_t) - self.resolution;
                if error.abs() <= STEP_TOLERANCE {
                    break;
                }
                if error > 0.0 {
                    upper = t;
                } else {
                    lower = t;
                }
            }
            if candidate <= t_current || candidate_t == current_t {
                break;
            }
            points.push(candidate_t);
            current_t = candidate_t;
            t_current = candidate;
        }

        points.push(end_t);
        points
    }
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let a = lerp(p0, p1, t);
    let b = lerp(p1, p2, t);
    let c = lerp(p2, p3, t);
    lerp(lerp(a, b, t), lerp(b, c, t), t)
}

fn quadratic_point(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    lerp(lerp(p0, p1, t), lerp(p1, p2, t), t)
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y))
}

/// Whether `handle` lies exactly on the segment from `start` to `end`.
fn is_on_chord(start: Point, handle: Point, end: Point) -> bool {
    let cross = (handle.x - start.x) * (end.y - start.y) - (handle.y - start.y) * (end.x - start.x);
    if cross != 0.0 {
        return false;
    }
    let within = |a: f64, v: f64, b: f64| (a <= v && v <= b) || (b <= v && v <= a);
    within(start.x, handle.x, end.x) && within(start.y, handle.y, end.y)
}

/// Endpoint to center conversion, following the SVG implementation notes.
/// Radii too small to reach the endpoint are scaled up.
fn center_parameterization(arc: &EllipticalArc, rx: f64, ry: f64) -> Option<EllipseParams> {
    let (sin_rot, cos_rot) = arc.rotation.to_radians().sin_cos();
    let dx = (arc.start.x - arc.end.x) / 2.0;
    let dy = (arc.start.y - arc.end.y) / 2.0;
    let x1 = cos_rot * dx + sin_rot * dy;
    let y1 = -sin_rot * dx + cos_rot * dy;

    let mut rx = rx;
    let mut ry = ry;
    let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
    if lambda > 1.0 {
        let scale = lambda.sqrt();
        rx *= scale;
        ry *= scale;
    }

    let sum_squares = rx * rx * y1 * y1 + ry * ry * x1 * x1;
    if sum_squares == 0.0 {
        return None;
    }
    let mut coefficient = ((rx * rx * ry * ry - sum_squares) / sum_squares).abs().sqrt();
    if arc.large_arc == arc.sweep {
        coefficient = -coefficient;
    }
    let cx1 = coefficient * rx * y1 / ry;
    let cy1 = -coefficient * ry * x1 / rx;
    let center = Point::new(
        cos_rot * cx1 - sin_rot * cy1 + (arc.start.x + arc.end.x) / 2.0,
        sin_rot * cx1 + cos_rot * cy1 + (arc.start.y + arc.end.y) / 2.0,
    );

    let ux = (x1 - cx1) / rx;
    let uy = (y1 - cy1) / ry;
    let vx = (-x1 - cx1) / rx;
    let vy = (-y1 - cy1) / ry;

    let start_angle = uy.atan2(ux);
    let mut delta_angle = (ux * vy - uy * vx).atan2(ux * vx + uy * vy);
    delta_angle = delta_angle.rem_euclid(TAU);
    if !arc.sweep {
        delta_angle -= TAU;
    }
    if !delta_angle.is_finite() || !start_angle.is_finite() {
        return None;
    }

    Some(EllipseParams {
        center,
        rx,
        ry,
        sin_rot,
        cos_rot,
        start_angle,
        delta_angle,
    })
}
