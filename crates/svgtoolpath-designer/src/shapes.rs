//! Outline construction for the basic shapes.
//!
//! Every shape is expressed as a list of [`PathPrimitive`]s in local
//! millimetres and then emitted through the same code path as `<path>`.

use crate::compiler::ShapeCompiler;
use crate::document::StyledElement;
use crate::path::{interpret_path, PathPrimitive};
use svgtoolpath_core::units::{parse_numbers, Axis};
use svgtoolpath_core::Point;
use tracing::{debug, warn};

/// Outline of a rectangle with optionally rounded corners, clockwise from
/// the end of the top-left corner.
pub fn rect_outline(x: f64, y: f64, width: f64, height: f64, rx: f64, ry: f64) -> Vec<PathPrimitive> {
    let rx = rx.clamp(0.0, width / 2.0);
    let ry = ry.clamp(0.0, height / 2.0);
    let corner = |to: Point| PathPrimitive::Arc {
        rx,
        ry,
        rotation: 0.0,
        large_arc: false,
        sweep: true,
        to,
    };
    let line = |to: Point| PathPrimitive::Line { to };

    vec![
        PathPrimitive::Move {
            to: Point::new(x + rx, y),
        },
        line(Point::new(x + width - rx, y)),
        corner(Point::new(x + width, y + ry)),
        line(Point::new(x + width, y + height - ry)),
        corner(Point::new(x + width - rx, y + height)),
        line(Point::new(x + rx, y + height)),
        corner(Point::new(x, y + height - ry)),
        line(Point::new(x, y + ry)),
        corner(Point::new(x + rx, y)),
        PathPrimitive::Close,
    ]
}

/// Outline of an axis-aligned ellipse as four quarter arcs.
pub fn ellipse_outline(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<PathPrimitive> {
    let quarter = |to: Point| PathPrimitive::Arc {
        rx,
        ry,
        rotation: 0.0,
        large_arc: false,
        sweep: false,
        to,
    };
    vec![
        PathPrimitive::Move {
            to: Point::new(cx + rx, cy),
        },
        quarter(Point::new(cx, cy - ry)),
        quarter(Point::new(cx - rx, cy)),
        quarter(Point::new(cx, cy + ry)),
        quarter(Point::new(cx + rx, cy)),
        PathPrimitive::Close,
    ]
}

/// Outline through a list of vertices. Closed outlines return to the first
/// vertex.
pub fn poly_outline(vertices: &[Point], closed: bool) -> Vec<PathPrimitive> {
    let Some((first, rest)) = vertices.split_first() else {
        return Vec::new();
    };
    let mut outline = Vec::with_capacity(vertices.len() + 1);
    outline.push(PathPrimitive::Move { to: *first });
    outline.extend(rest.iter().map(|&to| PathPrimitive::Line { to }));
    if closed {
        outline.push(PathPrimitive::Close);
    }
    outline
}

impl ShapeCompiler<'_> {
    fn emit_shape(&mut self, element: &StyledElement, outline: &[PathPrimitive]) {
        let transform = self.transform_of(element);
        let line_width = self.line_width_of(element);
        self.emit_primitives(outline, &transform, line_width);
    }

    pub(crate) fn compile_rect(&mut self, element: &StyledElement) {
        let x = self.length_attr(element, "x", Axis::Horizontal, 0.0);
        let y = self.length_attr(element, "y", Axis::Vertical, 0.0);
        let width = self.length_attr(element, "width", Axis::Horizontal, 0.0);
        let height = self.length_attr(element, "height", Axis::Vertical, 0.0);
        if width <= 0.0 || height <= 0.0 {
            if width < 0.0 || height < 0.0 {
                warn!(width, height, "Rectangle with negative size");
            }
            return;
        }

        let radius = |name: &str, axis: Axis| match element.attr(name).map(str::trim) {
            None | Some("auto") => None,
            Some(value) => Some(self.resolver().convert_length(value, axis, None)),
        };
        let (rx, ry) = match (radius("rx", Axis::Horizontal), radius("ry", Axis::Vertical)) {
            (Some(rx), Some(ry)) => (rx, ry),
            (Some(r), None) | (None, Some(r)) => (r, r),
            (None, None) => (0.0, 0.0),
        };

        let outline = rect_outline(x, y, width, height, rx, ry);
        self.emit_shape(element, &outline);
    }

    pub(crate) fn compile_circle(&mut self, element: &StyledElement) {
        let cx = self.length_attr(element, "cx", Axis::Horizontal, 0.0);
        let cy = self.length_attr(element, "cy", Axis::Vertical, 0.0);
        let r = self.length_attr(element, "r", Axis::Diagonal, 0.0);
        if r <= 0.0 {
            debug!(r, "Skipping circle without radius");
            return;
        }
        let outline = ellipse_outline(cx, cy, r, r);
        self.emit_shape(element, &outline);
    }

    pub(crate) fn compile_ellipse(&mut self, element: &StyledElement) {
        let cx = self.length_attr(element, "cx", Axis::Horizontal, 0.0);
        let cy = self.length_attr(element, "cy", Axis::Vertical, 0.0);
        let rx = self.length_attr(element, "rx", Axis::Horizontal, 0.0);
        let ry = self.length_attr(element, "ry", Axis::Vertical, 0.0);
        if rx <= 0.0 || ry <= 0.0 {
            debug!(rx, ry, "Skipping ellipse without radius");
            return;
        }
        let outline = ellipse_outline(cx, cy, rx, ry);
        self.emit_shape(element, &outline);
    }

    pub(crate) fn compile_line(&mut self, element: &StyledElement) {
        let start = Point::new(
            self.length_attr(element, "x1", Axis::Horizontal, 0.0),
            self.length_attr(element, "y1", Axis::Vertical, 0.0),
        );
        let end = Point::new(
            self.length_attr(element, "x2", Axis::Horizontal, 0.0),
            self.length_attr(element, "y2", Axis::Vertical, 0.0),
        );
        self.emit_shape(element, &poly_outline(&[start, end], false));
    }

    /// `<polygon>` when `closed`, `<polyline>` otherwise.
    pub(crate) fn compile_poly(&mut self, element: &StyledElement, closed: bool) {
        let numbers = parse_numbers(element.attr_or("points", ""));
        if numbers.len() % 2 == 1 {
            warn!(element = %element.tag, "Odd number of coordinates in points; dropping the last one");
        }
        let resolver = self.resolver();
        let vertices: Vec<Point> = numbers
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0] * resolver.unit_w(), pair[1] * resolver.unit_h()))
            .collect();
        if vertices.len() < 2 {
            debug!(element = %element.tag, "Skipping shape with fewer than two vertices");
            return;
        }
        self.emit_shape(element, &poly_outline(&vertices, closed));
    }

    pub(crate) fn compile_path(&mut self, element: &StyledElement) {
        let resolver = self.resolver();
        let primitives = interpret_path(element.attr_or("d", ""), resolver.unit_w(), resolver.unit_h());
        self.emit_shape(element, &primitives);
    }
}
