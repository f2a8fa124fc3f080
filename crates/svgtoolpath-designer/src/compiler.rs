//! Depth-first compilation of the element tree into toolpath commands.
//!
//! [`ShapeCompiler`] owns the traversal state: the stack of viewports opened
//! by nested `<svg>` elements, the transform contributed by their viewBox
//! origins, and the command list being built. Shape-specific code lives in
//! [`crate::shapes`] and [`crate::text`].

use crate::document::StyledElement;
use crate::flatten::{EllipticalArc, CurveFlattener};
use crate::path::PathPrimitive;
use crate::style::{ResolvedStyle, StyleMap};
use crate::text::FontProvider;
use crate::transform::AffineTransform;
use svgtoolpath_core::units::{parse_numbers, Axis, UnitResolver, Viewport};
use svgtoolpath_core::{Command, Point};
use tracing::{debug, warn};

const FEATURE_PREFIX: &str = "http://www.w3.org/TR/SVG11/feature#";

/// SVG 1.1 feature strings honoured by `requiredFeatures`.
const SUPPORTED_FEATURES: &[&str] = &[
    "SVG",
    "SVGDOM",
    "SVG-static",
    "SVGDOM-static",
    "Structure",
    "BasicStructure",
    "ConditionalProcessing",
    "Shape",
    "PaintAttribute",
    "BasicPaintAttribute",
    "ColorProfile",
    "Gradient",
];

/// Elements that never produce output.
const SILENT_ELEMENTS: &[&str] = &["defs", "style", "title", "desc", "metadata", "symbol", "use"];

/// Whether every feature listed in `requiredFeatures` is supported.
pub fn features_supported(element: &StyledElement) -> bool {
    let Some(features) = element.attr("requiredFeatures") else {
        return true;
    };
    features
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|feature| !feature.is_empty())
        .all(|feature| {
            feature
                .strip_prefix(FEATURE_PREFIX)
                .is_some_and(|name| SUPPORTED_FEATURES.contains(&name))
        })
}

fn parse_view_box(value: &str) -> Option<[f64; 4]> {
    match parse_numbers(value).as_slice() {
        &[x, y, w, h] if w > 0.0 && h > 0.0 => Some([x, y, w, h]),
        _ => None,
    }
}

/// Viewport opened by an `<svg>` element inside `parent`.
///
/// Without a usable `viewBox` the new viewport keeps the parent's scale.
pub fn viewport_of(element: &StyledElement, parent: &UnitResolver) -> Viewport {
    let image_w = parent.convert_length(element.attr_or("width", "100%"), Axis::Horizontal, None);
    let image_h = parent.convert_length(element.attr_or("height", "100%"), Axis::Vertical, None);

    match element.attr("viewBox").and_then(parse_view_box) {
        Some([x, y, w, h]) => Viewport {
            viewport_x: x,
            viewport_y: y,
            viewport_w: w,
            viewport_h: h,
            image_w,
            image_h,
        },
        None => Viewport {
            viewport_x: 0.0,
            viewport_y: 0.0,
            viewport_w: image_w / parent.unit_w(),
            viewport_h: image_h / parent.unit_h(),
            image_w,
            image_h,
        },
    }
}

/// Walks a styled tree and accumulates travel/extrude commands.
pub struct ShapeCompiler<'a> {
    pub(crate) styles: &'a StyleMap,
    resolvers: Vec<UnitResolver>,
    /// Contribution of enclosing viewBox origins, applied outside each
    /// element's own transform
    outer: AffineTransform,
    pub(crate) flattener: CurveFlattener,
    pub(crate) fonts: Option<&'a dyn FontProvider>,
    commands: Vec<Command>,
    fallback_style: ResolvedStyle,
}

impl<'a> ShapeCompiler<'a> {
    /// `viewport` is the area percentages of the root `<svg>` resolve
    /// against, normally the build plate.
    pub fn new(
        styles: &'a StyleMap,
        viewport: Viewport,
        resolution: f64,
        fonts: Option<&'a dyn FontProvider>,
    ) -> Self {
        Self {
            styles,
            resolvers: vec![UnitResolver::new(viewport)],
            outer: AffineTransform::identity(),
            flattener: CurveFlattener::new(resolution),
            fonts,
            commands: Vec::new(),
            fallback_style: ResolvedStyle::default(),
        }
    }

    /// Compiles a root `<svg>` element.
    pub fn compile_root(&mut self, root: &StyledElement) {
        if features_supported(root) {
            self.compile_svg(root, true);
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    pub(crate) fn resolver(&self) -> UnitResolver {
        self.resolvers.last().copied().unwrap_or_default()
    }

    pub(crate) fn style_of(&self, element: &StyledElement) -> &ResolvedStyle {
        self.styles.get(element.id).unwrap_or(&self.fallback_style)
    }

    /// Full transform of an element, from its local space to output space.
    pub(crate) fn transform_of(&self, element: &StyledElement) -> AffineTransform {
        self.outer * AffineTransform::parse(&self.style_of(element).transform)
    }

    /// Stroke width of an element in mm.
    pub(crate) fn line_width_of(&self, element: &StyledElement) -> f64 {
        let stroke_width = &self.style_of(element).stroke_width;
        self.resolver()
            .convert_length(stroke_width, Axis::Diagonal, None)
    }

    /// Length attribute in mm, `default` when missing.
    pub(crate) fn length_attr(&self, element: &StyledElement, name: &str, axis: Axis, default: f64) -> f64 {
        match element.attr(name) {
            Some(value) => self.resolver().convert_length(value, axis, None),
            None => default,
        }
    }

    pub(crate) fn compile_element(&mut self, element: &StyledElement) {
        if !element.in_svg_namespace {
            debug!(element = %element.tag, "Skipping element from a foreign namespace");
            return;
        }
        if !features_supported(element) {
            debug!(element = %element.tag, "Skipping element with unsupported required features");
            return;
        }

        match element.tag.as_str() {
            "svg" => self.compile_svg(element, false),
            "g" | "a" => self.compile_children(element),
            "switch" => self.compile_switch(element),
            "rect" => self.compile_rect(element),
            "circle" => self.compile_circle(element),
            "ellipse" => self.compile_ellipse(element),
            "line" => self.compile_line(element),
            "polygon" => self.compile_poly(element, true),
            "polyline" => self.compile_poly(element, false),
            "path" => self.compile_path(element),
            "text" => self.compile_text(element),
            tag if SILENT_ELEMENTS.contains(&tag) => {}
            tag => warn!(element = %tag, "Unsupported element kind"),
        }
    }

    fn compile_children(&mut self, element: &StyledElement) {
        for child in &element.children {
            self.compile_element(child);
        }
    }

    fn compile_switch(&mut self, element: &StyledElement) {
        let chosen = element.children.iter().find(|child| {
            child.in_svg_namespace
                && features_supported(child)
                && child.attr("requiredExtensions").is_none()
        });
        if let Some(child) = chosen {
            self.compile_element(child);
        }
    }

    /// Opens a new viewport for an `<svg>` element, compiles its children
    /// and restores the enclosing viewport.
    fn compile_svg(&mut self, element: &StyledElement, is_root: bool) {
        if element.attr("viewBox").is_some_and(|v| parse_view_box(v).is_none()) {
            warn!(view_box = ?element.attr("viewBox"), "Ignoring malformed viewBox");
        }
        let viewport = viewport_of(element, &self.resolver());

        let (x, y) = if is_root {
            (0.0, 0.0)
        } else {
            (
                self.length_attr(element, "x", Axis::Horizontal, 0.0),
                self.length_attr(element, "y", Axis::Vertical, 0.0),
            )
        };
        let (origin_x, origin_y) = viewport.origin_offset();
        let shift = AffineTransform::translate(x + origin_x, y + origin_y);
        let own = AffineTransform::parse(&self.style_of(element).transform);

        debug!(
            image_w = viewport.image_w,
            image_h = viewport.image_h,
            unit_w = viewport.unit_w(),
            unit_h = viewport.unit_h(),
            "Entering viewport"
        );

        let saved_outer = self.outer;
        self.outer = saved_outer * own.conjugate(&shift);
        self.resolvers.push(UnitResolver::new(viewport));
        self.compile_children(element);
        self.resolvers.pop();
        self.outer = saved_outer;
    }

    pub(crate) fn travel(&mut self, point: Point) {
        self.commands.push(Command::travel(point.x, point.y));
    }

    pub(crate) fn extrude(&mut self, point: Point, line_width: f64) {
        self.commands.push(Command::extrude(point.x, point.y, line_width));
    }

    /// Emits the toolpath of a primitive list given in local coordinates.
    pub(crate) fn emit_primitives(
        &mut self,
        primitives: &[PathPrimitive],
        transform: &AffineTransform,
        line_width: f64,
    ) {
        let mut current = Point::new(0.0, 0.0);
        let mut subpath_start = current;
        let mut pen_placed = false;

        for primitive in primitives {
            if let PathPrimitive::Move { to } = *primitive {
                self.travel(transform.apply_point(to));
                current = to;
                subpath_start = to;
                pen_placed = true;
                continue;
            }
            if *primitive == PathPrimitive::Close {
                if pen_placed && current != subpath_start {
                    self.extrude(transform.apply_point(subpath_start), line_width);
                }
                current = subpath_start;
                continue;
            }

            if !pen_placed {
                self.travel(transform.apply_point(current));
                subpath_start = current;
                pen_placed = true;
            }

            let (points, to) = match *primitive {
                PathPrimitive::Line { to } => {
                    if to == current {
                        continue;
                    }
                    (vec![transform.apply_point(to)], to)
                }
                PathPrimitive::Cubic { h1, h2, to } => {
                    (self.flattener.cubic(current, h1, h2, to, transform), to)
                }
                PathPrimitive::Quadratic { h, to } => {
                    (self.flattener.quadratic(current, h, to, transform), to)
                }
                PathPrimitive::Arc {
                    rx,
                    ry,
                    rotation,
                    large_arc,
                    sweep,
                    to,
                } => {
                    let arc = EllipticalArc {
                        start: current,
                        rx,
                        ry,
                        rotation,
                        large_arc,
                        sweep,
                        end: to,
                    };
                    (self.flattener.arc(&arc, transform), to)
                }
                PathPrimitive::Move { .. } | PathPrimitive::Close => continue,
            };
            for point in points {
                self.extrude(point, line_width);
            }
            current = to;
        }
    }
}
