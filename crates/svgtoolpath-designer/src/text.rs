//! Text outlines.
//!
//! Glyph contours come from an [`OutlineSource`] in font units (y up) as
//! lists of tagged points. They are decoded into path primitives, laid out
//! along the pen with kerning, scaled to the font size and emitted like any
//! other closed path.

use crate::compiler::ShapeCompiler;
use crate::document::StyledElement;
use crate::path::PathPrimitive;
use std::sync::Arc;
use svgtoolpath_core::units::{split_dimension, Axis};
use svgtoolpath_core::Point;
use tracing::{debug, warn};

/// Tag bit set on points that lie on the outline.
pub const TAG_ON_CURVE: u8 = 0b01;
/// Tag bit set on off-curve points that are cubic (not quadratic) controls.
pub const TAG_CUBIC: u8 = 0b10;

/// A point of a glyph contour in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlinePoint {
    pub x: f64,
    pub y: f64,
    pub tag: u8,
}

impl OutlinePoint {
    pub fn on(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            tag: TAG_ON_CURVE,
        }
    }

    pub fn quadratic(x: f64, y: f64) -> Self {
        Self { x, y, tag: 0 }
    }

    pub fn cubic(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            tag: TAG_CUBIC,
        }
    }

    pub fn is_on_curve(&self) -> bool {
        self.tag & TAG_ON_CURVE != 0
    }

    pub fn is_cubic_control(&self) -> bool {
        !self.is_on_curve() && self.tag & TAG_CUBIC != 0
    }

    fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Contours and horizontal advance of one glyph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphOutline {
    pub contours: Vec<Vec<OutlinePoint>>,
    pub advance: f64,
}

/// A loaded font face that can produce glyph outlines.
pub trait OutlineSource: Send + Sync {
    fn units_per_em(&self) -> f64;

    /// Outline of a character, `None` when the face has no glyph for it.
    fn glyph(&self, ch: char) -> Option<GlyphOutline>;

    /// Kerning adjustment between two consecutive characters in font units.
    fn kerning(&self, left: char, right: char) -> f64;
}

/// Resolves a CSS font request to a loaded face.
pub trait FontProvider {
    /// `families` is the raw comma separated `font-family` list.
    fn outline_source(&self, families: &str, weight: u16, italic: bool) -> Option<Arc<dyn OutlineSource>>;
}

/// Applies a CSS `text-transform` to already collapsed text.
pub fn apply_text_transform(text: &str, transform: &str) -> String {
    match transform {
        "uppercase" => text.to_uppercase(),
        "lowercase" => text.to_lowercase(),
        "capitalize" => {
            let mut out = String::with_capacity(text.len());
            let mut word_start = true;
            for ch in text.chars() {
                if word_start && ch.is_alphabetic() {
                    out.extend(ch.to_uppercase());
                } else {
                    out.push(ch);
                }
                word_start = ch.is_whitespace();
            }
            out
        }
        _ => text.to_string(),
    }
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Decodes one glyph contour into primitives, starting with a move and
/// ending with a close. Coordinates are passed through `map`.
pub fn decode_contour(contour: &[OutlinePoint], map: impl Fn(Point) -> Point) -> Vec<PathPrimitive> {
    if contour.is_empty() {
        return Vec::new();
    }

    // Start on an on-curve point, or on the implied midpoint between the
    // last and first controls when there is none.
    let (start, sequence): (Point, Vec<OutlinePoint>) =
        match contour.iter().position(OutlinePoint::is_on_curve) {
            Some(first_on) => {
                let mut rotated = Vec::with_capacity(contour.len());
                rotated.extend_from_slice(&contour[first_on + 1..]);
                rotated.extend_from_slice(&contour[..first_on]);
                (contour[first_on].position(), rotated)
            }
            None => {
                let last = contour[contour.len() - 1].position();
                (midpoint(last, contour[0].position()), contour.to_vec())
            }
        };

    let mut primitives = vec![PathPrimitive::Move { to: map(start) }];
    let mut pending: Vec<Point> = Vec::new();
    let mut pending_cubic = false;

    let closing = OutlinePoint::on(start.x, start.y);
    for point in sequence.iter().chain(std::iter::once(&closing)) {
        if !point.is_on_curve() {
            pending.push(point.position());
            pending_cubic |= point.is_cubic_control();
            continue;
        }
        flush_segment(&mut primitives, &pending, pending_cubic, point.position(), &map);
        pending.clear();
        pending_cubic = false;
    }

    primitives.push(PathPrimitive::Close);
    primitives
}

fn flush_segment(
    out: &mut Vec<PathPrimitive>,
    controls: &[Point],
    cubic: bool,
    to: Point,
    map: &impl Fn(Point) -> Point,
) {
    if controls.is_empty() {
        out.push(PathPrimitive::Line { to: map(to) });
        return;
    }

    if !cubic {
        // TrueType: consecutive quadratic controls imply on-curve midpoints.
        for (i, &h) in controls.iter().enumerate() {
            let end = controls.get(i + 1).map_or(to, |&next| midpoint(h, next));
            out.push(PathPrimitive::Quadratic {
                h: map(h),
                to: map(end),
            });
        }
        return;
    }

    let mut rest = controls;
    loop {
        match rest {
            [] => {
                out.push(PathPrimitive::Line { to: map(to) });
                break;
            }
            [h] => {
                out.push(PathPrimitive::Quadratic {
                    h: map(*h),
                    to: map(to),
                });
                break;
            }
            [h1, h2] => {
                out.push(PathPrimitive::Cubic {
                    h1: map(*h1),
                    h2: map(*h2),
                    to: map(to),
                });
                break;
            }
            [h1, h2, next, ..] => {
                out.push(PathPrimitive::Cubic {
                    h1: map(*h1),
                    h2: map(*h2),
                    to: map(midpoint(*h2, *next)),
                });
                rest = &rest[2..];
            }
        }
    }
}

/// Lays out a line of text and returns the primitives of every glyph
/// contour in mm, relative to the text origin with y pointing down.
pub fn layout_text(source: &dyn OutlineSource, text: &str, font_size: f64) -> Vec<PathPrimitive> {
    let units_per_em = source.units_per_em();
    if units_per_em <= 0.0 {
        warn!(units_per_em, "Font reports no units per em");
        return Vec::new();
    }
    let scale = font_size / units_per_em;

    let mut primitives = Vec::new();
    let mut pen = 0.0;
    let mut previous: Option<char> = None;

    for ch in text.chars() {
        if let Some(left) = previous {
            pen += source.kerning(left, ch);
        }
        previous = Some(ch);

        let Some(glyph) = source.glyph(ch) else {
            warn!(character = %ch, "Font has no glyph for character");
            continue;
        };
        let origin = pen;
        let map = |p: Point| Point::new((origin + p.x) * scale, -p.y * scale);
        for contour in &glyph.contours {
            primitives.extend(decode_contour(contour, map));
        }
        pen += glyph.advance;
    }

    primitives
}

/// First length of a coordinate list attribute (`x="10 20 30"`).
fn first_length(value: &str) -> &str {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .find(|part| !part.is_empty())
        .unwrap_or("0")
}

impl ShapeCompiler<'_> {
    pub(crate) fn compile_text(&mut self, element: &StyledElement) {
        let Some(fonts) = self.fonts else {
            warn!("No font provider available; skipping text");
            return;
        };

        let style = self.style_of(element).clone();
        let collapsed = element.text_content().split_whitespace().collect::<Vec<_>>().join(" ");
        let text = apply_text_transform(&collapsed, &style.text_transform);
        if text.is_empty() {
            return;
        }

        let resolver = self.resolver();
        let coordinate = |name: &str, axis: Axis| {
            element
                .attr(name)
                .map(first_length)
                .filter(|value| split_dimension(value).is_some())
                .map_or(0.0, |value| resolver.convert_length(value, axis, None))
        };
        let x = coordinate("x", Axis::Horizontal) + coordinate("dx", Axis::Horizontal);
        let y = coordinate("y", Axis::Vertical) + coordinate("dy", Axis::Vertical);
        let font_size = resolver.convert_length(style.font_size_dimension(), Axis::Vertical, None);

        let Some(source) = fonts.outline_source(&style.font_family, style.font_weight_value(), style.is_italic())
        else {
            warn!(family = %style.font_family, "No usable font for text");
            return;
        };

        let mut primitives = layout_text(source.as_ref(), &text, font_size);
        for primitive in &mut primitives {
            offset_primitive(primitive, x, y);
        }
        debug!(text = %text, font_size, contours = primitives.iter().filter(|p| matches!(p, PathPrimitive::Close)).count(), "Compiled text");

        let transform = self.transform_of(element);
        let line_width = self.line_width_of(element);
        self.emit_primitives(&primitives, &transform, line_width);
    }
}

fn offset_primitive(primitive: &mut PathPrimitive, dx: f64, dy: f64) {
    let shift = |p: &mut Point| {
        p.x += dx;
        p.y += dy;
    };
    match primitive {
        PathPrimitive::Move { to } | PathPrimitive::Line { to } => shift(to),
        PathPrimitive::Cubic { h1, h2, to } => {
            shift(h1);
            shift(h2);
            shift(to);
        }
        PathPrimitive::Quadratic { h, to } => {
            shift(h);
            shift(to);
        }
        PathPrimitive::Arc { to, .. } => shift(to),
        PathPrimitive::Close => {}
    }
}
