//! Style cascade.
//!
//! Resolves the handful of CSS properties the compiler cares about for
//! every element and stores them in an immutable [`StyleMap`] keyed by
//! [`NodeId`]. Precedence, lowest first: inherited value, presentation
//! attribute, declarations from `<style>` children, inline `style`.
//! Transforms never replace each other: an element's transform is appended
//! to its parent's.

use crate::document::{NodeId, StyledElement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use svgtoolpath_core::units::is_dimension;
use tracing::warn;

/// The tracked properties of one element, after cascading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStyle {
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub font_style: String,
    pub stroke_width: String,
    pub stroke_dasharray: String,
    pub stroke_dashoffset: String,
    pub text_decoration: String,
    pub text_decoration_line: String,
    pub text_decoration_style: String,
    pub text_transform: String,
    /// Full transform list from the root down to this element
    pub transform: String,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            font_family: "serif".to_string(),
            font_size: "12pt".to_string(),
            font_weight: "400".to_string(),
            font_style: "normal".to_string(),
            stroke_width: "0.35mm".to_string(),
            stroke_dasharray: "none".to_string(),
            stroke_dashoffset: "0".to_string(),
            text_decoration: String::new(),
            text_decoration_line: "none".to_string(),
            text_decoration_style: "solid".to_string(),
            text_transform: "none".to_string(),
            transform: String::new(),
        }
    }
}

/// Outcome of assigning one declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Applied,
    Invalid,
    Untracked,
}

type Validator = fn(&str) -> bool;

/// Tracked property names with their validators.
const PROPERTIES: &[(&str, Validator)] = &[
    ("font-family", is_font_family),
    ("font-size", is_font_size),
    ("font-weight", is_font_weight),
    ("font-style", is_font_style),
    ("stroke-width", is_non_negative_length),
    ("stroke-dasharray", is_dash_array),
    ("stroke-dashoffset", is_dimension),
    ("text-decoration", is_anything),
    ("text-decoration-line", is_decoration_line),
    ("text-decoration-style", is_decoration_style),
    ("text-transform", is_text_transform),
    ("transform", is_anything),
];

impl ResolvedStyle {
    /// Root style for a given default stroke width in mm.
    pub fn with_line_width(line_width: f64) -> Self {
        Self {
            stroke_width: format!("{line_width}mm"),
            ..Self::default()
        }
    }

    pub fn is_tracked(property: &str) -> bool {
        PROPERTIES.iter().any(|(name, _)| *name == property)
    }

    fn slot(&mut self, property: &str) -> Option<&mut String> {
        let slot = match property {
            "font-family" => &mut self.font_family,
            "font-size" => &mut self.font_size,
            "font-weight" => &mut self.font_weight,
            "font-style" => &mut self.font_style,
            "stroke-width" => &mut self.stroke_width,
            "stroke-dasharray" => &mut self.stroke_dasharray,
            "stroke-dashoffset" => &mut self.stroke_dashoffset,
            "text-decoration" => &mut self.text_decoration,
            "text-decoration-line" => &mut self.text_decoration_line,
            "text-decoration-style" => &mut self.text_decoration_style,
            "text-transform" => &mut self.text_transform,
            "transform" => &mut self.transform,
            _ => return None,
        };
        Some(slot)
    }

    /// Sets a property if its value passes validation. Invalid values leave
    /// the previous value in place.
    pub fn assign(&mut self, property: &str, value: &str) -> Assignment {
        let Some((_, validate)) = PROPERTIES.iter().find(|(name, _)| *name == property) else {
            return Assignment::Untracked;
        };
        let value = value.trim();
        if !validate(value) {
            return Assignment::Invalid;
        }
        match self.slot(property) {
            Some(slot) => {
                *slot = value.to_string();
                Assignment::Applied
            }
            None => Assignment::Untracked,
        }
    }

    /// Numeric font weight, 100..=900.
    pub fn font_weight_value(&self) -> u16 {
        match self.font_weight.as_str() {
            "normal" => 400,
            "bold" | "bolder" => 700,
            "lighter" => 300,
            other => other.parse::<u16>().map_or(400, |w| w.clamp(1, 1000)),
        }
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == "italic" || self.font_style.starts_with("oblique")
    }

    /// `font-size` with absolute size keywords mapped to CSS pixel sizes.
    pub fn font_size_dimension(&self) -> &str {
        match self.font_size.as_str() {
            "xx-small" => "9px",
            "x-small" => "10px",
            "small" => "13px",
            "medium" => "16px",
            "large" => "18px",
            "x-large" => "24px",
            "xx-large" => "32px",
            "xxx-large" => "48px",
            other => other,
        }
    }
}

fn is_anything(_: &str) -> bool {
    true
}

fn is_font_family(value: &str) -> bool {
    value.split(',').any(|family| !family.trim().is_empty())
}

fn is_font_size(value: &str) -> bool {
    matches!(
        value,
        "xx-small" | "x-small" | "small" | "medium" | "large" | "x-large" | "xx-large" | "xxx-large"
    ) || is_non_negative_length(value)
}

fn is_font_weight(value: &str) -> bool {
    matches!(value, "normal" | "bold" | "bolder" | "lighter")
        || value
            .parse::<u16>()
            .is_ok_and(|weight| (1..=1000).contains(&weight))
}

fn is_font_style(value: &str) -> bool {
    matches!(value, "normal" | "italic") || value.starts_with("oblique")
}

fn is_non_negative_length(value: &str) -> bool {
    is_dimension(value) && !value.starts_with('-')
}

fn is_dash_array(value: &str) -> bool {
    value == "none"
        || value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .all(is_non_negative_length)
}

fn is_decoration_line(value: &str) -> bool {
    value == "none"
        || value.split_whitespace().all(|part| {
            matches!(part, "underline" | "overline" | "line-through" | "blink")
        })
}

fn is_decoration_style(value: &str) -> bool {
    matches!(value, "solid" | "double" | "dotted" | "dashed" | "wavy")
}

fn is_text_transform(value: &str) -> bool {
    matches!(
        value,
        "none" | "capitalize" | "uppercase" | "lowercase" | "full-width" | "full-size-kana"
    )
}

/// Parses `name: value; name: value` declarations.
///
/// Selectors and braces are stripped so a whole `<style>` sheet reads as one
/// flat declaration list.
pub fn parse_declarations(css: &str) -> Vec<(String, String)> {
    let without_comments = strip_comments(css);
    without_comments
        .split([';', '{', '}'])
        .filter_map(|piece| {
            let (name, value) = piece.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return None;
            }
            Some((name, value.to_string()))
        })
        .collect()
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Immutable resolved styles for every element of a tree.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    styles: HashMap<NodeId, ResolvedStyle>,
}

impl StyleMap {
    pub fn get(&self, id: NodeId) -> Option<&ResolvedStyle> {
        self.styles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Resolves styles for `root` and all its descendants.
pub fn resolve_styles(root: &StyledElement, defaults: &ResolvedStyle) -> StyleMap {
    let mut map = StyleMap::default();
    cascade(root, defaults, &mut map);
    map
}

fn cascade(element: &StyledElement, inherited: &ResolvedStyle, map: &mut StyleMap) {
    let mut declared = ResolvedStyle {
        transform: String::new(),
        ..inherited.clone()
    };

    let mut declare = |property: &str, value: &str, source: &str| {
        if declared.assign(property, value) == Assignment::Invalid {
            warn!(
                element = %element.tag,
                property = %property,
                value = %value,
                source = %source,
                "Ignoring malformed style value"
            );
        }
    };

    // Presentation attributes.
    for (name, _) in PROPERTIES {
        if let Some(value) = element.attr(name) {
            declare(name, value, "attribute");
        }
    }

    // Flat <style> sheets among the direct children.
    for child in element.children.iter().filter(|c| c.is("style")) {
        let sheet = child.text_content();
        for (name, value) in parse_declarations(&sheet) {
            if ResolvedStyle::is_tracked(&name) {
                declare(&name, &value, "style element");
            }
        }
    }

    // Inline style attribute.
    if let Some(inline) = element.attr("style") {
        for (name, value) in parse_declarations(inline) {
            if ResolvedStyle::is_tracked(&name) {
                declare(&name, &value, "style attribute");
            }
        }
    }

    let own_transform = std::mem::take(&mut declared.transform);
    declared.transform = match (inherited.transform.trim(), own_transform.trim()) {
        ("", own) => own.to_string(),
        (parent, "") => parent.to_string(),
        (parent, own) => format!("{parent} {own}"),
    };

    for child in &element.children {
        cascade(child, &declared, map);
    }
    map.styles.insert(element.id, declared);
}
