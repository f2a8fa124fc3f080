//! `<use>` expansion.
//!
//! Every `<use>` element is replaced in place by a deep copy of the element
//! it references. The copy gets fresh node identities and the transform
//! `use.transform translate(x, y) original.transform`. References are looked
//! up in a snapshot of the tree taken before any rewriting, so expansion
//! order does not matter. A `<use>` that points at another `<use>` is
//! followed until it reaches a real element.
//!
//! The x/y offsets are lengths like any other and are converted to mm in
//! the viewport of the nearest enclosing `<svg>`.

use crate::compiler::viewport_of;
use crate::document::{Document, IdAllocator, StyledElement};
use std::collections::HashMap;
use svgtoolpath_core::units::{Axis, UnitResolver, Viewport};
use tracing::{debug, warn};

/// Replaces every `<use>` in the document with the element it refers to.
/// Unresolvable and circular references are dropped with a warning.
///
/// `viewport` is the area the root `<svg>` is laid out in.
pub fn dereference_uses(document: &mut Document, viewport: Viewport) {
    let mut definitions = HashMap::new();
    document.root.walk(&mut |element| {
        if let Some(id) = element.attr("id") {
            definitions
                .entry(id.to_string())
                .or_insert_with(|| element.clone());
        }
    });

    let mut expander = UseExpander {
        definitions,
        ids: &mut document.ids,
        stack: Vec::new(),
        resolvers: vec![UnitResolver::new(viewport)],
        expanded: 0,
    };
    expander.expand(&mut document.root);
    if expander.expanded > 0 {
        debug!(count = expander.expanded, "Expanded use references");
    }
}

struct UseExpander<'a> {
    definitions: HashMap<String, StyledElement>,
    ids: &'a mut IdAllocator,
    /// Ids of enclosing elements and of the references being expanded
    stack: Vec<String>,
    resolvers: Vec<UnitResolver>,
    expanded: usize,
}

impl UseExpander<'_> {
    fn resolver(&self) -> UnitResolver {
        self.resolvers.last().copied().unwrap_or_default()
    }

    fn expand(&mut self, element: &mut StyledElement) {
        let own_id = element.attr("id").map(str::to_string);
        if let Some(id) = &own_id {
            self.stack.push(id.clone());
        }
        let opens_viewport = element.is("svg");
        if opens_viewport {
            let viewport = viewport_of(element, &self.resolver());
            self.resolvers.push(UnitResolver::new(viewport));
        }

        let children = std::mem::take(&mut element.children);
        for mut child in children {
            if child.is("use") {
                if let Some(copy) = self.instantiate(&child) {
                    element.children.push(copy);
                }
            } else {
                self.expand(&mut child);
                element.children.push(child);
            }
        }

        if opens_viewport {
            self.resolvers.pop();
        }
        if own_id.is_some() {
            self.stack.pop();
        }
    }

    fn instantiate(&mut self, link: &StyledElement) -> Option<StyledElement> {
        let Some(href) = link.attr("href").or_else(|| link.attr("xlink:href")) else {
            warn!(element = %link.id, "use element without href");
            return None;
        };
        let Some(target) = href.trim().strip_prefix('#') else {
            warn!(href = %href, "External references are not supported");
            return None;
        };
        if self.stack.iter().any(|id| id == target) {
            warn!(href = %href, "Circular use reference");
            return None;
        }
        let Some(definition) = self.definitions.get(target) else {
            warn!(href = %href, "use refers to an unknown id");
            return None;
        };

        let mut copy = definition.copy_with_fresh_ids(self.ids);
        let resolver = self.resolver();
        let offset = |name: &str, axis: Axis| {
            link.attr(name)
                .map_or(0.0, |value| resolver.convert_length(value, axis, None))
        };
        let transform = [
            link.attr_or("transform", "").trim().to_string(),
            format!(
                "translate({},{})",
                offset("x", Axis::Horizontal),
                offset("y", Axis::Vertical)
            ),
            copy.attr_or("transform", "").trim().to_string(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        copy.set_attr("transform", transform);
        copy.tail = link.tail.clone();
        self.expanded += 1;

        self.stack.push(target.to_string());
        let resolved = if copy.is("use") {
            self.instantiate(&copy)
        } else {
            self.expand(&mut copy);
            Some(copy)
        };
        self.stack.pop();

        resolved
    }
}
