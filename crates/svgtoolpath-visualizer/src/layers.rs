//! Per-layer visualization data.
//!
//! Mirrors what a slicer's layer view consumes: for every printed layer a
//! list of polygons, each an open chain of vertices with one entry per
//! segment for its kind, line width, layer thickness and feedrate.

use serde::{Deserialize, Serialize};
use svgtoolpath_core::Point;

/// Line width drawn for travel segments.
pub const TRAVEL_LINE_WIDTH: f64 = 0.1;

/// What a segment of a layer polygon represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    /// Travel with the filament retracted
    MoveRetraction,
    /// Travel without retraction
    MoveCombing,
    /// Extrusion of an outer wall
    Inset0,
}

impl SegmentKind {
    pub fn is_travel(self) -> bool {
        matches!(self, SegmentKind::MoveRetraction | SegmentKind::MoveCombing)
    }
}

/// A vertex in layer-view space: `x` across the plate, `height` up, `depth`
/// towards the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub height: f64,
    pub depth: f64,
}

/// One chain of segments in a layer.
///
/// `vertices` always holds one more entry than each per-segment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPolygon {
    pub extruder: usize,
    pub vertices: Vec<Vertex>,
    pub kinds: Vec<SegmentKind>,
    pub widths: Vec<f64>,
    pub thicknesses: Vec<f64>,
    /// mm/s
    pub feedrates: Vec<f64>,
}

impl LayerPolygon {
    /// Starts a polygon at `start`.
    pub fn new(extruder: usize, start: Vertex) -> Self {
        Self {
            extruder,
            vertices: vec![start],
            kinds: Vec::new(),
            widths: Vec::new(),
            thicknesses: Vec::new(),
            feedrates: Vec::new(),
        }
    }

    /// Appends a segment from the last vertex to `to`.
    pub fn push_segment(&mut self, to: Vertex, kind: SegmentKind, width: f64, thickness: f64, feedrate: f64) {
        self.vertices.push(to);
        self.kinds.push(kind);
        self.widths.push(width);
        self.thicknesses.push(thickness);
        self.feedrates.push(feedrate);
    }

    pub fn segment_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_consistent(&self) -> bool {
        let n = self.kinds.len();
        self.vertices.len() == n + 1
            && self.widths.len() == n
            && self.thicknesses.len() == n
            && self.feedrates.len() == n
    }

    /// Total length of the segments of one kind.
    pub fn length_of(&self, kind: SegmentKind) -> f64 {
        self.vertices
            .windows(2)
            .zip(&self.kinds)
            .filter(|(_, k)| **k == kind)
            .map(|(pair, _)| {
                let dx = pair[1].x - pair[0].x;
                let dz = pair[1].depth - pair[0].depth;
                (dx * dx + dz * dz).sqrt()
            })
            .sum()
    }

    /// Plan-view bounding box of the vertices as (min, max).
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = self.vertices.first()?;
        let init = (Point::new(first.x, first.depth), Point::new(first.x, first.depth));
        Some(self.vertices.iter().fold(init, |(min, max), v| {
            (
                Point::new(min.x.min(v.x), min.y.min(v.depth)),
                Point::new(max.x.max(v.x), max.y.max(v.depth)),
            )
        }))
    }
}

/// One printed layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub index: usize,
    /// Top of the layer above the plate, in mm
    pub height: f64,
    pub thickness: f64,
    pub polygons: Vec<LayerPolygon>,
}

impl Layer {
    pub fn new(index: usize, height: f64, thickness: f64) -> Self {
        Self {
            index,
            height,
            thickness,
            polygons: Vec::new(),
        }
    }

    pub fn segment_count(&self) -> usize {
        self.polygons.iter().map(LayerPolygon::segment_count).sum()
    }
}

/// Visualization data of a whole print, ordered by layer index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerData {
    layers: Vec<Layer>,
}

impl LayerData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer, keeping the list ordered by index. A layer with an
    /// index that already exists replaces it.
    pub fn add_layer(&mut self, layer: Layer) {
        match self.layers.binary_search_by_key(&layer.index, |l| l.index) {
            Ok(pos) => self.layers[pos] = layer,
            Err(pos) => self.layers.insert(pos, layer),
        }
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers
            .binary_search_by_key(&index, |l| l.index)
            .ok()
            .map(|pos| &self.layers[pos])
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.layers.iter().map(Layer::segment_count).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
