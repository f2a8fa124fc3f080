use crate::layers::{Layer, LayerData, SegmentKind};
use tracing::debug;

/// Plan-view SVG path data for one or more layers, split by segment kind.
#[derive(Debug, Default, Clone)]
pub struct LayerPreview {
    travel_path: String,
    extrude_path: String,
    segments: usize,
    min: (f64, f64),
    max: (f64, f64),
}

impl LayerPreview {
    pub fn new() -> Self {
        Self {
            min: (f64::INFINITY, f64::INFINITY),
            max: (f64::NEG_INFINITY, f64::NEG_INFINITY),
            ..Self::default()
        }
    }

    /// Preview of a single layer.
    pub fn for_layer(layer: &Layer) -> Self {
        let mut preview = Self::new();
        preview.add_layer(layer);
        preview
    }

    /// Preview of every layer drawn on top of each other.
    pub fn for_all(data: &LayerData) -> Self {
        let mut preview = Self::new();
        for layer in data.layers() {
            preview.add_layer(layer);
        }
        preview
    }

    pub fn add_layer(&mut self, layer: &Layer) {
        debug!(
            layer = layer.index,
            polygons = layer.polygons.len(),
            "Building layer preview"
        );

        for polygon in &layer.polygons {
            let mut last_travel = None;
            let mut last_extrude = None;

            for (i, kind) in polygon.kinds.iter().enumerate() {
                let from = polygon.vertices[i];
                let to = polygon.vertices[i + 1];
                self.include(from.x, from.depth);
                self.include(to.x, to.depth);
                self.segments += 1;

                let (path, last) = if kind.is_travel() {
                    (&mut self.travel_path, &mut last_travel)
                } else {
                    (&mut self.extrude_path, &mut last_extrude)
                };

                if *last != Some(i) {
                    path.push_str(&format!("M {:.2} {:.2} ", from.x, from.depth));
                }
                path.push_str(&format!("L {:.2} {:.2} ", to.x, to.depth));
                *last = Some(i + 1);
            }
        }
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min = (self.min.0.min(x), self.min.1.min(y));
        self.max = (self.max.0.max(x), self.max.1.max(y));
    }

    pub fn travel_svg(&self) -> &str {
        self.travel_path.trim_end()
    }

    pub fn extrude_svg(&self) -> &str {
        self.extrude_path.trim_end()
    }

    pub fn segment_count(&self) -> usize {
        self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments == 0
    }

    /// Standalone SVG document with extrusions drawn solid and travels dashed.
    pub fn to_svg_document(&self) -> String {
        let (min, max) = if self.is_empty() {
            ((0.0, 0.0), (1.0, 1.0))
        } else {
            (self.min, self.max)
        };
        let margin = 2.0;
        let width = (max.0 - min.0) + 2.0 * margin;
        let height = (max.1 - min.1) + 2.0 * margin;

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{:.2} {:.2} {:.2} {:.2}\">\n",
            min.0 - margin,
            min.1 - margin,
            width,
            height
        ));
        if !self.travel_path.is_empty() {
            svg.push_str(&format!(
                "  <path d=\"{}\" fill=\"none\" stroke=\"#3daee9\" stroke-width=\"0.1\" stroke-dasharray=\"0.5 0.5\"/>\n",
                self.travel_svg()
            ));
        }
        if !self.extrude_path.is_empty() {
            svg.push_str(&format!(
                "  <path d=\"{}\" fill=\"none\" stroke=\"#e07020\" stroke-width=\"0.4\" stroke-linejoin=\"round\"/>\n",
                self.extrude_svg()
            ));
        }
        svg.push_str("</svg>\n");
        svg
    }
}

/// Counts segments of a kind across the whole print.
pub fn count_segments(data: &LayerData, kind: SegmentKind) -> usize {
    data.layers()
        .iter()
        .flat_map(|l| &l.polygons)
        .map(|p| p.kinds.iter().filter(|k| **k == kind).count())
        .sum()
}
