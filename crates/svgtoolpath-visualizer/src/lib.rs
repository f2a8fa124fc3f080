//! # SVGToolpath Visualizer
//!
//! Layer view data produced alongside the G-code, plus plan-view SVG
//! previews of it.

pub mod layers;
pub mod preview;

pub use layers::{Layer, LayerData, LayerPolygon, SegmentKind, Vertex, TRAVEL_LINE_WIDTH};
pub use preview::{count_segments, LayerPreview};
