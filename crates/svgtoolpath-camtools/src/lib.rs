//! # SVGToolpath CAM Tools
//!
//! Orders toolpath strokes and serializes them as layered FDM G-code.

pub mod error;
pub mod gcode_writer;
pub mod optimizer;

pub use error::{CamToolError, Result};
pub use gcode_writer::{
    extrude_length, plan_layers, write_gcode, GcodeWriter, LayerSlice, PrintBounds,
    ToolpathOutput, GENERATOR_NAME,
};
pub use optimizer::ToolpathOptimizer;
