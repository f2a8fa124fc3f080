//! # SVGToolpath
//!
//! Prints SVG drawings directly as FDM toolpaths: every stroke in the
//! drawing becomes a line of extruded plastic, repeated layer over layer up
//! to the requested height.
//!
//! ## Architecture
//!
//! SVGToolpath is organized as a workspace with multiple crates:
//!
//! 1. **svgtoolpath-core** - Points, toolpath commands, units, errors
//! 2. **svgtoolpath-settings** - Printer, material and reader configuration
//! 3. **svgtoolpath-designer** - SVG document to toolpath compiler, fonts
//! 4. **svgtoolpath-visualizer** - Layer view data and SVG previews
//! 5. **svgtoolpath-camtools** - Stroke ordering and G-code writer
//! 6. **svgtoolpath** - This facade and the command line tool

use std::path::Path;

pub use svgtoolpath_camtools::{write_gcode, CamToolError, GcodeWriter, ToolpathOutput};
pub use svgtoolpath_core::{Command, DocumentError, Error, Point, Result};
pub use svgtoolpath_designer::{compile_svg, FontCatalog, FontProvider};
pub use svgtoolpath_settings::{Config, ConfigError, GcodeFlavor};
pub use svgtoolpath_visualizer::{LayerData, LayerPreview};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Compiles an SVG document and writes it as G-code.
pub fn convert_svg(
    source: &str,
    config: &Config,
    fonts: Option<&dyn FontProvider>,
) -> Result<ToolpathOutput> {
    let commands = compile_svg(source, config, fonts)?;
    Ok(write_gcode(config, &commands)?)
}

/// Reads and converts an SVG file.
pub fn convert_file(
    path: &Path,
    config: &Config,
    fonts: Option<&dyn FontProvider>,
) -> Result<ToolpathOutput> {
    let source = std::fs::read_to_string(path)?;
    convert_svg(&source, config, fonts)
}

/// Initialize logging
///
/// Logs go to stderr so G-code can be written to stdout. The level
/// defaults to `info` and follows `RUST_LOG` when set; `json` switches to
/// one JSON object per event.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .try_init()?;
    }

    Ok(())
}
