//! # SVGToolpath Designer
//!
//! The geometry compiler: turns an SVG drawing into a flat list of travel
//! and extrude commands in millimetres.
//!
//! ## Pipeline
//!
//! ```text
//! source text
//!   └── document     (owned element tree, node identities)
//!         └── dereference   (<use> expanded in place)
//!               └── style       (immutable NodeId → ResolvedStyle map)
//!                     └── compiler + shapes + text
//!                           ├── path       (d attribute → primitives)
//!                           ├── transform  (transform lists → matrices)
//!                           └── flatten    (curves → resolution-sized steps)
//! ```
//!
//! Malformed input inside the drawing is logged and skipped; only a
//! document that is not well-formed XML, or whose root is not `<svg>`, is
//! an error.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use svgtoolpath_designer::{compile_svg, FontCatalog};
//! use svgtoolpath_settings::Config;
//!
//! let fonts = FontCatalog::load_system();
//! let commands = compile_svg(&source, &Config::default(), Some(&fonts))?;
//! ```

pub mod compiler;
pub mod dereference;
pub mod document;
pub mod flatten;
pub mod font_manager;
pub mod path;
pub mod shapes;
pub mod style;
pub mod text;
pub mod transform;

pub use compiler::ShapeCompiler;
pub use document::{Document, NodeId, StyledElement};
pub use flatten::{EllipticalArc, CurveFlattener};
pub use font_manager::FontCatalog;
pub use path::{interpret_path, PathPrimitive};
pub use style::{resolve_styles, ResolvedStyle, StyleMap};
pub use text::{FontProvider, GlyphOutline, OutlinePoint, OutlineSource};
pub use transform::{parse_transform_list, AffineTransform};

use svgtoolpath_core::{Command, Result, Viewport};
use svgtoolpath_settings::Config;
use tracing::info;

/// Compiles an already parsed document.
pub fn compile_document(
    mut document: Document,
    config: &Config,
    fonts: Option<&dyn FontProvider>,
) -> Vec<Command> {
    let viewport = Viewport::for_build_area(config.machine.width, config.machine.depth);
    dereference::dereference_uses(&mut document, viewport);
    let styles = resolve_styles(
        &document.root,
        &ResolvedStyle::with_line_width(config.layers.line_width),
    );

    let mut compiler = ShapeCompiler::new(&styles, viewport, config.layers.resolution, fonts);
    compiler.compile_root(&document.root);
    compiler.into_commands()
}

/// Parses SVG source text and compiles it to toolpath commands.
pub fn compile_svg(
    source: &str,
    config: &Config,
    fonts: Option<&dyn FontProvider>,
) -> Result<Vec<Command>> {
    let document = Document::parse(source)?;
    let commands = compile_document(document, config, fonts);
    info!(
        commands = commands.len(),
        travels = commands.iter().filter(|c| c.is_travel()).count(),
        "Compiled SVG drawing"
    );
    Ok(commands)
}
