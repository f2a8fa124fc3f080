use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use svgtoolpath::{convert_file, init_logging, Config, FontCatalog, FontProvider, LayerPreview};
use tracing::info;

#[derive(Parser)]
#[command(
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")"),
    about = "Print SVG drawings as FDM toolpaths"
)]
struct Cli {
    /// SVG drawing to convert
    input: PathBuf,

    /// Configuration file (.toml or .json); the user config is used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the G-code; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Center the drawing on the build plate
    #[arg(long, conflicts_with = "no_center")]
    center: bool,

    /// Keep the drawing's own coordinates
    #[arg(long)]
    no_center: bool,

    /// Print height in mm
    #[arg(long)]
    height: Option<f64>,

    /// Raise Z continuously instead of layer by layer
    #[arg(long)]
    spiralize: bool,

    /// Write a plan-view SVG preview of the toolpath
    #[arg(long, value_name = "FILE")]
    preview: Option<PathBuf>,

    /// Write the layer view data as JSON
    #[arg(long, value_name = "FILE")]
    layers: Option<PathBuf>,

    /// Log as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_or_default().context("loading user config")?,
    };
    if cli.center {
        config.reader.center_enabled = true;
    }
    if cli.no_center {
        config.reader.center_enabled = false;
    }
    if let Some(height) = cli.height {
        config.reader.height = height;
    }
    if cli.spiralize {
        config.reader.spiralize = true;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json)?;

    let config = load_config(&cli)?;
    let fonts = FontCatalog::load_system();
    let output = convert_file(&cli.input, &config, Some(&fonts as &dyn FontProvider))
        .with_context(|| format!("converting {}", cli.input.display()))?;

    match &cli.output {
        Some(path) => output
            .save_gcode(path)
            .with_context(|| format!("writing {}", path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(output.gcode.as_bytes())
            .context("writing G-code to stdout")?,
    }

    if let Some(path) = &cli.preview {
        std::fs::write(path, LayerPreview::for_all(&output.layers).to_svg_document())
            .with_context(|| format!("writing preview {}", path.display()))?;
    }
    if let Some(path) = &cli.layers {
        std::fs::write(path, output.layers_json()?)
            .with_context(|| format!("writing layer data {}", path.display()))?;
    }

    info!(
        layers = output.layers.layer_count(),
        segments = output.layers.segment_count(),
        extruded = output.extruded,
        print_time_s = output.print_time,
        "Conversion finished"
    );
    Ok(())
}
