//! Configuration for SVGToolpath
//!
//! Describes the printer, the material and how the drawing should be read.
//! Supports JSON and TOML file formats, stored in the platform config
//! directory by default.
//!
//! Configuration is organized into logical sections:
//! - Machine (build volume, G-code flavor, start/end G-code)
//! - Layers (layer heights, default line width, curve resolution)
//! - Material (filament diameter, flow, temperatures)
//! - Speed (travel and print speeds, first layer and rest)
//! - Retraction
//! - Reader (centering, print height, spiralize)

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Dialect of G-code understood by the printer firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GcodeFlavor {
    /// Marlin and derivatives, linear extrusion
    #[default]
    Marlin,
    /// RepRap firmware, linear extrusion
    RepRap,
    /// RepRap firmware, volumetric extrusion
    #[serde(rename = "RepRap (Volumetric)", alias = "RepRapVolumetric")]
    RepRapVolumetric,
    /// Ultimaker 2 family, volumetric extrusion
    UltiGCode,
    /// Ultimaker 3 and S-line, with a metadata header block
    Griffin,
}

impl GcodeFlavor {
    /// Whether `E` values are expressed in mm³ instead of mm of filament.
    pub fn is_volumetric(&self) -> bool {
        matches!(self, Self::UltiGCode | Self::RepRapVolumetric)
    }
}

impl fmt::Display for GcodeFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marlin => write!(f, "Marlin"),
            Self::RepRap => write!(f, "RepRap"),
            Self::RepRapVolumetric => write!(f, "RepRap (Volumetric)"),
            Self::UltiGCode => write!(f, "UltiGCode"),
            Self::Griffin => write!(f, "Griffin"),
        }
    }
}

/// Printer hardware settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Printer name, reported in the Griffin header
    pub name: String,
    /// Build plate width in mm
    pub width: f64,
    /// Build plate depth in mm
    pub depth: f64,
    /// Build volume height in mm
    pub height: f64,
    /// Whether the origin is in the middle of the build plate
    pub center_is_zero: bool,
    pub gcode_flavor: GcodeFlavor,
    /// Active extruder index
    pub extruder_number: u32,
    /// Nozzle diameter in mm
    pub nozzle_size: f64,
    pub nozzle_id: String,
    pub build_plate_type: String,
    /// Raw G-code inserted after the generated header
    pub start_gcode: String,
    /// Raw G-code appended after the footer
    pub end_gcode: String,
    /// Print acceleration in mm/s²
    pub acceleration: f64,
    /// Print jerk in mm/s
    pub jerk: f64,
    pub prime_blob_enable: bool,
    pub prime_pos_x: f64,
    pub prime_pos_y: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            name: "Generic FFF printer".to_string(),
            width: 200.0,
            depth: 200.0,
            height: 200.0,
            center_is_zero: false,
            gcode_flavor: GcodeFlavor::Marlin,
            extruder_number: 0,
            nozzle_size: 0.4,
            nozzle_id: "AA 0.4".to_string(),
            build_plate_type: "glass".to_string(),
            start_gcode: String::new(),
            end_gcode: String::new(),
            acceleration: 3000.0,
            jerk: 20.0,
            prime_blob_enable: false,
            prime_pos_x: 0.0,
            prime_pos_y: 0.0,
        }
    }
}

/// Layer geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSettings {
    /// Height of every layer after the first, in mm
    pub layer_height: f64,
    /// Height of the first layer, in mm
    pub layer_height_0: f64,
    /// Line width used where the drawing doesn't set `stroke-width`
    pub line_width: f64,
    /// Maximum segment length when flattening curves, in mm
    pub resolution: f64,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            layer_height: 0.1,
            layer_height_0: 0.27,
            line_width: 0.4,
            resolution: 0.5,
        }
    }
}

/// Filament settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    /// Filament diameter in mm
    pub diameter: f64,
    /// Flow multiplier, 1.0 is nominal
    pub flow: f64,
    /// Flow multiplier for the first layer
    pub flow_layer_0: f64,
    pub print_temperature: f64,
    pub print_temperature_layer_0: f64,
    pub bed_temperature: f64,
    pub bed_temperature_layer_0: f64,
    pub guid: String,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            diameter: 2.85,
            flow: 1.0,
            flow_layer_0: 1.0,
            print_temperature: 200.0,
            print_temperature_layer_0: 205.0,
            bed_temperature: 60.0,
            bed_temperature_layer_0: 60.0,
            guid: String::new(),
        }
    }
}

/// Movement speeds, all in mm/s
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedSettings {
    pub travel: f64,
    pub travel_layer_0: f64,
    pub print: f64,
    pub print_layer_0: f64,
}

impl Default for SpeedSettings {
    fn default() -> Self {
        Self {
            travel: 150.0,
            travel_layer_0: 100.0,
            print: 30.0,
            print_layer_0: 20.0,
        }
    }
}

/// Filament retraction during travel moves
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetractionSettings {
    pub enable: bool,
    /// Retraction distance in mm of filament
    pub amount: f64,
    /// Retract speed in mm/s
    pub retract_speed: f64,
    /// Prime (un-retract) speed in mm/s
    pub prime_speed: f64,
}

impl Default for RetractionSettings {
    fn default() -> Self {
        Self {
            enable: true,
            amount: 6.5,
            retract_speed: 25.0,
            prime_speed: 25.0,
        }
    }
}

/// How a drawing is turned into a print
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    /// Move the drawing to the middle of the build plate
    pub center_enabled: bool,
    /// Requested print height in mm. At least one layer is always printed.
    pub height: f64,
    /// Raise Z continuously along each layer instead of stepping
    pub spiralize: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            center_enabled: true,
            height: 0.0,
            spiralize: false,
        }
    }
}

/// Complete build configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub machine: MachineSettings,
    pub layers: LayerSettings,
    pub material: MaterialSettings,
    pub speed: SpeedSettings,
    pub retraction: RetractionSettings,
    pub reader: ReaderSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
        Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location, `<config dir>/svgtoolpath/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("svgtoolpath").join("config.toml"))
    }

    /// Loads the config at [`Config::default_path`], or defaults when there is none.
    pub fn load_or_default() -> ConfigResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                format: "JSON".to_string(),
                reason: e.to_string(),
            })?,
            Format::Toml => toml::from_str(&content).map_err(|e| ConfigError::Parse {
                format: "TOML".to_string(),
                reason: e.to_string(),
            })?,
        };

        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Read {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("machine.width", self.machine.width),
            ("machine.depth", self.machine.depth),
            ("machine.height", self.machine.height),
            ("machine.nozzle_size", self.machine.nozzle_size),
            ("layers.layer_height", self.layers.layer_height),
            ("layers.layer_height_0", self.layers.layer_height_0),
            ("layers.line_width", self.layers.line_width),
            ("layers.resolution", self.layers.resolution),
            ("material.diameter", self.material.diameter),
            ("speed.travel", self.speed.travel),
            ("speed.travel_layer_0", self.speed.travel_layer_0),
            ("speed.print", self.speed.print),
            ("speed.print_layer_0", self.speed.print_layer_0),
        ];
        for (key, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::invalid(key, format!("must be > 0, got {value}")));
            }
        }

        for (key, value) in [
            ("material.flow", self.material.flow),
            ("material.flow_layer_0", self.material.flow_layer_0),
        ] {
            if !(value > 0.0 && value <= 10.0) {
                return Err(ConfigError::invalid(
                    key,
                    format!("must be in (0, 10], got {value}"),
                ));
            }
        }

        if self.retraction.enable {
            if self.retraction.amount < 0.0 {
                return Err(ConfigError::invalid("retraction.amount", "must be >= 0"));
            }
            if !(self.retraction.retract_speed > 0.0 && self.retraction.prime_speed > 0.0) {
                return Err(ConfigError::invalid(
                    "retraction",
                    "retract and prime speeds must be > 0",
                ));
            }
        }

        if self.reader.height < 0.0 {
            return Err(ConfigError::invalid("reader.height", "must be >= 0"));
        }

        Ok(())
    }

    /// Extrusion multiplier for the given layer.
    pub fn flow_for_layer(&self, layer_nr: usize) -> f64 {
        if layer_nr == 0 {
            self.material.flow_layer_0
        } else {
            self.material.flow
        }
    }

    /// Travel speed in mm/s for the given layer.
    pub fn travel_speed_for_layer(&self, layer_nr: usize) -> f64 {
        if layer_nr == 0 {
            self.speed.travel_layer_0
        } else {
            self.speed.travel
        }
    }

    /// Print speed in mm/s for the given layer.
    pub fn print_speed_for_layer(&self, layer_nr: usize) -> f64 {
        if layer_nr == 0 {
            self.speed.print_layer_0
        } else {
            self.speed.print
        }
    }
}
