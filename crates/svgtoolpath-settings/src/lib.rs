//! SVGToolpath Settings Crate
//!
//! Printer, material and reader configuration with file persistence.

pub mod config;
pub mod error;

pub use config::{
    Config, GcodeFlavor, LayerSettings, MachineSettings, MaterialSettings, ReaderSettings,
    RetractionSettings, SpeedSettings,
};
pub use error::{ConfigError, ConfigResult};
