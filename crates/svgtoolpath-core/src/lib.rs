//! # SVGToolpath Core
//!
//! Core types, units, and errors shared by every SVGToolpath crate.
//! Provides the toolpath command model produced by the geometry compiler
//! and consumed by the G-code serializer, plus CSS/SVG length resolution.

pub mod data;
pub mod error;
pub mod units;

pub use data::{Command, ExtrudeCommand, Point, TravelCommand};
pub use error::{DocumentError, Error, Result};
pub use units::{Axis, UnitResolver, Viewport};
