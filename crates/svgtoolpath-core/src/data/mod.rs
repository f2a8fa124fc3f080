//! Data models for toolpath geometry
//!
//! This module provides:
//! - 2D points in millimetres
//! - The two toolpath primitives: travel (no deposition) and extrude
//! - The `Command` sum type that the compiler emits and the serializer reads

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D point in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    /// Squared euclidean distance to another point.
    pub fn distance_squared_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Move to a position without depositing material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelCommand {
    pub x: f64,
    pub y: f64,
}

impl TravelCommand {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Move to a position while depositing a bead `line_width` wide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrudeCommand {
    pub x: f64,
    pub y: f64,
    /// Width of the deposited line in mm
    pub line_width: f64,
}

impl ExtrudeCommand {
    pub fn new(x: f64, y: f64, line_width: f64) -> Self {
        Self { x, y, line_width }
    }
}

/// A single toolpath command.
///
/// Every connected pen stroke starts with a [`Command::Travel`]; each
/// [`Command::Extrude`] deposits material from the previous command's
/// position to its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Travel(TravelCommand),
    Extrude(ExtrudeCommand),
}

impl Command {
    /// Shorthand for a travel command.
    pub fn travel(x: f64, y: f64) -> Self {
        Command::Travel(TravelCommand::new(x, y))
    }

    /// Shorthand for an extrude command.
    pub fn extrude(x: f64, y: f64, line_width: f64) -> Self {
        Command::Extrude(ExtrudeCommand::new(x, y, line_width))
    }

    /// Target position of this command.
    pub fn position(&self) -> Point {
        match self {
            Command::Travel(t) => Point::new(t.x, t.y),
            Command::Extrude(e) => Point::new(e.x, e.y),
        }
    }

    /// Moves the target position by the given offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Command::Travel(t) => {
                t.x += dx;
                t.y += dy;
            }
            Command::Extrude(e) => {
                e.x += dx;
                e.y += dy;
            }
        }
    }

    pub fn is_travel(&self) -> bool {
        matches!(self, Command::Travel(_))
    }

    pub fn is_extrude(&self) -> bool {
        matches!(self, Command::Extrude(_))
    }

    /// Line width of an extrude command, `None` for travels.
    pub fn line_width(&self) -> Option<f64> {
        match self {
            Command::Travel(_) => None,
            Command::Extrude(e) => Some(e.line_width),
        }
    }
}

impl From<TravelCommand> for Command {
    fn from(value: TravelCommand) -> Self {
        Command::Travel(value)
    }
}

impl From<ExtrudeCommand> for Command {
    fn from(value: ExtrudeCommand) -> Self {
        Command::Extrude(value)
    }
}
