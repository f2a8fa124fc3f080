//! Toolpath optimizer
//!
//! Reorders strokes to shorten travel moves and centers the drawing on the
//! build plate. A stroke is a travel followed by every extrude up to the next
//! travel.

use crate::error::{CamToolError, Result};
use svgtoolpath_core::{Command, Point};
use tracing::debug;

/// Stroke ordering and placement
#[derive(Debug)]
pub struct ToolpathOptimizer;

impl ToolpathOptimizer {
    /// Split commands into strokes, each starting at a travel.
    pub fn split_strokes(commands: &[Command]) -> Result<Vec<Vec<Command>>> {
        let mut strokes: Vec<Vec<Command>> = Vec::new();
        for (i, command) in commands.iter().enumerate() {
            match command {
                Command::Travel(_) => strokes.push(vec![*command]),
                Command::Extrude(_) => match strokes.last_mut() {
                    Some(stroke) => stroke.push(*command),
                    None => {
                        return Err(CamToolError::InvalidToolpath(format!(
                            "command {i} extrudes before any travel"
                        )))
                    }
                },
            }
        }
        Ok(strokes)
    }

    /// Walk a stroke backwards. Each extrude keeps the width of the segment
    /// it retraces.
    pub fn reverse_stroke(stroke: &[Command]) -> Vec<Command> {
        let Some(last) = stroke.last() else {
            return Vec::new();
        };
        let end = last.position();
        let mut reversed = Vec::with_capacity(stroke.len());
        reversed.push(Command::travel(end.x, end.y));
        for pair in stroke.windows(2).rev() {
            let to = pair[0].position();
            let width = pair[1].line_width().unwrap_or_default();
            reversed.push(Command::extrude(to.x, to.y, width));
        }
        reversed
    }

    /// Greedy nearest-neighbour ordering of strokes.
    ///
    /// The first stroke stays first. Each next stroke is the one whose start
    /// or end is closest to where the previous stroke finished, reversed when
    /// its end is the closer one. Ties go to the earlier stroke.
    pub fn sort_commands(commands: &[Command]) -> Result<Vec<Command>> {
        let mut remaining = Self::split_strokes(commands)?;
        if remaining.is_empty() {
            return Ok(Vec::new());
        }
        let stroke_count = remaining.len();

        let mut sorted = Vec::with_capacity(commands.len());
        let mut current = remaining.remove(0);
        let mut reversed_count = 0;

        loop {
            let last = current
                .last()
                .map(Command::position)
                .unwrap_or_else(|| Point::new(0.0, 0.0));
            sorted.append(&mut current);

            let mut best: Option<(usize, f64)> = None;
            for (i, stroke) in remaining.iter().enumerate() {
                let distance = Self::stroke_distance(&last, stroke);
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((i, distance));
                }
            }
            let Some((index, _)) = best else {
                break;
            };

            let next = remaining.remove(index);
            let to_start = last.distance_to(&next[0].position());
            let to_end = last.distance_to(&next[next.len() - 1].position());
            current = if to_start > to_end {
                reversed_count += 1;
                Self::reverse_stroke(&next)
            } else {
                next
            };
        }

        debug!(strokes = stroke_count, reversed = reversed_count, "Sorted strokes");
        Ok(sorted)
    }

    fn stroke_distance(from: &Point, stroke: &[Command]) -> f64 {
        let start = stroke[0].position();
        let end = stroke[stroke.len() - 1].position();
        from.distance_to(&start).min(from.distance_to(&end))
    }

    /// Bounding box of all command targets as (min, max).
    pub fn bounds(commands: &[Command]) -> Option<(Point, Point)> {
        let first = commands.first()?.position();
        Some(commands.iter().map(Command::position).fold(
            (first, first),
            |(min, max), p| {
                (
                    Point::new(min.x.min(p.x), min.y.min(p.y)),
                    Point::new(max.x.max(p.x), max.y.max(p.y)),
                )
            },
        ))
    }

    /// Shift every command so the drawing's bounding box is centered on a
    /// `width` × `depth` build plate.
    pub fn center_commands(commands: &mut [Command], width: f64, depth: f64) {
        let Some((min, max)) = Self::bounds(commands) else {
            return;
        };
        let dx = (width - (min.x + max.x)) / 2.0;
        let dy = (depth - (min.y + max.y)) / 2.0;
        debug!(dx, dy, "Centering toolpath");
        for command in commands.iter_mut() {
            command.translate(dx, dy);
        }
    }
}
