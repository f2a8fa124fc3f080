//! Path data interpreter.
//!
//! Turns the `d` attribute mini-language into absolute drawing primitives,
//! scaled to millimetres by the viewport unit factors. Nothing is transformed
//! here; that happens during flattening.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use svgtoolpath_core::units::{parse_numbers, NUMBER_PATTERN};
use svgtoolpath_core::Point;
use tracing::warn;

// `e` and `E` belong to number exponents, never to commands.
static COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-DF-Za-df-z][^A-DF-Za-df-z]*").unwrap_or_else(|e| panic!("bad pattern: {e}"))
});

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{NUMBER_PATTERN}")).unwrap_or_else(|e| panic!("bad pattern: {e}"))
});

/// One absolute drawing primitive of a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathPrimitive {
    Move { to: Point },
    Line { to: Point },
    Cubic { h1: Point, h2: Point, to: Point },
    Quadratic { h: Point, to: Point },
    Arc {
        rx: f64,
        ry: f64,
        /// X axis rotation in degrees
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: Point,
    },
    /// Straight line back to the start of the current subpath
    Close,
}

struct Interpreter {
    unit_w: f64,
    unit_h: f64,
    current: Point,
    subpath_start: Point,
    cubic_mirror: Point,
    quadratic_mirror: Point,
    out: Vec<PathPrimitive>,
}

impl Interpreter {
    fn scaled(&self, x: f64, y: f64) -> Point {
        Point::new(x * self.unit_w, y * self.unit_h)
    }

    fn target(&self, relative: bool, x: f64, y: f64) -> Point {
        let p = self.scaled(x, y);
        if relative {
            Point::new(self.current.x + p.x, self.current.y + p.y)
        } else {
            p
        }
    }

    fn mirror(about: Point, handle: Point) -> Point {
        Point::new(2.0 * about.x - handle.x, 2.0 * about.y - handle.y)
    }

    fn run(&mut self, letter: char, params: &[f64]) {
        let relative = letter.is_ascii_lowercase();
        let upper = letter.to_ascii_uppercase();
        let group = match upper {
            'M' | 'L' | 'T' => 2,
            'H' | 'V' => 1,
            'C' => 6,
            'S' | 'Q' => 4,
            'A' => 7,
            'Z' => 0,
            _ => {
                warn!(command = %letter, "Unknown path command");
                return;
            }
        };

        if group == 0 {
            if !params.is_empty() {
                warn!(command = %letter, "Ignoring parameters of close command");
            }
            self.out.push(PathPrimitive::Close);
            self.current = self.subpath_start;
            self.reset_mirrors(upper);
            return;
        }

        if params.len() < group {
            warn!(command = %letter, parameters = params.len(), "Not enough parameters for path command");
            return;
        }

        let mut chunks = params.chunks_exact(group);
        for (index, chunk) in chunks.by_ref().enumerate() {
            // Pairs after the first pair of a move are implicit lines.
            let effective = if upper == 'M' && index > 0 { 'L' } else { upper };
            self.step(effective, relative, chunk);
        }
        if !chunks.remainder().is_empty() {
            warn!(
                command = %letter,
                leftover = chunks.remainder().len(),
                "Dropping incomplete parameter group"
            );
        }
        self.reset_mirrors(upper);
    }

    fn step(&mut self, command: char, relative: bool, p: &[f64]) {
        match command {
            'M' => {
                let to = self.target(relative, p[0], p[1]);
                self.out.push(PathPrimitive::Move { to });
                self.current = to;
                self.subpath_start = to;
            }
            'L' => {
                let to = self.target(relative, p[0], p[1]);
                self.line_to(to);
            }
            'H' => {
                let x = p[0] * self.unit_w;
                let x = if relative { self.current.x + x } else { x };
                self.line_to(Point::new(x, self.current.y));
            }
            'V' => {
                let y = p[0] * self.unit_h;
                let y = if relative { self.current.y + y } else { y };
                self.line_to(Point::new(self.current.x, y));
            }
            'C' => {
                let h1 = self.target(relative, p[0], p[1]);
                let h2 = self.target(relative, p[2], p[3]);
                let to = self.target(relative, p[4], p[5]);
                self.cubic_to(h1, h2, to);
            }
            'S' => {
                let h1 = Self::mirror(self.current, self.cubic_mirror);
                let h2 = self.target(relative, p[0], p[1]);
                let to = self.target(relative, p[2], p[3]);
                self.cubic_to(h1, h2, to);
            }
            'Q' => {
                let h = self.target(relative, p[0], p[1]);
                let to = self.target(relative, p[2], p[3]);
                self.quadratic_to(h, to);
            }
            'T' => {
                let h = Self::mirror(self.current, self.quadratic_mirror);
                let to = self.target(relative, p[0], p[1]);
                self.quadratic_to(h, to);
            }
            'A' => {
                let (large_arc, sweep) = match (flag(p[3]), flag(p[4])) {
                    (Some(large_arc), Some(sweep)) => (large_arc, sweep),
                    _ => {
                        warn!(large_arc = p[3], sweep = p[4], "Arc flags must be 0 or 1");
                        return;
                    }
                };
                let to = self.target(relative, p[5], p[6]);
                self.out.push(PathPrimitive::Arc {
                    rx: p[0] * self.unit_w,
                    ry: p[1] * self.unit_h,
                    rotation: p[2],
                    large_arc,
                    sweep,
                    to,
                });
                self.current = to;
            }
            _ => {}
        }
    }

    fn line_to(&mut self, to: Point) {
        self.out.push(PathPrimitive::Line { to });
        self.current = to;
    }

    fn cubic_to(&mut self, h1: Point, h2: Point, to: Point) {
        self.out.push(PathPrimitive::Cubic { h1, h2, to });
        self.cubic_mirror = h2;
        self.current = to;
    }

    fn quadratic_to(&mut self, h: Point, to: Point) {
        self.out.push(PathPrimitive::Quadratic { h, to });
        self.quadratic_mirror = h;
        self.current = to;
    }

    fn reset_mirrors(&mut self, command: char) {
        if !matches!(command, 'C' | 'S') {
            self.cubic_mirror = self.current;
        }
        if !matches!(command, 'Q' | 'T') {
            self.quadratic_mirror = self.current;
        }
    }
}

fn flag(value: f64) -> Option<bool> {
    if value == 0.0 {
        Some(false)
    } else if value == 1.0 {
        Some(true)
    } else {
        None
    }
}

/// Arc parameters. The two flags are single digits and may run into the
/// next number (`a1 1 0 01 3,4`).
fn parse_arc_numbers(text: &str) -> Vec<f64> {
    let mut values = Vec::new();
    let mut rest = text;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }
        if matches!(values.len() % 7, 3 | 4) {
            if let Some(digit) = rest.strip_prefix('0') {
                values.push(0.0);
                rest = digit;
                continue;
            }
            if let Some(digit) = rest.strip_prefix('1') {
                values.push(1.0);
                rest = digit;
                continue;
            }
        }
        let number = LEADING_NUMBER
            .find(rest)
            .and_then(|m| m.as_str().parse::<f64>().ok().map(|value| (value, m.end())));
        match number {
            Some((value, end)) => {
                values.push(value);
                rest = &rest[end..];
            }
            None => {
                let skip = rest.chars().next().map_or(1, char::len_utf8);
                rest = &rest[skip..];
            }
        }
    }
    values
}

/// Interprets path data. `unit_w`/`unit_h` convert user units to mm.
pub fn interpret_path(d: &str, unit_w: f64, unit_h: f64) -> Vec<PathPrimitive> {
    let mut interpreter = Interpreter {
        unit_w,
        unit_h,
        current: Point::default(),
        subpath_start: Point::default(),
        cubic_mirror: Point::default(),
        quadratic_mirror: Point::default(),
        out: Vec::new(),
    };

    if let Some(first) = COMMAND.find(d) {
        if !d[..first.start()].trim().is_empty() {
            warn!(data = %&d[..first.start()], "Ignoring path data before the first command");
        }
    }

    for command in COMMAND.find_iter(d) {
        let text = command.as_str();
        let Some(letter) = text.chars().next() else {
            continue;
        };
        let body = &text[letter.len_utf8()..];
        let params = if letter.eq_ignore_ascii_case(&'a') {
            parse_arc_numbers(body)
        } else {
            parse_numbers(body)
        };
        interpreter.run(letter, &params);
    }

    interpreter.out
}
