use svgtoolpath_core::{Command, Point};
use svgtoolpath_designer::compile_svg;
use svgtoolpath_settings::Config;

const STEP_TOLERANCE: f64 = 0.001;

fn compile(source: &str) -> Vec<Command> {
    compile_svg(source, &Config::default(), None).unwrap()
}

fn bbox(commands: &[Command]) -> (Point, Point) {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in commands.iter().map(Command::position) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

fn assert_near(actual: Point, expected: Point) {
    assert!(
        actual.distance_to(&expected) < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn max_step(commands: &[Command]) -> f64 {
    commands
        .windows(2)
        .filter(|pair| pair[1].is_extrude())
        .map(|pair| pair[0].position().distance_to(&pair[1].position()))
        .fold(0.0, f64::max)
}

#[test]
fn test_rect_is_closed_four_segment_outline() {
    let commands = compile(r#"<svg><rect width="10" height="10"/></svg>"#);
    assert_eq!(commands.len(), 5);
    assert!(commands[0].is_travel());
    assert!(commands[1..].iter().all(Command::is_extrude));
    assert_eq!(commands[0].position(), commands[4].position());
    let (min, max) = bbox(&commands);
    assert_near(min, Point::new(0.0, 0.0));
    assert_near(max, Point::new(10.0, 10.0));
    assert_eq!(commands[1].line_width(), Some(0.4));
}

#[test]
fn test_rounded_rect_stays_inside_bounds() {
    let commands = compile(r#"<svg><rect x="2" y="2" width="10" height="6" rx="20"/></svg>"#);
    let (min, max) = bbox(&commands);
    assert!(min.x >= 2.0 - 1e-9 && min.y >= 2.0 - 1e-9);
    assert!(max.x <= 12.0 + 1e-9 && max.y <= 8.0 + 1e-9);
    // Radii clamp to 5 x 3, so the outline is an ellipse around (7, 5).
    for p in commands.iter().map(Command::position) {
        let nx = (p.x - 7.0) / 5.0;
        let ny = (p.y - 5.0) / 3.0;
        assert!((nx * nx + ny * ny - 1.0).abs() < 1e-6, "{p} off the ellipse");
    }
    assert!(max_step(&commands) <= 0.5 + STEP_TOLERANCE);
}

#[test]
fn test_circle_covers_full_circle() {
    let commands = compile(r#"<svg><circle cx="5" cy="5" r="5"/></svg>"#);
    assert!(commands[0].is_travel());
    assert_eq!(commands.iter().filter(|c| c.is_travel()).count(), 1);
    assert_near(commands[0].position(), Point::new(10.0, 5.0));
    assert_near(commands[commands.len() - 1].position(), Point::new(10.0, 5.0));
    assert!(max_step(&commands) <= 0.5 + STEP_TOLERANCE);
    let (min, max) = bbox(&commands);
    assert_near(min, Point::new(0.0, 0.0));
    assert_near(max, Point::new(10.0, 10.0));
    // Circumference / resolution, give or take the four arc ends.
    assert!(commands.len() > 60 && commands.len() < 70, "{}", commands.len());
}

#[test]
fn test_zero_sized_shapes_produce_nothing() {
    let commands = compile(
        r#"<svg>
             <rect width="0" height="10"/>
             <circle r="0"/>
             <ellipse rx="3" ry="0"/>
             <polygon points="1 1"/>
           </svg>"#,
    );
    assert!(commands.is_empty());
}

#[test]
fn test_line_and_polyline() {
    let commands = compile(
        r#"<svg>
             <line x1="1" y1="1" x2="4" y2="5" stroke-width="1mm"/>
             <polyline points="0,0 10,0 10,10 7"/>
           </svg>"#,
    );
    assert_eq!(
        commands,
        vec![
            Command::travel(1.0, 1.0),
            Command::extrude(4.0, 5.0, 1.0),
            Command::travel(0.0, 0.0),
            Command::extrude(10.0, 0.0, 0.4),
            Command::extrude(10.0, 10.0, 0.4),
        ]
    );
}

#[test]
fn test_polygon_closes() {
    let commands = compile(r#"<svg><polygon points="0,0 10,0 10,10"/></svg>"#);
    assert_eq!(commands.len(), 4);
    assert_eq!(commands[3], Command::extrude(0.0, 0.0, 0.4));
}

#[test]
fn test_path_with_curves_ends_exactly() {
    let commands = compile(
        r#"<svg><path d="M0 0 C 0 10 10 10 10 0 Q 15 -5 20 0 A 5 5 0 0 1 30 0 Z"/></svg>"#,
    );
    assert!(commands[0].is_travel());
    // Everything but the straight closing segment is stepped.
    assert!(max_step(&commands[..commands.len() - 1]) <= 0.5 + STEP_TOLERANCE);
    let positions: Vec<Point> = commands.iter().map(Command::position).collect();
    for corner in [Point::new(10.0, 0.0), Point::new(20.0, 0.0), Point::new(30.0, 0.0)] {
        assert!(positions.contains(&corner), "missing {corner}");
    }
    assert_eq!(*positions.last().unwrap(), Point::new(0.0, 0.0));
}

#[test]
fn test_path_without_initial_move_travels_to_origin() {
    let commands = compile(r#"<svg><path d="L 5 0"/></svg>"#);
    assert_eq!(
        commands,
        vec![Command::travel(0.0, 0.0), Command::extrude(5.0, 0.0, 0.4)]
    );
}

#[test]
fn test_collinear_quadratic_is_one_segment() {
    let commands = compile(r#"<svg><path d="M0 0 Q 5 5 10 10"/></svg>"#);
    assert_eq!(
        commands,
        vec![Command::travel(0.0, 0.0), Command::extrude(10.0, 10.0, 0.4)]
    );
}

#[test]
fn test_transform_is_applied_before_stepping() {
    let commands = compile(
        r#"<svg><g transform="scale(3)"><circle r="2" stroke-width="0.6"/></g></svg>"#,
    );
    assert!(max_step(&commands) <= 0.5 + STEP_TOLERANCE);
    let (min, max) = bbox(&commands);
    assert_near(min, Point::new(-6.0, -6.0));
    assert_near(max, Point::new(6.0, 6.0));
    assert_eq!(commands[1].line_width(), Some(0.6));
}

#[test]
fn test_custom_resolution() {
    let mut config = Config::default();
    config.layers.resolution = 2.0;
    let commands = compile_svg(r#"<svg><circle r="10"/></svg>"#, &config, None).unwrap();
    assert!(max_step(&commands) <= 2.0 + STEP_TOLERANCE);
    assert!(commands.len() < 40);
}
