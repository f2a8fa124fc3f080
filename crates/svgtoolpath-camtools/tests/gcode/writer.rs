use super::{assert_retraction_balanced, square, uncentered, word};
use svgtoolpath_camtools::{write_gcode, CamToolError};
use svgtoolpath_core::Command;
use svgtoolpath_visualizer::SegmentKind;

fn body(gcode: &str) -> Vec<&str> {
    gcode
        .lines()
        .skip_while(|l| *l != ";LAYER:0")
        .skip(2)
        .collect()
}

#[test]
fn test_retraction_around_every_travel() {
    let mut config = uncentered();
    config.reader.height = 0.5;
    let mut commands = square(10.0, 10.0, 5.0);
    commands.extend(square(50.0, 50.0, 5.0));
    let output = write_gcode(&config, &commands).unwrap();

    assert_retraction_balanced(&output.gcode);
    assert_eq!(output.layers.layer_count(), 3);
    assert_eq!(output.gcode.matches("M82").count(), 1);
}

#[test]
fn test_y_axis_flipped_for_corner_origin() {
    let config = uncentered();
    let commands = vec![Command::travel(5.0, 20.0), Command::extrude(15.0, 20.0, 0.4)];
    let output = write_gcode(&config, &commands).unwrap();
    let lines = body(&output.gcode);

    assert_eq!(lines[0], "G0 Z0.270000");
    assert_eq!(lines[1], "G0 X5.000000 Y180.000000 F6000.000000");
    assert_eq!(lines[2], "G0 F1500 E0.000000");
    assert!(lines[3].starts_with("G1 X15.000000 F1200.000000 E"));

    let bounds = output.bounds;
    assert_eq!((bounds.min_x, bounds.max_x), (5.0, 15.0));
    assert_eq!((bounds.min_y, bounds.max_y), (180.0, 180.0));
}

#[test]
fn test_layer_view_polygon() {
    let config = uncentered();
    let commands = vec![Command::travel(5.0, 20.0), Command::extrude(15.0, 20.0, 0.4)];
    let output = write_gcode(&config, &commands).unwrap();
    let layer = output.layers.layer(0).unwrap();
    assert_eq!(layer.polygons.len(), 1);

    let polygon = &layer.polygons[0];
    assert!(polygon.is_consistent());
    let plan: Vec<(f64, f64)> = polygon.vertices.iter().map(|v| (v.x, v.depth)).collect();
    assert_eq!(plan, vec![(-100.0, 100.0), (-95.0, -80.0), (-85.0, -80.0)]);
    assert!(polygon.vertices.iter().all(|v| v.height == 0.27));
    assert_eq!(polygon.kinds, vec![SegmentKind::MoveRetraction, SegmentKind::Inset0]);
    assert_eq!(polygon.widths, vec![0.1, 0.4]);
    assert_eq!(polygon.thicknesses, vec![0.0, 0.27]);
    assert_eq!(polygon.feedrates, vec![100.0, 20.0]);
}

#[test]
fn test_centered_origin_and_combing() {
    let mut config = uncentered();
    config.machine.center_is_zero = true;
    config.retraction.enable = false;
    let commands = vec![Command::travel(5.0, 20.0), Command::extrude(15.0, 20.0, 0.4)];
    let output = write_gcode(&config, &commands).unwrap();
    let lines = body(&output.gcode);

    assert_eq!(lines[1], "G0 X5.000000 Y-20.000000 F6000.000000");
    assert!(lines[2].starts_with("G1 X15.000000 F1200.000000 E"));
    assert!(!output.gcode.contains("E-"));

    let polygon = &output.layers.layer(0).unwrap().polygons[0];
    assert_eq!(polygon.vertices[1].depth, 20.0);
    assert_eq!(polygon.kinds[0], SegmentKind::MoveCombing);
}

#[test]
fn test_travel_to_current_position_is_dropped() {
    let mut config = uncentered();
    config.machine.center_is_zero = true;
    config.reader.height = 0.37;
    let commands = vec![Command::travel(0.0, 0.0), Command::extrude(10.0, 0.0, 0.4)];
    let output = write_gcode(&config, &commands).unwrap();
    let lines = body(&output.gcode);

    // Layer 0 starts where the head already is.
    assert_eq!(lines[1], "G0 F1500 E0.000000");
    assert!(lines[2].starts_with("G1 X10.000000 F1200.000000 E"));
    // Layer 1 travels back at the faster travel speed.
    assert_eq!(lines[3], ";LAYER:1");
    assert_eq!(lines[4], "G0 Z0.370000");
    assert_eq!(lines[5], "M104 S200");
    assert_eq!(lines[6], "M140 S60");
    assert!(lines[7].starts_with("G0 F1500 E"));
    assert_eq!(lines[8], "G0 X0.000000 F9000.000000");
    assert!(lines[10].starts_with("G1 X10.000000 F1800.000000 E"));
    assert_retraction_balanced(&output.gcode);
}

#[test]
fn test_feedrate_restored_after_retract_and_prime() {
    let mut config = uncentered();
    config.speed.travel_layer_0 = 20.0;
    config.speed.print_layer_0 = 20.0;
    let commands = vec![
        Command::travel(5.0, 20.0),
        Command::extrude(15.0, 20.0, 0.4),
        Command::travel(30.0, 20.0),
        Command::extrude(40.0, 20.0, 0.4),
    ];
    let output = write_gcode(&config, &commands).unwrap();
    let lines = body(&output.gcode);

    assert_eq!(lines[1], "G0 X5.000000 Y180.000000 F1200.000000");
    assert_eq!(lines[2], "G0 F1500 E0.000000");
    assert!(lines[3].starts_with("G1 X15.000000 F1200.000000 E"));
    assert!(lines[4].starts_with("G0 F1500 E"));
    assert_eq!(lines[5], "G0 X30.000000 F1200.000000");

    for pair in lines.windows(2) {
        let filament_only = pair[0].starts_with("G0 F") && word(pair[0], 'X').is_none();
        if filament_only && word(pair[1], 'X').is_some() {
            assert!(word(pair[1], 'F').is_some(), "no feedrate on `{}`", pair[1]);
        }
    }
}

#[test]
fn test_requested_height_below_first_layer_prints_once() {
    let mut config = uncentered();
    config.reader.height = 0.1;
    let output = write_gcode(&config, &square(0.0, 0.0, 1.0)).unwrap();
    assert_eq!(output.layers.layer_count(), 1);
    assert!(!output.gcode.contains(";LAYER:1"));
}

#[test]
fn test_spiralize_ramps_z() {
    let mut config = uncentered();
    config.reader.spiralize = true;
    config.reader.height = 0.47;
    let output = write_gcode(&config, &square(0.0, 0.0, 10.0)).unwrap();

    assert!(!output.gcode.contains("G0 Z"));
    let heights: Vec<f64> = output
        .gcode
        .lines()
        .filter(|l| l.starts_with("G1"))
        .map(|l| word(l, 'Z').unwrap())
        .collect();
    assert_eq!(heights.len(), 12);
    assert!(heights.windows(2).all(|w| w[0] < w[1]), "{heights:?}");
    assert!((heights[3] - 0.27).abs() < 1e-6);
    assert!((heights[11] - 0.47).abs() < 1e-6);
}

#[test]
fn test_spiralize_ramps_first_layer_extrusion() {
    let mut config = uncentered();
    config.reader.spiralize = true;
    config.reader.height = 0.47;
    config.machine.gcode_flavor = svgtoolpath_settings::GcodeFlavor::UltiGCode;
    let output = write_gcode(&config, &square(0.0, 0.0, 10.0)).unwrap();

    // Layer 0 deposits 1/4 + 2/4 + 3/4 + 4/4 of its four sides.
    let first = 40.0 * 0.27 * 0.4 * 0.625;
    let rest = 2.0 * 40.0 * 0.1 * 0.4;
    assert!((output.extruded - (first + rest)).abs() < 1e-9);
}

#[test]
fn test_centering_moves_drawing_to_plate_middle() {
    let mut config = uncentered();
    config.reader.center_enabled = true;
    let output = write_gcode(&config, &square(0.0, 0.0, 10.0)).unwrap();
    let bounds = output.bounds;
    assert_eq!((bounds.min_x, bounds.max_x), (95.0, 105.0));
    assert_eq!((bounds.min_y, bounds.max_y), (95.0, 105.0));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let mut config = uncentered();
    config.layers.layer_height = 0.0;
    let err = write_gcode(&config, &square(0.0, 0.0, 1.0)).unwrap_err();
    assert!(matches!(err, CamToolError::Config(_)));
}

#[test]
fn test_empty_toolpath_still_heats_and_cools() {
    let output = write_gcode(&uncentered(), &[]).unwrap();
    assert!(output.gcode.contains("M109 S205"));
    assert!(output.gcode.contains("M104 S0"));
    assert_eq!(output.layers.segment_count(), 0);
    assert_eq!(output.extruded, 0.0);
}

#[test]
fn test_save_and_export() {
    let output = write_gcode(&uncentered(), &square(0.0, 0.0, 1.0)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("square.gcode");
    output.save_gcode(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), output.gcode);

    let json = output.layers_json().unwrap();
    assert!(json.contains("Inset0"));
}
