use super::uncentered;
use std::f64::consts::PI;
use svgtoolpath_camtools::write_gcode;
use svgtoolpath_core::Command;
use svgtoolpath_settings::GcodeFlavor;

fn line() -> Vec<Command> {
    vec![Command::travel(5.0, 20.0), Command::extrude(15.0, 20.0, 0.4)]
}

#[test]
fn test_marlin_start_sequence() {
    let output = write_gcode(&uncentered(), &line()).unwrap();
    assert!(output.gcode.starts_with(
        "T0\nM82\nG92 E0\nM109 S205\nM190 S60\nG0 F1500 E-6.5\nM107\nM204 S3000\nM205 X20 Y20\n;LAYER:0\nG0 F15000 Z0.27\nG0 Z0.270000\n"
    ));
    assert!(output.gcode.ends_with("M140 S0\nM104 S0\nM107\n"));
    assert!(!output.gcode.contains("START_OF_HEADER"));
}

#[test]
fn test_griffin_header() {
    let mut config = uncentered();
    config.machine.gcode_flavor = GcodeFlavor::Griffin;
    config.machine.name = "Ultimaker S5".to_string();
    config.material.guid = "506c9f0d-e3aa-4bd4-b2d2-23e2425b1aa9".to_string();
    let output = write_gcode(&config, &line()).unwrap();
    let gcode = &output.gcode;

    assert!(gcode.starts_with(";START_OF_HEADER\n;HEADER_VERSION:0.1\n;FLAVOR:Griffin\n"));
    for expected in [
        ";GENERATOR.NAME:svgtoolpath\n",
        ";TARGET_MACHINE.NAME:Ultimaker S5\n",
        ";EXTRUDER_TRAIN.0.INITIAL_TEMPERATURE:205\n",
        ";EXTRUDER_TRAIN.0.MATERIAL.GUID:506c9f0d-e3aa-4bd4-b2d2-23e2425b1aa9\n",
        ";EXTRUDER_TRAIN.0.NOZZLE.DIAMETER:0.4\n",
        ";EXTRUDER_TRAIN.0.NOZZLE.NAME:AA 0.4\n",
        ";BUILD_PLATE.TYPE:glass\n",
        ";PRINT.SIZE.MIN.X:5\n",
        ";PRINT.SIZE.MIN.Y:180\n",
        ";PRINT.SIZE.MIN.Z:0.27\n",
        ";PRINT.SIZE.MAX.X:15\n",
        ";PRINT.SIZE.MAX.Y:180\n",
        ";END_OF_HEADER\nT0\nM82\n",
    ] {
        assert!(gcode.contains(expected), "missing {expected:?}");
    }
}

#[test]
fn test_start_gcode_and_prime_blob() {
    let mut config = uncentered();
    config.machine.start_gcode = "G28 ; home\n".to_string();
    config.machine.prime_blob_enable = true;
    config.machine.prime_pos_x = 10.0;
    config.machine.prime_pos_y = 20.0;
    config.retraction.enable = false;
    let output = write_gcode(&config, &line()).unwrap();
    assert!(output.gcode.starts_with(
        "G28 ; home\nT0\nM82\nG92 E0\nM109 S205\nM190 S60\nG0 F15000 X10 Y20 Z2\nG280\nM107\n"
    ));
}

#[test]
fn test_volumetric_flavors_skip_filament_area() {
    let marlin = write_gcode(&uncentered(), &line()).unwrap();
    for flavor in [GcodeFlavor::UltiGCode, GcodeFlavor::RepRapVolumetric] {
        let mut config = uncentered();
        config.machine.gcode_flavor = flavor;
        let volumetric = write_gcode(&config, &line()).unwrap();

        // 10 mm long, first layer thick, default line width.
        let mm3 = 10.0 * 0.27 * 0.4;
        assert!((volumetric.extruded - mm3).abs() < 1e-9, "{flavor}");
        let area = PI * 2.85 * 2.85 / 4.0;
        assert!((marlin.extruded - mm3 / area).abs() < 1e-9);
        assert!((volumetric.volume_used - marlin.volume_used).abs() < 1e-9);
    }
}

#[test]
fn test_first_layer_flow() {
    let mut config = uncentered();
    config.machine.gcode_flavor = GcodeFlavor::UltiGCode;
    config.material.flow_layer_0 = 2.0;
    config.material.flow = 0.5;
    config.reader.height = 0.37;
    let output = write_gcode(&config, &line()).unwrap();
    // Layer 0 at double flow, then one layer at half flow.
    let expected = 10.0 * 0.27 * 0.4 * 2.0 + 10.0 * 0.1 * 0.4 * 0.5;
    assert!((output.extruded - expected).abs() < 1e-9);
}
