use svgtoolpath_settings::{Config, ConfigError, GcodeFlavor};
use tempfile::tempdir;

#[test]
fn test_toml_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("printer.toml");

    let mut config = Config::default();
    config.machine.name = "Test Printer".to_string();
    config.machine.gcode_flavor = GcodeFlavor::Griffin;
    config.reader.height = 2.5;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.machine.name, "Test Printer");
    assert_eq!(loaded.machine.gcode_flavor, GcodeFlavor::Griffin);
    assert_eq!(loaded.reader.height, 2.5);
}

#[test]
fn test_json_round_trip_creates_parent_dirs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("printer.json");

    let mut config = Config::default();
    config.retraction.enable = false;
    config.machine.gcode_flavor = GcodeFlavor::RepRapVolumetric;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert!(!loaded.retraction.enable);
    assert!(loaded.machine.gcode_flavor.is_volumetric());
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "[layers]\nlayer_height = 0.2\n").unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.layers.layer_height, 0.2);
    assert_eq!(loaded.layers.line_width, Config::default().layers.line_width);
    assert_eq!(loaded.machine.width, Config::default().machine.width);
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"layers": {"resolution": 0.0}}"#).unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "layers.resolution"));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[machine\nwidth = ").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempdir().unwrap();
    let err = Config::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
