use stagekit_communication::firmware::grbl::FirmwareParameter;
use stagekit_core::{AxisBounds, MoveOrder};
use stagekit_settings::{SettingsError, StageConfig, TagCatalog};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("stagekit.toml");

    let mut config = StageConfig::default();
    config.connection.ports = vec!["/dev/ttyACM3".to_string()];
    config.bounds.z = AxisBounds::new(-40.0, 0.0);
    config.motion.origin_return = MoveOrder::XyFirst;
    config.firmware.parameters = vec![FirmwareParameter::new(10, "1")];
    config.save_to_file(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("origin_return = \"xy_first\""));

    let loaded = StageConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stagekit.json");

    let mut config = StageConfig::default();
    config.motion.max_polls = 50;
    config.save_to_file(&path).unwrap();

    let loaded = StageConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded.motion.max_polls, 50);
    assert_eq!(loaded, config);
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stagekit.toml");
    std::fs::write(&path, "[bounds.x]\nmin = 200.0\nmax = 0.0\n").unwrap();

    let err = StageConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidSetting { ref key, .. } if key == "bounds.x"));
}

#[test]
fn test_load_or_default_without_file() {
    let dir = TempDir::new().unwrap();
    let config = StageConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(config, StageConfig::default());
}

#[test]
fn test_controller_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stagekit.toml");
    std::fs::write(
        &path,
        r#"
[connection]
ports = ["/dev/ttyUSB1"]
reply_timeout_ms = 250

[motion]
poll_interval_ms = 50
max_polls = 40
"#,
    )
    .unwrap();

    let controller = StageConfig::load_from_file(&path)
        .unwrap()
        .to_controller_config();
    assert_eq!(controller.ports, vec!["/dev/ttyUSB1"]);
    assert_eq!(controller.transport.reply_timeout, Duration::from_millis(250));
    assert_eq!(controller.poll.interval, Duration::from_millis(50));
    assert_eq!(controller.poll.budget(), Duration::from_secs(2));
    assert_eq!(controller.origin_return, MoveOrder::ZFirst);
}

#[test]
fn test_catalog_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("coordinates_10.json");
    std::fs::write(
        &path,
        r#"{"tags": [{"tag": 10, "x": 150.0, "y": 40.0, "z": -30.0}]}"#,
    )
    .unwrap();

    let catalog = TagCatalog::load(&path).unwrap();
    assert_eq!(catalog.get("10"), Some((150.0, 40.0, -30.0)));
}

#[test]
fn test_missing_catalog_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = TagCatalog::load(&dir.path().join("none.json")).unwrap_err();
    assert!(matches!(err, SettingsError::IoError(_)));
}
