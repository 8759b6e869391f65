// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use projwatch::config::{load_and_validate, load_or_default};
use projwatch::errors::ProjwatchError;

#[test]
fn full_config_is_loaded() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[watch]
initial_delay_ms = 250
interval_ms = 2000
expandable_extensions = ["gltf", "glb", "USDZ"]
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    let options = cfg.watch_options();

    assert_eq!(options.timing.initial_delay, Duration::from_millis(250));
    assert_eq!(options.timing.interval, Duration::from_millis(2000));
    assert!(options.expandable.contains(Some("usdz")));
}

#[test]
fn empty_file_uses_defaults() {
    let file = NamedTempFile::new().unwrap();
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.poll_timing().initial_delay, Duration::from_millis(1000));
    assert_eq!(cfg.poll_timing().interval, Duration::from_millis(5000));
    let exts: Vec<_> = cfg.expandable_extensions().iter().map(str::to_string).collect();
    assert_eq!(exts, vec!["gltf", "glb"]);
}

#[test]
fn zero_initial_delay_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[watch]\ninitial_delay_ms = 0\n").unwrap();

    match load_and_validate(file.path()) {
        Err(ProjwatchError::ConfigError(msg)) => assert!(msg.contains("initial_delay_ms")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_key_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[watch]\npoll_every = 3\n").unwrap();

    match load_and_validate(file.path()) {
        Err(ProjwatchError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(dir.path().join("Projwatch.toml")).unwrap();
    assert_eq!(cfg.poll_timing().interval, Duration::from_millis(5000));
}

#[test]
fn missing_explicit_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ProjwatchError::IoError(_))));
}
