//! Tests for loading settings files through the command line
use std::io::Write;
use std::time::Duration;

use clap::Parser;
use dataview_inline::config::{Args, Command, Config, DEFAULT_RENDERER};

fn settings_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create settings file");
    file.write_all(content.as_bytes()).expect("write settings");
    file
}

fn parse(argv: &[&str]) -> Args {
    let mut full = vec!["dataview-inline"];
    full.extend_from_slice(argv);
    Args::try_parse_from(full).expect("parse args")
}

#[test]
fn test_explicit_settings_file_is_loaded() {
    let file = settings_file(
        r#"
sweep_interval_ms = 750
extensions = ["md", "markdown"]

[renderer]
command = "dv-render"
args = ["--vault", "/notes"]
"#,
    );
    let path = file.path().to_str().expect("utf-8 path");

    let config = Config::from_args(parse(&["--config", path, "watch", "notes"]))
        .expect("load config");

    assert_eq!(config.settings_path.as_deref(), Some(file.path()));
    assert_eq!(config.sweep_interval, Duration::from_millis(750));
    assert_eq!(config.renderer.command, "dv-render");
    assert_eq!(config.renderer.args, vec!["--vault", "/notes"]);
    assert!(config.tracks(std::path::Path::new("notes/a.markdown")));
    assert!(matches!(config.command, Command::Watch { .. }));
}

#[test]
fn test_empty_settings_file_keeps_defaults() {
    let file = settings_file("");
    let path = file.path().to_str().expect("utf-8 path");

    let config = Config::from_args(parse(&["--config", path])).expect("load config");

    assert_eq!(config.command, Command::Serve);
    assert_eq!(config.renderer.command, DEFAULT_RENDERER);
    assert_eq!(config.sweep_interval, Duration::from_secs(2));
}

#[test]
fn test_missing_explicit_settings_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    let path = missing.to_str().expect("utf-8 path");

    let err = Config::from_args(parse(&["--config", path])).unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to read settings file"));
}

#[test]
fn test_malformed_settings_file_names_the_file() {
    let file = settings_file("sweep_interval_ms = \"soon\"");
    let path = file.path().to_str().expect("utf-8 path");

    let err = Config::from_args(parse(&["--config", path])).unwrap_err();

    assert!(err.to_string().contains("Failed to parse settings file"));
}

#[test]
fn test_zero_sweep_interval_in_settings_file_is_an_error() {
    let file = settings_file("sweep_interval_ms = 0\n");
    let path = file.path().to_str().expect("utf-8 path");

    let err = Config::from_args(parse(&["--config", path])).unwrap_err();

    assert!(err.to_string().contains("sweep_interval_ms must be at least 1"));
}
