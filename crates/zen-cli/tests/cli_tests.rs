//! Tests for configuration loading, script running and error formatting.

use std::fs;

use pretty_assertions::assert_eq;
use zen_cli::{format_error, load_config, run_script, CliError, CONFIG_FILE};
use zen_eval::{Config, Value};
use zen_types::ErrorKind;

fn quiet() -> Config {
    Config {
        echo_print: false,
        ..Config::default()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Configuration
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(load_config(dir.path(), None).unwrap(), Config::default());
}

#[test]
fn test_config_file_in_directory_is_used() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE),
        r#"{ "max_call_depth": 64, "module_roots": ["src"] }"#,
    )
    .unwrap();
    let config = load_config(dir.path(), None).unwrap();
    assert_eq!(config.max_call_depth, 64);
    assert_eq!(config.module_roots, [std::path::PathBuf::from("src")]);
    assert!(config.echo_print);
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("other.json");
    let err = load_config(dir.path(), Some(&missing)).unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{ "depth": 1 }"#).unwrap();
    let err = load_config(dir.path(), Some(&path)).unwrap_err();
    assert!(matches!(err, CliError::Config { .. }));
    assert!(err.to_string().starts_with("invalid configuration in "));
}

// ══════════════════════════════════════════════════════════════════════════════
// Scripts
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_script_returns_last_value() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("main.zen");
    fs::write(&script, "fx twice(n) { return n * 2 }\ntwice(21)").unwrap();
    assert_eq!(run_script(&script, quiet()).unwrap(), Value::Integer(42));
}

#[test]
fn test_run_script_loads_sibling_modules() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shapes.zen"), "fx Area(w, h) { return w * h }").unwrap();
    let script = dir.path().join("main.zen");
    fs::write(&script, "load(\"shapes\")\nshapes.Area(3, 4)").unwrap();
    let config = Config {
        module_roots: vec![dir.path().to_path_buf()],
        ..quiet()
    };
    assert_eq!(run_script(&script, config).unwrap(), Value::Integer(12));
}

#[test]
fn test_script_error_is_rendered_against_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("main.zen");
    fs::write(&script, "x = 1\ny = x + nil").unwrap();
    let Err(CliError::Script { error, unit }) = run_script(&script, quiet()) else {
        panic!("expected a script error");
    };
    assert_eq!(error.kind, ErrorKind::TypeError);

    let rendered = format_error(&error, &unit, false);
    assert!(rendered.starts_with("TypeError: "));
    assert!(rendered.contains(":2:5"));
    assert!(rendered.contains(" 2 | y = x + nil"));

    let json = format_error(&error, &unit, true);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["kind"], "TypeError");
    assert_eq!(parsed["span"]["line"], 2);
}

#[test]
fn test_missing_script_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_script(&dir.path().join("nope.zen"), quiet()).unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}
