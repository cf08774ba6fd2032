use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

const BIN: &str = env!("CARGO_BIN_EXE_argrules");

/// Rule set shared by most tests.
const RULES_YAML: &str = r#"
name: dragon-ball
description: Track power levels
rules:
  - name: --power-level
    aliases: [-p]
    type: int
    default: 10
    env: POWER_LEVEL
    help: Specify our power level
  - name: --verbose
    type: count
  - name: fighter
    kind: positional
    help: Who to measure
  - name: user
    kind: config
    group: database
"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write test file");
    path
}

fn run(args: &[&str]) -> Output {
    std::process::Command::new(BIN)
        .args(args)
        .env_remove("POWER_LEVEL")
        .env_remove("ARGRULES_LOG")
        .output()
        .expect("failed to run argrules")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_prints_json_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write_file(dir.path(), "rules.yaml", RULES_YAML);

    let out = run(&[
        "parse",
        "--rules",
        rules.to_str().unwrap(),
        "--",
        "-p",
        "9001",
        "--verbose",
        "--verbose",
        "goku",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let json: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(json["power-level"], 9001);
    assert_eq!(json["verbose"], 2);
    assert_eq!(json["fighter"], "goku");
    assert_eq!(json["help"], false);
}

#[test]
fn parse_env_and_config_layers() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write_file(dir.path(), "rules.yaml", RULES_YAML);
    let config = write_file(
        dir.path(),
        "app.ini",
        "power-level=500\n[database]\nuser=bulma\n",
    );

    let out = run(&[
        "parse",
        "--rules",
        rules.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--optional-config",
        dir.path().join("missing.yaml").to_str().unwrap(),
        "--format",
        "table",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let table = stdout(&out);
    assert!(table.contains("power-level    500\n"), "table:\n{table}");
    assert!(table.contains("database.user  bulma\n"), "table:\n{table}");

    let out = run(&[
        "parse",
        "--rules",
        rules.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--env",
        "POWER_LEVEL=42",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let json: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(json["power-level"], 42);
}

#[test]
fn parse_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write_file(dir.path(), "rules.yaml", RULES_YAML);

    let out = run(&[
        "parse",
        "--rules",
        rules.to_str().unwrap(),
        "--",
        "--power-level",
        "over-ten-thousand",
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        stderr(&out).trim(),
        "error: Invalid value for '--power-level' - 'over-ten-thousand' is not an Integer"
    );
}

#[test]
fn parse_help_flag_prints_help() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write_file(dir.path(), "rules.yaml", RULES_YAML);

    let out = run(&["parse", "--rules", rules.to_str().unwrap(), "--", "-h"]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("Usage: dragon-ball [OPTIONS] [fighter]\n"));
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

#[test]
fn help_renders_sections() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write_file(dir.path(), "rules.yaml", RULES_YAML);

    let out = run(&["help", "--rules", rules.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let help = stdout(&out);
    assert!(help.contains("\nTrack power levels\n"));
    assert!(help.contains("\nPositionals:\n  fighter  Who to measure\n"));
    assert!(help.contains("  -p, --power-level  Specify our power level\n"));
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_good_rule_sets() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = write_file(dir.path(), "rules.yaml", RULES_YAML);
    let json = write_file(
        dir.path(),
        "rules.json",
        r#"{"rules": [{"name": "target", "kind": "positional", "required": true}]}"#,
    );

    let out = run(&[
        "validate",
        "--rules",
        yaml.to_str().unwrap(),
        json.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(
        stdout(&out).trim(),
        "Validated 2 rule set file(s) with 5 rule(s)."
    );
}

#[test]
fn validate_rejects_duplicates_and_bad_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let dup = write_file(
        dir.path(),
        "dup.json",
        r#"{"rules": [{"name": "--debug", "type": "bool"}, {"name": "debug", "kind": "config"}]}"#,
    );
    let bad = write_file(
        dir.path(),
        "bad.yaml",
        "rules:\n  - name: --level\n    type: int\n    default: high\n",
    );

    let out = run(&["validate", "--rules", dup.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Duplicate option 'debug' defined"));

    let out = run(&["validate", "--rules", bad.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Bad default value for '--level' - 'high' is not an Integer"));
}
