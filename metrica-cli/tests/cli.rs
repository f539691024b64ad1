//! End-to-end tests for the metrica binary
//!
//! These tests build and spawn the binary and are gated behind the
//! `integration` feature flag. Run with:
//!
//! ```sh
//! cargo test -p metrica-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn metrica(home: &Path, args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "metrica-cli", "--"])
        .args(args)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("METRICA_PROJECT_CONFIG_DIR", home.join("project"))
        .output()
        .expect("Failed to run metrica")
}

/// Test that metrica --help lists the commands
#[test]
fn metrica_help_lists_commands() {
    let home = TempDir::new().unwrap();
    let output = metrica(home.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["compute", "stats", "validate", "visualize", "cache", "config"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

/// Test that metrica config show works without config files
#[test]
fn metrica_config_show_prints_defaults() {
    let home = TempDir::new().unwrap();
    let output = metrica(home.path(), &["config", "show"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[cache]"));
    assert!(stdout.contains("ttl_hours = 24"));
    assert!(stdout.contains("project_id = 1"));
}

/// Test that metrica validate reports a sample result and rejects bad formulas
#[test]
fn metrica_validate_checks_formula_against_data() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("survey.json");
    std::fs::write(&data, r#"[{"age": 30}, {"age": 50}]"#).unwrap();
    let data = data.to_str().unwrap();

    let output = metrica(home.path(), &["validate", "AVG(age)", "--data", data]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Sample result: 40"));

    let output = metrica(home.path(), &["validate", "SUM(weight)", "--data", data]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Column 'weight' not found"));
}

/// Test that a zero cache TTL in the project config is rejected
#[test]
fn metrica_rejects_non_positive_ttl() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("config.toml"), "[cache]\nttl_hours = 0\n").unwrap();

    let output = metrica(home.path(), &["cache", "stats"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ttl_hours"));
}

/// Compute, save values, visualize twice and check the cache counted a hit
#[test]
fn metrica_compute_then_visualize_uses_cache() {
    let home = TempDir::new().unwrap();
    let dir = home.path();
    std::fs::write(
        dir.join("survey.json"),
        r#"[{"cases": 100}, {"cases": 150}, {"cases": 120}, {"cases": 130}]"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("indicators.json"),
        r#"[{"id": 1, "name": "Total cases", "formula": "SUM(cases)"}]"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("viz.json"),
        r#"{
            "id": 3,
            "project_id": 1,
            "visualization_type": "single_value",
            "dimensions": {"data": [1]},
            "updated_at": "2024-05-01T00:00:00Z"
        }"#,
    )
    .unwrap();
    let values = dir.join("values.json");

    let compute = metrica(
        dir,
        &[
            "compute",
            "--data",
            dir.join("survey.json").to_str().unwrap(),
            "--indicators",
            dir.join("indicators.json").to_str().unwrap(),
            "--period",
            "Q1 2024",
            "--output",
            values.to_str().unwrap(),
        ],
    );
    assert!(compute.status.success());
    assert!(String::from_utf8_lossy(&compute.stdout).contains("500"));

    let viz = dir.join("viz.json");
    let visualize_args = [
        "visualize",
        viz.to_str().unwrap(),
        "--values",
        values.to_str().unwrap(),
        "--compact",
    ];
    let first = metrica(dir, &visualize_args);
    let second = metrica(dir, &visualize_args);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert!(String::from_utf8_lossy(&first.stdout).contains(r#""value":500.0"#));

    let stats = metrica(dir, &["cache", "stats"]);
    let stdout = String::from_utf8_lossy(&stats.stdout);
    assert!(stdout.contains("Entries:  1"));
    assert!(stdout.contains("Hits:     1"));
}
