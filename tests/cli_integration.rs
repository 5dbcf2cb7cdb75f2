//! Integration tests for the dronesense binary.

#![allow(clippy::unwrap_used)]

mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use dronesense::config::save_config;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_test_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    save_config(&common::test_config(), &path).unwrap();
    path
}

#[test]
fn test_run_command_end_to_end() {
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus");
    common::write_corpus(&corpus, 8);
    let config = write_test_config(dir.path());
    let out = dir.path().join("out");

    let mut cmd = cargo_bin_cmd!("dronesense");
    cmd.arg("--config")
        .arg(&config)
        .arg("--no-progress")
        .arg("run")
        .arg(&corpus)
        .arg("-o")
        .arg(&out)
        .arg("--family")
        .arg("logistic");

    // `run` trains every configured family, so `--family` is rejected
    cmd.assert().failure();

    let mut cmd = cargo_bin_cmd!("dronesense");
    cmd.arg("--config")
        .arg(&config)
        .arg("--no-progress")
        .arg("run")
        .arg(&corpus)
        .arg("-o")
        .arg(&out);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("binary / logistic"))
        .stdout(predicate::str::contains("multiclass / forest"))
        .stdout(predicate::str::contains("truth\\pred"));

    assert!(out.join("features.csv").is_file());
    assert!(out.join("failures.csv").is_file());
    assert!(out.join("report.json").is_file());
    assert!(out.join("rasters/background/background_00.png").is_file());
}

#[test]
fn test_extract_then_train() {
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus");
    common::write_corpus(&corpus, 8);
    let config = write_test_config(dir.path());
    let out = dir.path().join("out");

    cargo_bin_cmd!("dronesense")
        .arg("--config")
        .arg(&config)
        .arg("-q")
        .arg("extract")
        .arg(&corpus)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let table = fs::read_to_string(out.join("features.csv")).unwrap();
    assert!(table.starts_with("id,label,px_0,px_1,"));
    assert_eq!(table.lines().count(), 33);

    cargo_bin_cmd!("dronesense")
        .arg("--config")
        .arg(&config)
        .arg("-q")
        .arg("train")
        .arg(out.join("features.csv"))
        .arg("-o")
        .arg(dir.path().join("models"))
        .arg("--task")
        .arg("binary")
        .arg("--family")
        .arg("forest")
        .assert()
        .success()
        .stdout(predicate::str::contains("binary / forest"))
        .stdout(predicate::str::contains("multiclass").not());

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("models/report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(report["tasks"][0]["models"][0]["family"], "forest");
}

#[test]
fn test_missing_corpus_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(dir.path());

    cargo_bin_cmd!("dronesense")
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(dir.path().join("nowhere"))
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error: corpus directory not found"));
}

#[test]
fn test_train_rejects_wrong_table_width() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(dir.path());
    let table = dir.path().join("features.csv");
    fs::write(&table, "id,label,px_0,px_1\nr1,ar,0.1,0.2\n").unwrap();

    cargo_bin_cmd!("dronesense")
        .arg("--config")
        .arg(&config)
        .arg("train")
        .arg(&table)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 64 'px_*' columns"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[training]\nfolds = 1\n").unwrap();

    cargo_bin_cmd!("dronesense")
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(dir.path())
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration validation failed"));
}

#[test]
fn test_config_init_show_path() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("nested/config.toml");

    cargo_bin_cmd!("dronesense")
        .arg("--config")
        .arg(&config)
        .arg("config")
        .arg("path")
        .assert()
        .success()
        .stdout(predicate::str::contains("nested"));

    cargo_bin_cmd!("dronesense")
        .arg("--config")
        .arg(&config)
        .arg("config")
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(config.is_file());

    cargo_bin_cmd!("dronesense")
        .arg("--config")
        .arg(&config)
        .arg("config")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("size = 122"))
        .stdout(predicate::str::contains("background_class = \"background\""));
}
