//! Integration tests for config subcommands

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use segskip::Config;

use crate::helpers::segskip;

#[test]
fn config_path_honors_override() {
    let config = TempDir::new().unwrap();
    let expected = config.path().join("config.toml");
    segskip(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn config_show_prints_defaults() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[skip]"))
        .stdout(predicate::str::contains("chain_margin_ms = 1000"))
        .stdout(predicate::str::contains("server = \"sponsor.ajay.app\""))
        .stdout(predicate::str::contains("seek_hint_ttl_ms = 3000"));
}

#[test]
fn config_show_reads_file() {
    let config = TempDir::new().unwrap();
    fs::write(
        config.path().join("config.toml"),
        "[prompt]\nauto_upvote = true\n",
    )
    .unwrap();

    segskip(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auto_upvote = true"))
        .stdout(predicate::str::contains("show_skipped_dialog = true"));
}

#[test]
fn config_show_rejects_broken_file() {
    let config = TempDir::new().unwrap();
    fs::write(config.path().join("config.toml"), "[skip\n").unwrap();

    segskip(&config)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn migrate_creates_missing_file() {
    let config = TempDir::new().unwrap();
    let path = config.path().join("config.toml");

    segskip(&config)
        .args(["config", "migrate", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Will create with default settings"));

    let created = Config::load_from(&path).unwrap();
    assert_eq!(created, Config::default());
}

#[test]
fn migrate_adds_fields_and_keeps_values() {
    let config = TempDir::new().unwrap();
    let path = config.path().join("config.toml");
    fs::write(&path, "# tuned\n[skip]\nmin_skip_ms = 3000\n").unwrap();

    segskip(&config)
        .args(["config", "migrate", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ chain_margin_ms = 1000"))
        .stdout(predicate::str::contains("min_skip_ms").not());

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# tuned"));
    let migrated = Config::load_from(&path).unwrap();
    assert_eq!(migrated.skip.min_skip_ms, 3000);
    assert_eq!(migrated.skip.chain_margin_ms, 1000);

    segskip(&config)
        .args(["config", "migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is already up to date."));
}

#[test]
fn migrate_without_yes_is_declined_when_not_interactive() {
    let config = TempDir::new().unwrap();
    let path = config.path().join("config.toml");

    segskip(&config)
        .args(["config", "migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes made."));

    assert!(!path.exists());
}
