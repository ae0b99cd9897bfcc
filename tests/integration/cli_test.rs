//! Integration tests for the segskip binary

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use crate::helpers::{segments_dir, segskip};

// ============================================================================
// Help Output Tests
// ============================================================================

#[test]
fn help_lists_subcommands() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_shows_package_version() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn no_arguments_is_usage_error() {
    let config = TempDir::new().unwrap();
    segskip(&config).assert().code(2);
}

// ============================================================================
// Validate
// ============================================================================

#[test]
fn validate_lists_valid_segments() {
    let config = TempDir::new().unwrap();
    let output = segskip(&config)
        .current_dir(segments_dir())
        .args(["validate", "valid.json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    insta::assert_snapshot!(String::from_utf8_lossy(&output.stdout), @r"
valid.json: 5 valid segment(s)
  intro-1 [intro] 0.500-4.000
  sponsor-1 [sponsor] 10.000-20.000
  sponsor-2 [sponsor] 20.500-30.000
  sponsor-3 [sponsor] 45.000-45.500
  sponsor-4 [sponsor] 60.000-75.000
");
}

#[test]
fn validate_rejects_out_of_order() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .current_dir(segments_dir())
        .args(["validate", "out_of_order.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("out_of_order.json is invalid"))
        .stderr(predicate::str::contains(
            "segment 1 (early): wrong order, starts at 5 but previous starts at 10",
        ));
}

#[test]
fn validate_rejects_too_short() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .current_dir(segments_dir())
        .args(["validate", "too_short.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("segment 0 (blip): invalid start/end time"));
}

#[test]
fn validate_accepts_empty_list() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .current_dir(segments_dir())
        .args(["validate", "empty.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no segments"));
}

#[test]
fn validate_missing_file_fails() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .args(["validate", "/nonexistent/segments.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn validate_malformed_json_fails() {
    let config = TempDir::new().unwrap();
    let file = config.path().join("broken.json");
    fs::write(&file, r#"[{"UUID": "a"}]"#).unwrap();

    segskip(&config)
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}

// ============================================================================
// Plan
// ============================================================================

#[test]
fn plan_walks_chained_skips() {
    let config = TempDir::new().unwrap();
    let output = segskip(&config)
        .current_dir(segments_dir())
        .args(["plan", "valid.json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report = format!(
        "--- plan valid.json ---\n{}",
        String::from_utf8_lossy(&output.stdout)
    );
    insta::assert_snapshot!(report, @r"
--- plan valid.json ---
       AT      UNTIL       LAND  SEGMENT
    0.500      4.000      4.000  intro-1 [intro]
   10.000     30.000     30.000  sponsor-1 [sponsor]
   60.000     75.000     75.000  sponsor-4 [sponsor]
");
}

#[test]
fn plan_from_later_time() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .current_dir(segments_dir())
        .args(["plan", "valid.json", "--from", "35"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sponsor-4"))
        .stdout(predicate::str::contains("sponsor-1").not());
}

#[test]
fn plan_uses_configured_margins() {
    let config = TempDir::new().unwrap();
    fs::write(
        config.path().join("config.toml"),
        "[skip]\nreduce_skips_ms = 2000\nchain_margin_ms = 0\n",
    )
    .unwrap();

    // Without chain margin sponsor-2 is a skip of its own
    segskip(&config)
        .current_dir(segments_dir())
        .args(["plan", "valid.json", "--from", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "   10.000     20.000     18.000  sponsor-1 [sponsor]",
        ))
        .stdout(predicate::str::contains(
            "   20.500     30.000     28.000  sponsor-2 [sponsor]",
        ));
}

#[test]
fn plan_past_last_segment() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .current_dir(segments_dir())
        .args(["plan", "valid.json", "--from", "80"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No skips after 80.000"));
}

// ============================================================================
// Simulate
// ============================================================================

#[test]
fn simulate_skips_and_finishes() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .arg("simulate")
        .arg(segments_dir())
        .args(["sim", "--duration", "10", "--speed", "5"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("playing sim"))
        .stdout(predicate::str::contains(
            "skipped sim-1 [sponsor] 2.000-5.000 -> 5.000",
        ))
        .stdout(predicate::str::contains("finished"));
}

#[test]
fn simulate_video_without_segments_plays_through() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .arg("simulate")
        .arg(segments_dir())
        .args(["unknown", "--duration", "1", "--speed", "4"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped").not())
        .stdout(predicate::str::contains("finished"));
}

#[test]
fn simulate_missing_directory_fails() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .args(["simulate", "/nonexistent/dir", "sim", "--duration", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Segment directory not found"));
}

#[test]
fn simulate_rejects_zero_speed() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .arg("simulate")
        .arg(segments_dir())
        .args(["sim", "--duration", "10", "--speed", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--speed must be positive"));
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn completions_for_bash() {
    let config = TempDir::new().unwrap();
    segskip(&config)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("segskip"));
}
