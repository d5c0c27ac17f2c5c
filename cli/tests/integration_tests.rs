use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn perfctl() -> Command {
    let mut cmd = Command::cargo_bin("perfctl").unwrap();
    for var in [
        "PERFCTL_CONFIG",
        "PERF_PLATFORM",
        "PERF_TARGET_FPS",
        "PERF_SAMPLE_CAPACITY",
        "PERF_HISTORY_CAPACITY",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_cli_help() {
    perfctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("perfctl"));
}

#[test]
fn test_cli_version() {
    perfctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("perfctl"));
}

#[test]
fn test_simulate_command_help() {
    perfctl()
        .args(["simulate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--slow-every"));
}

#[test]
fn test_config_init_check_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("perf.toml");
    let path_str = path.to_str().unwrap();

    perfctl()
        .args(["--no-color", "config", "init", path_str])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));
    assert!(path.exists());

    perfctl()
        .args(["config", "init", path_str])
        .assert()
        .failure()
        .code(6);

    perfctl()
        .args(["--no-color", "config", "check", path_str])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));

    perfctl()
        .args(["--config", path_str, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("target_fps = 60.0"));
}

#[test]
fn test_config_show_applies_env_overrides() {
    perfctl()
        .env("PERF_PLATFORM", "web")
        .args(["--format", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"platform\": \"web\""));
}

#[test]
fn test_config_check_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("perf.toml");
    std::fs::write(&path, "[retention]\nsample_capacity = 0\n").unwrap();

    perfctl()
        .args(["config", "check", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration Error"));
}

#[test]
fn test_validate_measurements() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("measurements.json");
    std::fs::write(
        &path,
        r##"{
            "platform": "ios",
            "measurements": [
                {"kind": "spacing", "component": "Card", "measured": 16.5, "expected": 16.0},
                {"kind": "color", "component": "Card", "measured": "#FFF", "expected": "#ffffff"},
                {"kind": "touch_target", "component": "Card", "width": 30.0, "height": 30.0},
                {"kind": "contrast", "component": "Banner", "ratio": 2.0}
            ]
        }"##,
    )
    .unwrap();
    let path_str = path.to_str().unwrap();

    perfctl()
        .args(["--format", "json", "validate", path_str])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overall_score\": 50.0"));

    perfctl()
        .args(["--format", "json", "validate", path_str, "--component", "Card"])
        .assert()
        .success()
        .stdout(predicate::str::contains("touch_target"));

    perfctl()
        .args(["validate", path_str, "--fail-under", "90"])
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("below the required"));
}

#[test]
fn test_validate_missing_file() {
    perfctl()
        .args(["validate", "/nonexistent/measurements.json"])
        .assert()
        .failure()
        .code(5);
}

#[test]
fn test_simulate_json_report() {
    let dir = TempDir::new().unwrap();
    let saved = dir.path().join("baseline.json");

    perfctl()
        .args([
            "--format",
            "json",
            "simulate",
            "--seconds",
            "1",
            "--requests",
            "2",
            "--request-ms",
            "5",
            "--save",
            saved.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overall_score\""))
        .stdout(predicate::str::contains("\"frame_samples\"").not());
    assert!(saved.exists());

    perfctl()
        .args([
            "--format",
            "json",
            "simulate",
            "--seconds",
            "1",
            "--slow-every",
            "5",
            "--requests",
            "0",
            "--baseline",
            saved.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"baseline_comparison\""))
        .stdout(predicate::str::contains("frame_time"));
}

#[test]
fn test_simulate_rejects_bad_failure_rate() {
    perfctl()
        .args(["simulate", "--seconds", "1", "--failure-rate", "2"])
        .assert()
        .failure()
        .code(64);
}

#[test]
fn test_simulate_rejects_non_finite_jitter() {
    perfctl()
        .args(["simulate", "--seconds", "1", "--jitter-ms", "NaN"])
        .assert()
        .failure()
        .code(64)
        .stderr(predicate::str::contains("--jitter-ms"));
}
