use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[safety]
max_amp_vpp = 2.0
max_offset_v = 0.5
max_total_voltage = 2.5
min_frequency_hz = 0.1
max_frequency_hz = 100000.0
max_session_duration_min = 120.0
max_single_frequency_duration_min = 30.0

[hardware]
endpoint = "simulated"
sample_rate_hz = 1000

[assessment]
baseline_duration_s = 0.05
per_frequency_duration_s = 0.05
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_protocol(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
name = "bench check"

[[step]]
label = "tone"
frequency_hz = 440.0
amp_vpp = 1.0
duration_min = 0.001
"#;
    let path = dir.path().join("protocol.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_catalog(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("catalog.csv");
    fs::write(&path, "frequency_hz,label\n100.0,alpha\n250.0,beta\n").unwrap();
    path
}

const ALL_CONFIRMATIONS: &[&str] = &[
    "isolation_verified",
    "series_resistor_installed",
    "patient_informed",
    "consent_signed",
    "emergency_prepared",
    "supervisor_present",
];

#[rstest]
fn help_prints_usage() {
    Command::cargo_bin("quantctl_cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[rstest]
fn run_protocol_completes_with_all_confirmations() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let protocol = write_protocol(&dir);

    let mut cmd = Command::cargo_bin("quantctl_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("run-protocol").arg("--protocol").arg(&protocol);
    for key in ALL_CONFIRMATIONS {
        cmd.arg("--confirm").arg(key);
    }

    cmd.assert().success().stdout(predicate::str::contains("protocol finished"));
}

#[rstest]
fn run_protocol_without_confirmations_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let protocol = write_protocol(&dir);

    let mut cmd = Command::cargo_bin("quantctl_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("run-protocol").arg("--protocol").arg(&protocol);

    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("safety kernel rejected"));
}

#[rstest]
fn run_protocol_with_pacemaker_flag_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let protocol = write_protocol(&dir);

    let mut cmd = Command::cargo_bin("quantctl_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("run-protocol").arg("--protocol").arg(&protocol);
    for key in ALL_CONFIRMATIONS {
        cmd.arg("--confirm").arg(key);
    }
    cmd.arg("--patient-flag").arg("pacemaker=true");

    cmd.assert().failure().code(2);
}

#[rstest]
fn assess_ranks_every_catalog_frequency() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let catalog = write_catalog(&dir);

    let mut cmd = Command::cargo_bin("quantctl_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("assess").arg("--catalog").arg(&catalog);
    for key in ALL_CONFIRMATIONS {
        cmd.arg("--confirm").arg(key);
    }

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 frequencies tested"));
}

#[rstest]
fn self_check_reports_captured_samples() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    Command::cargo_bin("quantctl_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Self-check OK"));
}

#[rstest]
fn health_reports_ok_for_loopback() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    Command::cargo_bin("quantctl_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("Health check: OK"));
}

#[rstest]
fn rejects_catalog_with_bad_headers() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let bad = dir.path().join("catalog.csv");
    fs::write(&bad, "hz,name\n100.0,alpha\n").unwrap();

    let mut cmd = Command::cargo_bin("quantctl_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("assess").arg("--catalog").arg(&bad);
    for key in ALL_CONFIRMATIONS {
        cmd.arg("--confirm").arg(key);
    }

    cmd.assert().failure().stderr(predicate::str::contains("Invalid headers"));
}
