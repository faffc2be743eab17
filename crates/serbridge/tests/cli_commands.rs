#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::Command;

fn missing_device() -> PathBuf {
    PathBuf::from(format!(
        "/tmp/serbridge-missing-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

fn serbridge() -> Command {
    Command::new(env!("CARGO_BIN_EXE_serbridge"))
}

#[test]
fn version_prints_name_and_version() {
    let output = serbridge().arg("version").output().expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("serbridge {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_lists_build_details() {
    let output = serbridge()
        .args(["version", "--extended"])
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: serbridge"));
    assert!(stdout.contains("target_os:"));
    assert!(stdout.contains("rustc: rustc "), "build script should record rustc: {stdout}");
}

#[test]
fn run_on_missing_device_fails_with_transport_error() {
    let output = serbridge()
        .args(["--log-level", "error", "run"])
        .arg(missing_device())
        .output()
        .expect("run should start");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr was {stderr:?}");
    assert!(output.stdout.is_empty());
}

#[test]
fn zero_reconnect_delay_is_a_usage_error() {
    let output = serbridge()
        .arg("run")
        .arg(missing_device())
        .args(["--reconnect-delay", "0s"])
        .output()
        .expect("run should start");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn lone_udp_endpoint_is_rejected_by_the_parser() {
    let output = serbridge()
        .arg("run")
        .arg(missing_device())
        .args(["--prem", "127.0.0.1:5001"])
        .output()
        .expect("run should start");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--ploc"), "stderr was {stderr:?}");
}

#[test]
fn ports_json_reports_a_count() {
    let output = serbridge()
        .args(["--format", "json", "ports"])
        .output()
        .expect("ports should run");

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let value: serde_json::Value =
            serde_json::from_str(stdout.trim()).expect("ports output should be json");
        let count = value["count"].as_u64().expect("count should be a number");
        let ports = value["ports"].as_array().expect("ports should be an array");
        assert_eq!(count as usize, ports.len());
    } else {
        // Hosts without any serial subsystem cannot enumerate at all.
        assert_eq!(output.status.code(), Some(3));
    }
}
