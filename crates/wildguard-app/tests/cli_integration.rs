//! Integration tests for the wildguard CLI binary.
//!
//! No backend is running: the config points at a closed local port, so
//! every request fails fast with a connection error.

use std::process::{Command, Output};

const UNREACHABLE: &str = "http://127.0.0.1:9";

fn wildguard_cmd(dir: &tempfile::TempDir) -> Command {
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!("[api]\nbase_url = \"{UNREACHABLE}\"\ntimeout_secs = 2\n"),
    )
    .unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_wildguard"));
    cmd.env_remove("WILDGUARD_API_URL")
        .current_dir(dir.path())
        .arg("--config")
        .arg(config_path);
    cmd
}

fn output(cmd: &mut Command) -> (Output, String, String) {
    let output = cmd.output().expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output, stdout, stderr)
}

fn run(cmd: &mut Command) -> String {
    let (output, stdout, stderr) = output(cmd);
    if !output.status.success() {
        panic!(
            "Command failed with status {:?}\nstdout: {stdout}\nstderr: {stderr}",
            output.status
        );
    }
    stdout
}

#[test]
fn views_lists_navigation() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(wildguard_cmd(&dir).arg("views"));

    assert!(out.contains("dashboard\tDashboard\thealth_check, wildlife_positions"));
    assert!(out.contains("map\tLive Map\thealth_check, wildlife_positions, hotspots"));
    assert!(out.contains("docs\tDocumentation\thealth_check\n"));
    assert!(out.contains("(6 views)"));
}

#[test]
fn health_fails_when_backend_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let (output, _stdout, stderr) = output(wildguard_cmd(&dir).arg("health"));

    assert!(!output.status.success());
    assert!(stderr.contains("health check"), "stderr: {stderr}");
}

#[test]
fn offline_mode_skips_agent_requests() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(wildguard_cmd(&dir).args(["agents", "--backend-mode", "offline"]));
    assert!(out.contains("disabled in offline mode"));

    let out = run(wildguard_cmd(&dir).args(["orchestrate", "--backend-mode", "none"]));
    assert!(out.contains("disabled in offline mode"));
}

#[test]
fn analytics_exports_illustrative_data_without_backend() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("analytics.json");
    let out = run(wildguard_cmd(&dir).arg("analytics").arg("--export").arg(&export));
    assert!(out.contains("Exported analytics"));

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(document["source"], "fallback");
    assert_eq!(document["activity_trends"].as_array().map(Vec::len), Some(7));
    assert_eq!(document["heatmap"][0]["location"], "Northern Ridge");
}

#[test]
fn dashboard_falls_back_to_illustrative_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(wildguard_cmd(&dir).arg("dashboard"));

    assert!(out.contains("Active Alerts\t3\t(illustrative)"));
    assert!(out.contains("Species Detected\t12\t(illustrative)"));
    assert!(out.contains("Risk Score\t35\t(illustrative)"));
    assert!(out.contains("Threat Level\tLOW"));
}

#[test]
fn api_url_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let (output, _stdout, stderr) = output(
        wildguard_cmd(&dir).args(["health", "--api-url", "not a url"]),
    );
    assert!(!output.status.success());
    assert!(stderr.contains("Invalid URL"), "stderr: {stderr}");
}
