//! Integration tests for the `acsdesk` CLI binary.
//!
//! Every invocation runs against a throwaway settings file and storage
//! directory, with simulated latency disabled via `--instant`.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Isolated environment shared by the invocations of one test.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Build a [`Command`] for the `acsdesk` binary with env isolation.
    ///
    /// Clears `ACSDESK_*` overrides and points config, data and storage
    /// directories into the sandbox.
    fn cmd(&self) -> assert_cmd::Command {
        let root = self.dir.path();
        let mut cmd = cargo_bin_cmd!("acsdesk");
        cmd.env("HOME", root)
            .env("XDG_CONFIG_HOME", root.join("config"))
            .env("XDG_DATA_HOME", root.join("data"))
            .env("ACSDESK_CONFIG", root.join("config.toml"))
            .env("ACSDESK_STORAGE_DIR", root.join("storage"))
            .env("NO_COLOR", "1")
            .env_remove("ACSDESK_OUTPUT")
            .env_remove("ACSDESK_RNG_SEED")
            .env_remove("ACSDESK_PROBE__SEED")
            .env_remove("ACSDESK_PROBE__SUCCESS_RATE")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Like [`cmd`](Self::cmd) with `--instant` already passed.
    fn instant(&self) -> assert_cmd::Command {
        let mut cmd = self.cmd();
        cmd.arg("--instant");
        cmd
    }

    fn storage_dir(&self) -> String {
        self.dir.path().join("storage").display().to_string()
    }
}

/// Both output streams, for assertions that do not care which one.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let sandbox = Sandbox::new();
    let output = sandbox.cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    Sandbox::new().cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("TR-069")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    Sandbox::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("acsdesk"));
}

#[test]
fn test_invalid_subcommand() {
    let output = Sandbox::new().cmd().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    Sandbox::new()
        .cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    Sandbox::new()
        .cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acsdesk"));
}

// ── Device listing ──────────────────────────────────────────────────

#[test]
fn test_list_discovers_simulated_fleet() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .instant()
        .args(["devices", "list", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let devices = stdout_json(&output);
    let ids: Vec<&str> = devices
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        ["XBHQU23321002432", "XBHQU23321002435", "XBHQU23321002436"]
    );
}

#[test]
fn test_list_search_matches_customer() {
    Sandbox::new()
        .instant()
        .args(["devices", "list", "--search", "SILVA", "-o", "plain"])
        .assert()
        .success()
        .stdout("XBHQU23321002432\n");
}

#[test]
fn test_list_table_has_headers() {
    Sandbox::new()
        .instant()
        .args(["devices", "ls"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ID")
                .and(predicate::str::contains("Status"))
                .and(predicate::str::contains("Last Seen")),
        );
}

#[test]
fn test_discover_reports_sweep() {
    Sandbox::new()
        .instant()
        .args(["devices", "discover", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("XBHQU23321002436"))
        .stderr(predicate::str::contains("Discovery finished"));
}

#[test]
fn test_list_unknown_sort_column_is_usage_error() {
    let output = Sandbox::new()
        .instant()
        .args(["devices", "list", "--sort", "bogus"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("lastSeen"));
}

// ── Single-device operations ────────────────────────────────────────

#[test]
fn test_add_device_prints_record_and_notification() {
    let output = Sandbox::new()
        .instant()
        .args([
            "devices",
            "add",
            "--serial",
            "ZTE12345678",
            "--mac",
            "aa-bb-cc-dd-ee-ff",
            "--model",
            "ZTE F670L",
            "-o",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let device = stdout_json(&output);
    assert_eq!(device["macAddress"], "AA:BB:CC:DD:EE:FF");
    assert_eq!(device["status"], "offline");
    assert!(device["id"].as_str().unwrap().starts_with("DEV"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Device added"));
}

#[test]
fn test_add_device_rejects_invalid_form() {
    let output = Sandbox::new()
        .instant()
        .args(["devices", "add", "--serial", "ZTE", "--mac", "nope", "--model", "Z"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("serialNumber"), "{text}");
    assert!(text.contains("macAddress"), "{text}");
}

#[test]
fn test_get_provisions_seed_device() {
    let output = Sandbox::new()
        .instant()
        .args(["devices", "get", "XBHQU23321002435", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let device = stdout_json(&output);
    assert_eq!(device["serialNumber"], "SN-23321");
    assert_eq!(device["status"], "online");
}

#[test]
fn test_get_unknown_device_is_not_found() {
    let output = Sandbox::new()
        .instant()
        .args(["devices", "get", "NOPE0000001"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("devices list"));
}

#[test]
fn test_reboot_requires_confirmation_when_not_interactive() {
    let output = Sandbox::new()
        .instant()
        .args(["devices", "reboot", "XBHQU23321002432"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[test]
fn test_reboot_with_yes_reports_success() {
    Sandbox::new()
        .instant()
        .args(["-y", "devices", "reboot", "XBHQU23321002432"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Reboot sent"));
}

#[test]
fn test_firmware_requires_absolute_url() {
    let output = Sandbox::new()
        .instant()
        .args(["devices", "firmware", "XBHQU23321002432", "--url", "fw.bin"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("firmwareUrl"));
}

#[test]
fn test_logs_are_listed_oldest_first() {
    let output = Sandbox::new()
        .instant()
        .args(["devices", "logs", "XBHQU23321002432", "-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 10);
    assert!(lines[0].contains("DHCP DISCOVER"));
}

#[test]
fn test_set_param_is_visible_in_record() {
    let output = Sandbox::new()
        .instant()
        .args([
            "devices",
            "set-param",
            "XBHQU23321002432",
            "Device.WiFi.SSID.1.SSID",
            "Guest_2G",
            "-o",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let device = stdout_json(&output);
    assert_eq!(device["parameters"]["Device.WiFi.SSID.1.SSID"], "Guest_2G");
}

// ── Selection links ─────────────────────────────────────────────────

#[test]
fn test_link_rewrites_selection_parameter() {
    Sandbox::new()
        .cmd()
        .args([
            "devices",
            "link",
            "XBHQU23321002436",
            "--location",
            "https://acs.test/devices?tab=logs&device=OLD",
        ])
        .assert()
        .success()
        .stdout("https://acs.test/devices?tab=logs&device=XBHQU23321002436\n");
}

#[test]
fn test_open_loads_selected_device() {
    Sandbox::new()
        .instant()
        .args([
            "devices",
            "open",
            "https://acs.test/devices?device=XBHQU23321002436",
            "-o",
            "plain",
        ])
        .assert()
        .success()
        .stdout("XBHQU23321002436\n");
}

#[test]
fn test_open_without_selection_is_usage_error() {
    let output = Sandbox::new()
        .instant()
        .args(["devices", "open", "https://acs.test/devices"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_points_into_storage_dir() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(sandbox.storage_dir()));
}

#[test]
fn test_config_init_writes_settings_once() {
    let sandbox = Sandbox::new();
    sandbox.cmd().args(["config", "init"]).assert().success();
    let written = std::fs::read_to_string(sandbox.dir.path().join("config.toml")).unwrap();
    assert!(written.contains("[latency]"), "{written}");
    assert!(written.contains("success_rate = 0.7"), "{written}");

    let output = sandbox.cmd().args(["config", "init"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    sandbox
        .cmd()
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_show_redacts_password() {
    let output = Sandbox::new()
        .instant()
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let view = stdout_json(&output);
    assert_eq!(view["acs"]["password"], "****");
    assert_eq!(view["acs"]["port"], 9443);
    assert!(!String::from_utf8_lossy(&output.stdout).contains("changeme"));
}

#[test]
fn test_config_set_persists_across_invocations() {
    let sandbox = Sandbox::new();
    sandbox
        .instant()
        .args(["config", "set", "--url", "https://acs.isp.test/cwmp", "--port", "7547"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Settings saved"));

    let output = sandbox
        .instant()
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    let view = stdout_json(&output);
    assert_eq!(view["acs"]["url"], "https://acs.isp.test/cwmp");
    assert_eq!(view["acs"]["port"], 7547);
}

#[test]
fn test_config_set_rejects_out_of_range_port() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .instant()
        .args(["config", "set", "--port", "70000"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("port"));

    let view = stdout_json(
        &sandbox
            .instant()
            .args(["config", "show", "-o", "json"])
            .output()
            .unwrap(),
    );
    assert_eq!(view["acs"]["port"], 9443);
}

#[test]
fn test_config_test_succeeds_with_certain_probe() {
    Sandbox::new()
        .instant()
        .env("ACSDESK_PROBE__SUCCESS_RATE", "1.0")
        .args(["config", "test"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Connection established"));
}

#[test]
fn test_config_test_failure_exits_with_connection_code() {
    let output = Sandbox::new()
        .instant()
        .env("ACSDESK_PROBE__SUCCESS_RATE", "0.0")
        .args(["config", "test", "--url", "https://acs.down.test"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("acs.down.test"));
}

#[test]
fn test_out_of_range_success_rate_is_rejected() {
    let output = Sandbox::new()
        .instant()
        .env("ACSDESK_PROBE__SUCCESS_RATE", "1.5")
        .args(["devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("probe.success_rate"));
}
