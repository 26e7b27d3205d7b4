//! Settings for the acsdesk console.
//!
//! A TOML file in the platform config directory, overridden by
//! `ACSDESK_`-prefixed environment variables, translated into
//! `acsdesk_core::ConsoleConfig`. The ACS connection profile itself is not
//! kept here; it lives in the core's durable storage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use acsdesk_core::transport::DEFAULT_SUCCESS_RATE;
use acsdesk_core::{ConsoleConfig, FileStorage, LatencyProfile};

/// Prefix of environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "ACSDESK_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize settings: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML settings structs ───────────────────────────────────────────

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Where durable records (the ACS profile) are kept. Defaults to the
    /// platform data directory.
    pub storage_dir: Option<PathBuf>,

    /// Seed for synthesized device fields.
    pub rng_seed: Option<u64>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub latency: LatencySettings,

    #[serde(default)]
    pub probe: ProbeSettings,
}

/// Front-end defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Simulated round-trip per operation, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LatencySettings {
    pub discover_ms: u64,
    pub lookup_ms: u64,
    pub reboot_ms: u64,
    pub firmware_ms: u64,
    pub logs_ms: u64,
    pub set_parameter_ms: u64,
    pub add_device_ms: u64,
    pub test_connection_ms: u64,
    pub save_config_ms: u64,
}

impl LatencySettings {
    pub fn to_profile(self) -> LatencyProfile {
        LatencyProfile {
            discover: Duration::from_millis(self.discover_ms),
            lookup: Duration::from_millis(self.lookup_ms),
            reboot: Duration::from_millis(self.reboot_ms),
            firmware: Duration::from_millis(self.firmware_ms),
            logs: Duration::from_millis(self.logs_ms),
            set_parameter: Duration::from_millis(self.set_parameter_ms),
            add_device: Duration::from_millis(self.add_device_ms),
            test_connection: Duration::from_millis(self.test_connection_ms),
            save_config: Duration::from_millis(self.save_config_ms),
        }
    }
}

impl Default for LatencySettings {
    fn default() -> Self {
        let profile = LatencyProfile::default();
        let ms = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        Self {
            discover_ms: ms(profile.discover),
            lookup_ms: ms(profile.lookup),
            reboot_ms: ms(profile.reboot),
            firmware_ms: ms(profile.firmware),
            logs_ms: ms(profile.logs),
            set_parameter_ms: ms(profile.set_parameter),
            add_device_ms: ms(profile.add_device),
            test_connection_ms: ms(profile.test_connection),
            save_config_ms: ms(profile.save_config),
        }
    }
}

/// Connection-test simulation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ProbeSettings {
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,

    pub seed: Option<u64>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            success_rate: default_success_rate(),
            seed: None,
        }
    }
}

fn default_success_rate() -> f64 {
    DEFAULT_SUCCESS_RATE
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.probe.success_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::Validation {
                field: "probe.success_rate".into(),
                reason: format!("{rate} is outside 0.0..=1.0"),
            });
        }
        Ok(())
    }

    /// Translate into the core's runtime configuration.
    pub fn to_console_config(&self) -> ConsoleConfig {
        ConsoleConfig {
            latency: self.latency.to_profile(),
            success_rate: self.probe.success_rate,
            probe_seed: self.probe.seed,
            rng_seed: self.rng_seed,
        }
    }

    /// Durable storage for the ACS profile.
    pub fn storage(&self) -> FileStorage {
        self.storage_dir
            .clone()
            .map_or_else(FileStorage::platform_default, FileStorage::new)
    }
}

// ── Settings file path ──────────────────────────────────────────────

/// Resolve the settings file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "acsdesk", "acsdesk").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("acsdesk");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from `path` (missing file is fine) plus environment.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let settings: Settings = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    settings.validate()?;
    Ok(settings)
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize settings to pretty TOML at `path`, creating parent
/// directories.
pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    settings.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
