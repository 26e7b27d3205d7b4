// ── Form validation ──
//
// Schema checks for the two input forms (add device, ACS settings).
// A form that fails validation is never handed to the transport; every
// offending field is reported so it can be shown next to the input.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::{
    AcsConfig, INFORM_INTERVAL_MAX_SECS, INFORM_INTERVAL_MIN_SECS, MacAddress, NewDevice,
};

pub const SERIAL_NUMBER_MIN_LEN: usize = 5;
pub const MODEL_MIN_LEN: usize = 2;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors found in one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First message reported for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// ── Add device ──────────────────────────────────────────────────────

/// Raw input of the add-device form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDeviceForm {
    pub serial_number: String,
    pub mac_address: String,
    pub model: String,
}

impl AddDeviceForm {
    pub fn validate(&self) -> Result<NewDevice, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let serial = self.serial_number.trim();
        let model = self.model.trim();

        if serial.chars().count() < SERIAL_NUMBER_MIN_LEN {
            errors.push(
                "serialNumber",
                format!("serial number must be at least {SERIAL_NUMBER_MIN_LEN} characters"),
            );
        }
        let mac = match MacAddress::parse(&self.mac_address) {
            Ok(mac) => Some(mac),
            Err(_) => {
                errors.push("macAddress", "invalid MAC address (e.g. AA:BB:CC:DD:EE:FF)");
                None
            }
        };
        if model.chars().count() < MODEL_MIN_LEN {
            errors.push(
                "model",
                format!("model must be at least {MODEL_MIN_LEN} characters"),
            );
        }

        match mac {
            Some(mac_address) => errors.into_result(|| NewDevice {
                serial_number: serial.to_owned(),
                mac_address,
                model: model.to_owned(),
            }),
            None => Err(errors),
        }
    }
}

// ── ACS settings ────────────────────────────────────────────────────

/// Raw input of the ACS settings form. Numbers are wide so that
/// out-of-range entries reach validation instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcsConfigForm {
    pub url: String,
    pub port: i64,
    pub username: String,
    pub password: String,
    pub inform_interval: i64,
    pub connection_request_allowed: bool,
}

impl AcsConfigForm {
    /// Pre-fill the form from an existing profile.
    pub fn from_config(config: &AcsConfig) -> Self {
        use secrecy::ExposeSecret;

        Self {
            url: config.url.clone(),
            port: i64::from(config.port),
            username: config.username.clone(),
            password: config.password.expose_secret().to_owned(),
            inform_interval: i64::from(config.inform_interval),
            connection_request_allowed: config.connection_request_allowed,
        }
    }

    pub fn validate(&self) -> Result<AcsConfig, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(reason) = parse_absolute_url(&self.url) {
            errors.push("url", reason);
        }
        let port = u16::try_from(self.port).ok().filter(|p| *p >= 1);
        if port.is_none() {
            errors.push("port", "port must be between 1 and 65535");
        }
        if self.username.is_empty() {
            errors.push("username", "username is required");
        }
        if self.password.is_empty() {
            errors.push("password", "password is required");
        }
        let interval = u32::try_from(self.inform_interval)
            .ok()
            .filter(|i| (INFORM_INTERVAL_MIN_SECS..=INFORM_INTERVAL_MAX_SECS).contains(i));
        if interval.is_none() {
            errors.push(
                "informInterval",
                format!(
                    "inform interval must be between {INFORM_INTERVAL_MIN_SECS} and {INFORM_INTERVAL_MAX_SECS} seconds"
                ),
            );
        }

        match (port, interval) {
            (Some(port), Some(inform_interval)) => errors.into_result(|| AcsConfig {
                url: self.url.clone(),
                port,
                username: self.username.clone(),
                password: SecretString::from(self.password.clone()),
                inform_interval,
                connection_request_allowed: self.connection_request_allowed,
            }),
            _ => Err(errors),
        }
    }
}

// ── Shared checks ───────────────────────────────────────────────────

/// Accept only absolute URLs with a scheme and a host.
pub fn parse_absolute_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL: {e}"))?;
    if url.cannot_be_a_base() || !url.has_host() {
        return Err(format!("'{raw}' is not an absolute URL"));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn device_form(serial: &str, mac: &str, model: &str) -> AddDeviceForm {
        AddDeviceForm {
            serial_number: serial.into(),
            mac_address: mac.into(),
            model: model.into(),
        }
    }

    fn config_form() -> AcsConfigForm {
        AcsConfigForm::from_config(&AcsConfig::default())
    }

    #[test]
    fn add_device_form_accepts_valid_input() {
        let new = device_form("ZTE12345678", "aa-bb-cc-dd-ee-ff", "ZTE F670L")
            .validate()
            .unwrap();
        assert_eq!(new.mac_address.as_str(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(new.model, "ZTE F670L");
    }

    #[test]
    fn add_device_form_reports_every_bad_field() {
        let errors = device_form("1234", "AA:BB", "X").validate().unwrap_err();
        assert_eq!(errors.errors().len(), 3);
        assert!(errors.for_field("serialNumber").is_some());
        assert!(errors.for_field("macAddress").is_some());
        assert!(errors.for_field("model").is_some());
    }

    #[test]
    fn add_device_form_minimum_lengths_are_inclusive() {
        assert!(device_form("12345", "AA:BB:CC:DD:EE:FF", "AB").validate().is_ok());
    }

    #[test]
    fn config_form_default_is_valid() {
        assert_eq!(config_form().validate().unwrap(), AcsConfig::default());
    }

    #[test]
    fn config_form_rejects_out_of_range_port() {
        for port in [0, 70_000, -1] {
            let form = AcsConfigForm {
                port,
                ..config_form()
            };
            let errors = form.validate().unwrap_err();
            assert!(errors.for_field("port").is_some(), "port {port}");
        }
    }

    #[test]
    fn config_form_inform_interval_bounds() {
        for (interval, ok) in [(29, false), (30, true), (86_400, true), (86_401, false)] {
            let form = AcsConfigForm {
                inform_interval: interval,
                ..config_form()
            };
            assert_eq!(form.validate().is_ok(), ok, "interval {interval}");
        }
    }

    #[test]
    fn config_form_requires_absolute_url_and_credentials() {
        let form = AcsConfigForm {
            url: "acs.example.net/path".into(),
            username: String::new(),
            password: String::new(),
            ..config_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.for_field("url").is_some());
        assert!(errors.for_field("username").is_some());
        assert!(errors.for_field("password").is_some());
    }

    #[test]
    fn absolute_url_check() {
        assert!(parse_absolute_url("https://fw.example.net/image.bin").is_ok());
        assert!(parse_absolute_url("mailto:ops@example.net").is_err());
        assert!(parse_absolute_url("/relative/path").is_err());
    }

    #[test]
    fn validation_errors_display_joins_fields() {
        let mut errors = ValidationErrors::single("port", "bad");
        errors.push("url", "worse");
        assert_eq!(errors.to_string(), "port: bad; url: worse");
    }
}
