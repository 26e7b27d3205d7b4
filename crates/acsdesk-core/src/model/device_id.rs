// ── Core identity types ──
//
// DeviceId and MacAddress identify every managed CPE. MAC addresses are
// validated on construction so a malformed address never reaches the store.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── DeviceId ────────────────────────────────────────────────────────

/// Stable identifier of a managed device.
///
/// Assigned once (by discovery, provisioning or `DeviceStore::add`) and
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── MacAddress ──────────────────────────────────────────────────────

static MAC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$").expect("static regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a MAC address (expected six hex pairs separated by ':' or '-')")]
pub struct MacAddressError {
    pub input: String,
}

/// MAC address, normalized to upper-case colon-separated form (AA:BB:CC:DD:EE:FF).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    /// Validate and normalize a MAC address.
    /// Accepts colon- or dash-separated pairs in any case.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, MacAddressError> {
        let raw = raw.as_ref().trim();
        if !MAC_RE.is_match(raw) {
            return Err(MacAddressError {
                input: raw.to_owned(),
            });
        }
        Ok(Self(raw.to_uppercase().replace('-', ":")))
    }

    /// Build a MAC address from raw octets.
    pub fn from_octets(octets: [u8; 6]) -> Self {
        let parts: Vec<String> = octets.iter().map(|b| format!("{b:02X}")).collect();
        Self(parts.join(":"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = MacAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mac_pattern_compiles() {
        let re = LazyLock::force(&MAC_RE);
        assert!(re.is_match("aa-bb-cc-dd-ee-ff"));
        assert!(!re.is_match("AA:BB:CC:DD:EE"));
    }

    #[test]
    fn device_id_display_roundtrips() {
        let id: DeviceId = "XBHQU23321002432".parse().unwrap();
        assert_eq!(id.to_string(), "XBHQU23321002432");
        assert_eq!(id, DeviceId::from("XBHQU23321002432"));
    }

    #[test]
    fn mac_address_normalizes_dashes_and_case() {
        let mac = MacAddress::parse("aa-bb-cc-dd-ee-ff").unwrap();
        assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn mac_address_accepts_mixed_separators() {
        let mac: MacAddress = "aa:bb-cc:dd-ee:ff".parse().unwrap();
        assert_eq!(mac.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn mac_address_rejects_malformed_input() {
        for bad in ["", "AA:BB:CC:DD:EE", "AA:BB:CC:DD:EE:FF:00", "GG:BB:CC:DD:EE:FF", "AABBCCDDEEFF"] {
            assert!(MacAddress::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn mac_address_from_octets_pads_hex() {
        let mac = MacAddress::from_octets([0xaa, 0xbb, 0xcc, 0x01, 0x0f, 0xff]);
        assert_eq!(mac.as_str(), "AA:BB:CC:01:0F:FF");
    }

    #[test]
    fn mac_address_deserialize_validates() {
        let ok: MacAddress = serde_json::from_str("\"11-22-33-44-55-66\"").unwrap();
        assert_eq!(ok.as_str(), "11:22:33:44:55:66");
        assert!(serde_json::from_str::<MacAddress>("\"nope\"").is_err());
    }
}
