// ── ACS connection profile ──
//
// The one persisted record of the system. Serialized as a flat camelCase
// JSON object; the password is only exposed at serialization time.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const INFORM_INTERVAL_MIN_SECS: u32 = 30;
pub const INFORM_INTERVAL_MAX_SECS: u32 = 86_400;

/// Connection profile for the Auto Configuration Server.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcsConfig {
    pub url: String,
    pub port: u16,
    pub username: String,
    #[serde(
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub password: SecretString,
    /// Seconds between periodic Informs.
    pub inform_interval: u32,
    pub connection_request_allowed: bool,
}

impl AcsConfig {
    /// `url:port` as shown in connection notices.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.url, self.port)
    }
}

impl Default for AcsConfig {
    fn default() -> Self {
        Self {
            url: "https://acs.example.net".into(),
            port: 9443,
            username: "acs-admin".into(),
            password: SecretString::from("changeme".to_owned()),
            inform_interval: 300,
            connection_request_allowed: true,
        }
    }
}

impl PartialEq for AcsConfig {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.port == other.port
            && self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
            && self.inform_interval == other.inform_interval
            && self.connection_request_allowed == other.connection_request_allowed
    }
}

impl fmt::Debug for AcsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcsConfig")
            .field("url", &self.url)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("inform_interval", &self.inform_interval)
            .field("connection_request_allowed", &self.connection_request_allowed)
            .finish()
    }
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}
