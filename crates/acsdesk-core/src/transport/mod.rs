// ── Simulated ACS transport ──
//
// Stand-in for network I/O between the console and the ACS. Every
// operation suspends for a simulated round-trip before touching the
// device store or config store, and resolves exactly once.

mod latency;
mod probe;
mod seed;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

pub use latency::LatencyProfile;
pub use probe::{ConnectionProbe, DEFAULT_SUCCESS_RATE, FixedProbe, RandomProbe};

use crate::config_store::ConfigStore;
use crate::error::CoreError;
use crate::model::{AcsConfig, Device, DeviceId, NewDevice, ParameterValue};
use crate::store::DeviceStore;
use latency::simulate;

/// Messages of the synthetic boot/provisioning trace, oldest first.
const LOG_MESSAGES: [&str; 10] = [
    "DHCP DISCOVER sent on WAN interface",
    "DHCP OFFER received from 10.0.0.1",
    "DHCP REQUEST sent for 10.0.0.23",
    "DHCP ACK received, lease 86400s",
    "WLAN client associated on 2.4GHz radio",
    "WAN PPPoE session up",
    "WAN address acquired",
    "Inform sent to ACS (event: 2 PERIODIC)",
    "Inform acknowledged by ACS",
    "GetParameterValues processed",
];

/// One timestamped line of a device log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

// ── MockTransport ───────────────────────────────────────────────────

pub struct MockTransport {
    store: Arc<DeviceStore>,
    config: Arc<ConfigStore>,
    latency: LatencyProfile,
    probe: Arc<dyn ConnectionProbe>,
    rng: Mutex<StdRng>,
}

impl MockTransport {
    pub fn new(
        store: Arc<DeviceStore>,
        config: Arc<ConfigStore>,
        latency: LatencyProfile,
        probe: Arc<dyn ConnectionProbe>,
    ) -> Self {
        Self::with_rng(store, config, latency, probe, StdRng::from_entropy())
    }

    /// Like [`new`](Self::new), with reproducible synthesized devices.
    pub fn seeded(
        store: Arc<DeviceStore>,
        config: Arc<ConfigStore>,
        latency: LatencyProfile,
        probe: Arc<dyn ConnectionProbe>,
        seed: u64,
    ) -> Self {
        Self::with_rng(store, config, latency, probe, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        store: Arc<DeviceStore>,
        config: Arc<ConfigStore>,
        latency: LatencyProfile,
        probe: Arc<dyn ConnectionProbe>,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            config,
            latency,
            probe,
            rng: Mutex::new(rng),
        }
    }

    // ── Device operations ────────────────────────────────────────────

    /// Sweep the network. Every fleet device missing from the store is
    /// registered; records already known are left as they are.
    pub async fn discover_devices(&self) -> Vec<Arc<Device>> {
        debug!("discovering devices");
        simulate(self.latency.discover).await;
        let found = seed::seed_devices()
            .into_iter()
            .map(|device| self.store.insert_if_absent(device).1)
            .filter(|&inserted| inserted)
            .count();
        if found > 0 {
            info!(found, total = self.store.len(), "registered discovered devices");
        }
        self.store.list().to_vec()
    }

    /// Cached list, or a discovery sweep when nothing is known yet.
    pub async fn get_devices(&self) -> Vec<Arc<Device>> {
        if self.store.is_empty() {
            self.discover_devices().await
        } else {
            self.store.list().to_vec()
        }
    }

    /// Return the device, provisioning it on first contact when it
    /// belongs to the simulated fleet.
    pub async fn find_or_provision_device(&self, id: &DeviceId) -> Result<Arc<Device>, CoreError> {
        if let Some(device) = self.store.get_by_id(id) {
            return Ok(device);
        }
        debug!(device_id = %id, "device not cached, contacting CPE");
        simulate(self.latency.lookup).await;

        // Another lookup may have provisioned it while we were waiting.
        if let Some(device) = self.store.get_by_id(id) {
            return Ok(device);
        }
        let config = self.config.get();
        let synthesized = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            seed::synthesize(id, &config, &mut *rng)
        };
        let Some(device) = synthesized else {
            return Err(CoreError::DeviceNotFound { id: id.to_string() });
        };
        let (device, inserted) = self.store.insert_if_absent(device);
        if inserted {
            info!(device_id = %id, ip = %device.ip_string(), "provisioned device on first contact");
        }
        Ok(device)
    }

    /// Send a reboot command. The record is left untouched; the CPE
    /// reports back on its next Inform.
    pub async fn reboot_device(&self, id: &DeviceId) -> Result<(), CoreError> {
        debug!(device_id = %id, "sending reboot");
        simulate(self.latency.reboot).await;
        info!(device_id = %id, "reboot command accepted");
        Ok(())
    }

    /// Schedule a firmware download from `url`.
    pub async fn update_firmware(&self, id: &DeviceId, url: &Url) -> Result<(), CoreError> {
        debug!(device_id = %id, %url, "scheduling firmware download");
        simulate(self.latency.firmware).await;
        info!(device_id = %id, %url, "firmware download scheduled");
        Ok(())
    }

    /// Fetch the device's recent log, oldest line first. Lines are
    /// regenerated on every call.
    pub async fn device_logs(&self, id: &DeviceId) -> Result<Vec<LogLine>, CoreError> {
        debug!(device_id = %id, "fetching device logs");
        simulate(self.latency.logs).await;
        let now = Utc::now();
        let lines = LOG_MESSAGES
            .iter()
            .zip((0..LOG_MESSAGES.len()).rev())
            .map(|(message, age)| LogLine {
                timestamp: now - TimeDelta::seconds(i64::try_from(age).unwrap_or_default()),
                message: (*message).to_owned(),
            })
            .collect();
        Ok(lines)
    }

    pub async fn set_parameter(
        &self,
        id: &DeviceId,
        key: &str,
        value: ParameterValue,
    ) -> Result<(), CoreError> {
        debug!(device_id = %id, parameter = key, "setting parameter");
        simulate(self.latency.set_parameter).await;
        if self.store.set_parameter(id, key, value) {
            Ok(())
        } else {
            Err(CoreError::DeviceNotFound { id: id.to_string() })
        }
    }

    pub async fn add_device(&self, new: NewDevice) -> Result<Arc<Device>, CoreError> {
        debug!(serial = %new.serial_number, "registering device");
        simulate(self.latency.add_device).await;
        self.store.add(new)
    }

    // ── ACS operations ───────────────────────────────────────────────

    pub async fn test_connection(&self, config: &AcsConfig) -> Result<(), CoreError> {
        debug!(endpoint = %config.endpoint(), "testing ACS connection");
        simulate(self.latency.test_connection).await;
        if self.probe.probe(config) {
            info!(endpoint = %config.endpoint(), "ACS connection established");
            Ok(())
        } else {
            warn!(endpoint = %config.endpoint(), "ACS connection failed");
            Err(CoreError::ConnectionFailed {
                endpoint: config.endpoint(),
                reason: "no response from server".into(),
            })
        }
    }

    pub async fn save_config(&self, config: &AcsConfig) -> Result<(), CoreError> {
        simulate(self.latency.save_config).await;
        self.config.save(config)
    }
}
