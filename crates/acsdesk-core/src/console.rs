// ── Console facade ──
//
// The in-process API consumed by front ends. Owns the device store,
// the ACS config store and the simulated transport, and turns every
// failure into either a notification, an empty/placeholder result or
// (for form validation only) an error returned to the caller.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::ConsoleConfig;
use crate::config_store::ConfigStore;
use crate::error::CoreError;
use crate::model::{AcsConfig, Device, DeviceId, ParameterValue};
use crate::notify::Notification;
use crate::storage::Storage;
use crate::store::DeviceStore;
use crate::stream::DeviceStream;
use crate::transport::{ConnectionProbe, LogLine, MockTransport, RandomProbe};
use crate::validation::{AcsConfigForm, AddDeviceForm, ValidationErrors, parse_absolute_url};

const NOTIFICATION_CHANNEL_SIZE: usize = 64;

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<ConsoleInner>`. Construct once per
/// application instance and pass clones to whatever needs it.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    store: Arc<DeviceStore>,
    acs: Arc<ConfigStore>,
    transport: MockTransport,
    notify_tx: broadcast::Sender<Arc<Notification>>,
}

impl Console {
    /// Console with the default random connection probe.
    pub fn new(config: ConsoleConfig, storage: Arc<dyn Storage>) -> Self {
        let probe: Arc<dyn ConnectionProbe> = match config.probe_seed {
            Some(seed) => Arc::new(RandomProbe::seeded(config.success_rate, seed)),
            None => Arc::new(RandomProbe::new(config.success_rate)),
        };
        Self::with_probe(config, storage, probe)
    }

    /// Console whose connection tests are decided by `probe`.
    pub fn with_probe(
        config: ConsoleConfig,
        storage: Arc<dyn Storage>,
        probe: Arc<dyn ConnectionProbe>,
    ) -> Self {
        let store = Arc::new(DeviceStore::new());
        let acs = Arc::new(ConfigStore::new(storage));
        let transport = match config.rng_seed {
            Some(seed) => MockTransport::seeded(
                Arc::clone(&store),
                Arc::clone(&acs),
                config.latency,
                probe,
                seed,
            ),
            None => MockTransport::new(Arc::clone(&store), Arc::clone(&acs), config.latency, probe),
        };
        let (notify_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);

        Self {
            inner: Arc::new(ConsoleInner {
                config,
                store,
                acs,
                transport,
                notify_tx,
            }),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    /// Direct access to the device store.
    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.inner.store
    }

    /// Reactive view of the device list.
    pub fn devices(&self) -> DeviceStream {
        self.inner.store.subscribe()
    }

    /// Subscribe to user-facing notifications.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.inner.notify_tx.subscribe()
    }

    fn notify(&self, notification: Notification) {
        // No subscribers is fine.
        let _ = self.inner.notify_tx.send(Arc::new(notification));
    }

    fn notify_failure(&self, title: &str, err: &CoreError) {
        warn!(error = %err, "{title}");
        self.notify(Notification::error(title, err.to_string()));
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Known devices, discovering the network when none are known yet.
    pub async fn list_devices(&self) -> Vec<Arc<Device>> {
        self.inner.transport.get_devices().await
    }

    /// Force a discovery sweep.
    pub async fn discover_devices(&self) -> Vec<Arc<Device>> {
        let devices = self.inner.transport.discover_devices().await;
        self.notify(Notification::info(
            "Discovery finished",
            format!("{} devices known", devices.len()),
        ));
        devices
    }

    /// Look up a device, provisioning it on first contact. Unknown ids
    /// yield `None` without a notification.
    pub async fn get_device(&self, id: &DeviceId) -> Option<Arc<Device>> {
        match self.inner.transport.find_or_provision_device(id).await {
            Ok(device) => Some(device),
            Err(e) if e.is_not_found() => {
                debug!(device_id = %id, "device not found");
                None
            }
            Err(e) => {
                self.notify_failure("Failed to load device", &e);
                None
            }
        }
    }

    pub async fn add_device(&self, form: &AddDeviceForm) -> Result<Arc<Device>, CoreError> {
        let new = form.validate()?;
        match self.inner.transport.add_device(new).await {
            Ok(device) => {
                self.notify(Notification::success(
                    "Device added",
                    format!("{} registered as {}", device.serial_number, device.id),
                ));
                Ok(device)
            }
            Err(e) => {
                self.notify_failure("Failed to add device", &e);
                Err(e)
            }
        }
    }

    pub async fn reboot_device(&self, id: &DeviceId) -> bool {
        match self.inner.transport.reboot_device(id).await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Reboot sent",
                    format!("Device {id} will restart shortly"),
                ));
                true
            }
            Err(e) => {
                self.notify_failure("Failed to reboot device", &e);
                false
            }
        }
    }

    /// Start a firmware update from `url`, which must be absolute.
    pub async fn update_firmware(&self, id: &DeviceId, url: &str) -> Result<bool, CoreError> {
        let url = parse_absolute_url(url)
            .map_err(|reason| ValidationErrors::single("firmwareUrl", reason))?;
        match self.inner.transport.update_firmware(id, &url).await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Firmware update started",
                    format!("Device {id} is downloading {url}"),
                ));
                Ok(true)
            }
            Err(e) => {
                self.notify_failure("Failed to update firmware", &e);
                Ok(false)
            }
        }
    }

    pub async fn get_device_logs(&self, id: &DeviceId) -> Vec<LogLine> {
        match self.inner.transport.device_logs(id).await {
            Ok(lines) => lines,
            Err(e) => {
                self.notify_failure("Failed to load logs", &e);
                Vec::new()
            }
        }
    }

    /// Set one parameter. Unknown ids return `false` quietly.
    pub async fn set_device_parameter(
        &self,
        id: &DeviceId,
        key: &str,
        value: ParameterValue,
    ) -> bool {
        match self.inner.transport.set_parameter(id, key, value).await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Parameter updated",
                    format!("{key} set on {id}"),
                ));
                true
            }
            Err(e) if e.is_not_found() => {
                debug!(device_id = %id, parameter = key, "set parameter on unknown device");
                false
            }
            Err(e) => {
                self.notify_failure("Failed to set parameter", &e);
                false
            }
        }
    }

    // ── ACS configuration ────────────────────────────────────────────

    pub fn get_config(&self) -> Arc<AcsConfig> {
        self.inner.acs.get()
    }

    /// Validate and persist the settings form.
    ///
    /// Validation failures are returned and leave the active profile
    /// untouched. Persistence failures are notified and yield `Ok(false)`.
    pub async fn save_config(&self, form: &AcsConfigForm) -> Result<bool, CoreError> {
        let config = form.validate()?;
        match self.inner.transport.save_config(&config).await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Settings saved",
                    format!("ACS endpoint is now {}", config.endpoint()),
                ));
                Ok(true)
            }
            Err(e) => {
                self.notify_failure("Failed to save settings", &e);
                Ok(false)
            }
        }
    }

    /// Test `config`, or the active profile when `None`.
    pub async fn test_connection(&self, config: Option<&AcsConfig>) -> bool {
        let active;
        let config = match config {
            Some(config) => config,
            None => {
                active = self.get_config();
                &*active
            }
        };
        match self.inner.transport.test_connection(config).await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Connection established",
                    format!("ACS at {} answered", config.endpoint()),
                ));
                true
            }
            Err(e) => {
                self.notify_failure("Connection failed", &e);
                false
            }
        }
    }
}
