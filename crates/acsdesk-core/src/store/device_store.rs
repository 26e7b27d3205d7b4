// ── Device record store ──
//
// Authoritative in-memory list of managed devices for the lifetime of the
// process. Single writer (the transport layer); every mutation is visible
// to the next read.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info};

use super::collection::EntityCollection;
use crate::error::CoreError;
use crate::model::{Device, DeviceId, DeviceStatus, FIRMWARE_UNKNOWN, NewDevice, ParameterValue};
use crate::stream::EntityStream;
use crate::validation::ValidationErrors;

/// How many ids `add` draws before giving up on finding an unused one.
pub const MAX_ID_ATTEMPTS: u32 = 32;

// ── Id generation ───────────────────────────────────────────────────

/// Source of candidate ids for new devices. Candidates may collide with
/// existing ids; the store checks and asks again.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> DeviceId;
}

/// `DEV` + the last seven digits of the Unix-millisecond clock.
///
/// Monotonic within the process: two calls in the same millisecond yield
/// consecutive tokens.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last: AtomicU64,
}

impl TimestampIdGenerator {
    const MODULUS: u64 = 10_000_000;

    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn next_id(&self) -> DeviceId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let mut candidate = now;
        // fetch_update only fails when the closure returns None.
        let _ = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                candidate = now.max(last.saturating_add(1));
                Some(candidate)
            });
        DeviceId::new(format!("DEV{:07}", candidate % Self::MODULUS))
    }
}

// ── DeviceStore ─────────────────────────────────────────────────────

pub struct DeviceStore {
    devices: EntityCollection<Device>,
    ids: Box<dyn IdGenerator>,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::with_id_generator(TimestampIdGenerator::new())
    }

    pub fn with_id_generator(ids: impl IdGenerator + 'static) -> Self {
        Self {
            devices: EntityCollection::new(),
            ids: Box::new(ids),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// All devices in insertion order.
    pub fn list(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    /// Exact-match lookup; `None` means not found.
    pub fn get_by_id(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.devices.get(id.as_str())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn subscribe(&self) -> EntityStream<Device> {
        EntityStream::new(self.devices.subscribe())
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Register a new device. It starts offline, without an address and
    /// with unknown firmware.
    pub fn add(&self, new: NewDevice) -> Result<Arc<Device>, CoreError> {
        let mut errors = ValidationErrors::new();
        if new.serial_number.trim().is_empty() {
            errors.push("serialNumber", "serial number is required");
        }
        if new.model.trim().is_empty() {
            errors.push("model", "model is required");
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let NewDevice {
            serial_number,
            mac_address,
            model,
        } = new;
        let created = self.devices.insert_with_fresh_key(
            MAX_ID_ATTEMPTS,
            || self.ids.next_id().as_str().to_owned(),
            move |key| Device {
                id: DeviceId::new(key),
                name: format!("{model} (new)"),
                model,
                serial_number,
                ip: None,
                mac_address,
                firmware: FIRMWARE_UNKNOWN.to_owned(),
                status: DeviceStatus::Offline,
                last_seen: Utc::now(),
                customer: None,
                parameters: IndexMap::new(),
            },
        );

        match created {
            Some(device) => {
                info!(device_id = %device.id, serial = %device.serial_number, "device registered");
                Ok(device)
            }
            None => Err(CoreError::IdExhausted {
                attempts: MAX_ID_ATTEMPTS,
            }),
        }
    }

    /// Insert or overwrite one parameter. Returns `false` for unknown ids.
    pub fn set_parameter(
        &self,
        id: &DeviceId,
        key: impl Into<String>,
        value: ParameterValue,
    ) -> bool {
        let key = key.into();
        let updated = self.devices.modify(id.as_str(), |d| {
            d.parameters.insert(key.clone(), value);
        });
        debug!(device_id = %id, parameter = %key, updated, "set parameter");
        updated
    }

    /// Change the operational status. Going online refreshes `last_seen`.
    pub fn mark_status(&self, id: &DeviceId, status: DeviceStatus) -> bool {
        self.devices.modify(id.as_str(), |d| {
            d.status = status;
            if status.is_online() {
                d.last_seen = Utc::now();
            }
        })
    }

    /// Record the address a device connected from.
    pub fn assign_ip(&self, id: &DeviceId, ip: IpAddr) -> bool {
        self.devices.modify(id.as_str(), |d| {
            d.ip = Some(ip);
            d.last_seen = Utc::now();
        })
    }

    /// Insert a fully-formed record unless its id is already known.
    pub(crate) fn insert_if_absent(&self, device: Device) -> (Arc<Device>, bool) {
        let key = device.id.as_str().to_owned();
        self.devices.insert_if_absent(key, device)
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::model::MacAddress;

    fn new_device(serial: &str) -> NewDevice {
        NewDevice {
            serial_number: serial.into(),
            mac_address: MacAddress::parse("AA:BB:CC:DD:EE:FF").unwrap(),
            model: "ZTE F670L".into(),
        }
    }

    /// Replays a fixed list of ids, repeating the last one forever.
    struct ScriptedIds(Mutex<Vec<&'static str>>);

    impl ScriptedIds {
        fn new(ids: &[&'static str]) -> Self {
            let mut ids = ids.to_vec();
            ids.reverse();
            Self(Mutex::new(ids))
        }
    }

    impl IdGenerator for ScriptedIds {
        fn next_id(&self) -> DeviceId {
            let mut ids = self.0.lock().unwrap();
            let id = if ids.len() > 1 { ids.pop().unwrap() } else { ids[0] };
            DeviceId::from(id)
        }
    }

    #[test]
    fn add_creates_offline_device_without_ip() {
        let store = DeviceStore::new();
        let device = store.add(new_device("ZTE12345678")).unwrap();
        assert_eq!(device.status, DeviceStatus::Offline);
        assert!(device.ip.is_none());
        assert_eq!(device.firmware, "N/A");
        assert_eq!(device.name, "ZTE F670L (new)");
        assert_eq!(store.get_by_id(&device.id).unwrap(), device);
    }

    #[test]
    fn add_rejects_blank_fields() {
        let store = DeviceStore::new();
        let mut new = new_device("   ");
        new.model = String::new();
        let err = store.add(new).unwrap_err();
        let CoreError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.errors().len(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn add_generates_distinct_ids() {
        let store = DeviceStore::new();
        let ids: HashSet<DeviceId> = (0..50)
            .map(|i| store.add(new_device(&format!("SERIAL{i}"))).unwrap().id.clone())
            .collect();
        assert_eq!(ids.len(), 50);
        assert!(ids.iter().all(|id| id.as_str().starts_with("DEV") && id.as_str().len() == 10));
    }

    #[test]
    fn add_retries_on_collision() {
        let store = DeviceStore::with_id_generator(ScriptedIds::new(&["DEV1", "DEV1", "DEV2"]));
        let first = store.add(new_device("SERIAL-A")).unwrap();
        let second = store.add(new_device("SERIAL-B")).unwrap();
        assert_eq!(first.id.as_str(), "DEV1");
        assert_eq!(second.id.as_str(), "DEV2");
    }

    #[test]
    fn add_gives_up_when_generator_is_stuck() {
        let store = DeviceStore::with_id_generator(ScriptedIds::new(&["DEV1"]));
        store.add(new_device("SERIAL-A")).unwrap();
        let err = store.add(new_device("SERIAL-B")).unwrap_err();
        assert!(matches!(err, CoreError::IdExhausted { attempts: MAX_ID_ATTEMPTS }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn list_keeps_insertion_order() {
        let store = DeviceStore::new();
        let a = store.add(new_device("SERIAL-A")).unwrap();
        let b = store.add(new_device("SERIAL-B")).unwrap();
        let listed: Vec<DeviceId> = store.list().iter().map(|d| d.id.clone()).collect();
        assert_eq!(listed, [a.id.clone(), b.id.clone()]);
    }

    #[test]
    fn get_by_id_unknown_is_none() {
        let store = DeviceStore::new();
        assert!(store.get_by_id(&DeviceId::from("missing")).is_none());
    }

    #[test]
    fn set_parameter_inserts_and_overwrites() {
        let store = DeviceStore::new();
        let id = store.add(new_device("SERIAL-A")).unwrap().id.clone();
        let key = "Device.ManagementServer.PeriodicInformInterval";
        assert!(store.set_parameter(&id, key, ParameterValue::Int(300)));
        assert!(store.set_parameter(&id, key, ParameterValue::Int(600)));
        let device = store.get_by_id(&id).unwrap();
        assert_eq!(device.parameters.len(), 1);
        assert_eq!(device.parameters[key], ParameterValue::Int(600));
    }

    #[test]
    fn set_parameter_unknown_id_fails_without_mutation() {
        let store = DeviceStore::new();
        let before = store.list();
        assert!(!store.set_parameter(&DeviceId::from("nope"), "a.b", ParameterValue::Bool(true)));
        assert!(Arc::ptr_eq(&before, &store.list()));
    }

    #[test]
    fn mark_status_and_assign_ip() {
        let store = DeviceStore::new();
        let id = store.add(new_device("SERIAL-A")).unwrap().id.clone();
        assert!(store.assign_ip(&id, "192.168.1.20".parse().unwrap()));
        assert!(store.mark_status(&id, DeviceStatus::Online));
        let device = store.get_by_id(&id).unwrap();
        assert_eq!(device.ip_string(), "192.168.1.20");
        assert!(device.status.is_online());
        assert!(!store.mark_status(&DeviceId::from("nope"), DeviceStatus::Warning));
    }

    #[test]
    fn timestamp_ids_are_monotonic() {
        let ids = TimestampIdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
    }
}
