// ── Simulated fleet ──
//
// The fixed set of devices "discovered" on first contact, plus synthesis
// of a plausible record when one of them is looked up before discovery.

use std::net::{IpAddr, Ipv4Addr};

use chrono::Utc;
use indexmap::IndexMap;
use rand::Rng;

use crate::model::{AcsConfig, Device, DeviceId, DeviceStatus, MacAddress, ParameterValue};

struct SeedEntry {
    id: &'static str,
    name: &'static str,
    model: &'static str,
    serial: &'static str,
    ip: Ipv4Addr,
    mac: [u8; 6],
    firmware: &'static str,
    customer: &'static str,
}

const SEED: [SeedEntry; 3] = [
    SeedEntry {
        id: "XBHQU23321002432",
        name: "Fiber WiFi Router",
        model: "ZTE F670L",
        serial: "ZTE23X4567890",
        ip: Ipv4Addr::new(192, 168, 1, 1),
        mac: [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF],
        firmware: "1.2.3",
        customer: "João Silva",
    },
    SeedEntry {
        id: "XBHQU23321002435",
        name: "Fiber WiFi Router",
        model: "ZTE F670L",
        serial: "ZTE67Y8901234",
        ip: Ipv4Addr::new(192, 168, 1, 4),
        mac: [0x11, 0x22, 0x33, 0x44, 0x55, 0x66],
        firmware: "1.2.3",
        customer: "Ana Pereira",
    },
    SeedEntry {
        id: "XBHQU23321002436",
        name: "Fiber ONT",
        model: "Huawei HG8245H",
        serial: "HUA98Z1234567",
        ip: Ipv4Addr::new(192, 168, 1, 5),
        mac: [0xAA, 0x11, 0xBB, 0x22, 0xCC, 0x33],
        firmware: "1.3.5",
        customer: "Carlos Mendes",
    },
];

/// The devices reported by a discovery sweep.
pub(crate) fn seed_devices() -> Vec<Device> {
    let now = Utc::now();
    SEED.iter()
        .map(|s| Device {
            id: DeviceId::from(s.id),
            name: s.name.to_owned(),
            model: s.model.to_owned(),
            serial_number: s.serial.to_owned(),
            ip: Some(IpAddr::V4(s.ip)),
            mac_address: MacAddress::from_octets(s.mac),
            firmware: s.firmware.to_owned(),
            status: DeviceStatus::Online,
            last_seen: now,
            customer: Some(s.customer.to_owned()),
            parameters: IndexMap::new(),
        })
        .collect()
}

/// Fabricate the record a known CPE would report on first contact.
///
/// Name and model follow the seed entry; address, MAC suffix and firmware
/// patch level are random. Management-server parameters mirror `config`.
/// Returns `None` for ids outside the simulated fleet.
pub(crate) fn synthesize(id: &DeviceId, config: &AcsConfig, rng: &mut impl Rng) -> Option<Device> {
    let entry = SEED.iter().find(|s| s.id == id.as_str())?;
    let serial_token = id.as_str().get(5..10).unwrap_or(id.as_str());

    let mut parameters = IndexMap::new();
    parameters.insert("Device.DeviceInfo.HardwareVersion".to_owned(), "v2".into());
    parameters.insert("Device.DeviceInfo.SoftwareVersion".to_owned(), "1.2.3".into());
    parameters.insert("Device.DeviceInfo.ProvisioningCode".to_owned(), "ABC123".into());
    parameters.insert(
        "Device.ManagementServer.URL".to_owned(),
        config.url.as_str().into(),
    );
    parameters.insert(
        "Device.ManagementServer.Username".to_owned(),
        config.username.as_str().into(),
    );
    parameters.insert(
        "Device.ManagementServer.PeriodicInformInterval".to_owned(),
        ParameterValue::from(config.inform_interval),
    );

    Some(Device {
        id: id.clone(),
        name: entry.name.to_owned(),
        model: entry.model.to_owned(),
        serial_number: format!("SN-{serial_token}"),
        ip: Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, rng.gen_range(1..=254)))),
        mac_address: MacAddress::from_octets([0xAA, 0xBB, 0xCC, rng.r#gen(), rng.r#gen(), rng.r#gen()]),
        firmware: format!("1.2.{}", rng.gen_range(0..=8)),
        status: DeviceStatus::Online,
        last_seen: Utc::now(),
        customer: None,
        parameters,
    })
}
