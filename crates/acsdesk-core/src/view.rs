// ── Device table view-model ──
//
// Pure derivation of the rows shown in the device table from the full
// device list, a free-text query and a sort column/direction. Inputs are
// never mutated.

use std::cmp::Ordering;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use strum::{Display, EnumString, VariantNames};

use crate::model::Device;

/// Sortable device-table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantNames)]
#[strum(serialize_all = "camelCase")]
pub enum SortKey {
    #[default]
    Id,
    Name,
    Model,
    SerialNumber,
    Ip,
    MacAddress,
    Firmware,
    Status,
    LastSeen,
    Customer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

// ── Filtering ───────────────────────────────────────────────────────

/// Whether `device` matches `query`.
///
/// Id, name and customer match case-insensitively; the IP address matches
/// as a plain substring. An empty query matches everything.
pub fn matches_query(device: &Device, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    device.id.as_str().to_lowercase().contains(&needle)
        || device.name.to_lowercase().contains(&needle)
        || device
            .customer()
            .is_some_and(|c| c.to_lowercase().contains(&needle))
        || device.ip_string().contains(query)
}

/// Devices matching `query`, in input order.
pub fn filter_devices(devices: &[Arc<Device>], query: &str) -> Vec<Arc<Device>> {
    devices
        .iter()
        .filter(|d| matches_query(d, query))
        .cloned()
        .collect()
}

// ── Sorting ─────────────────────────────────────────────────────────

/// Comparable value of one column. `None` marks an absent or empty cell.
#[derive(Debug, PartialEq, PartialOrd)]
enum Cell<'a> {
    Text(&'a str),
    Ip(IpAddr),
    Time(DateTime<Utc>),
}

fn cell(device: &Device, key: SortKey) -> Option<Cell<'_>> {
    match key {
        SortKey::Id => non_empty(device.id.as_str()),
        SortKey::Name => non_empty(&device.name),
        SortKey::Model => non_empty(&device.model),
        SortKey::SerialNumber => non_empty(&device.serial_number),
        SortKey::Ip => device.ip.map(Cell::Ip),
        SortKey::MacAddress => non_empty(device.mac_address.as_str()),
        SortKey::Firmware => non_empty(&device.firmware),
        SortKey::Status => Some(Cell::Text(device.status.into())),
        SortKey::LastSeen => Some(Cell::Time(device.last_seen)),
        SortKey::Customer => device.customer().map(Cell::Text),
    }
}

fn non_empty(s: &str) -> Option<Cell<'_>> {
    (!s.is_empty()).then_some(Cell::Text(s))
}

/// Column comparison. A pair where either side is absent compares equal,
/// so such rows never move relative to each other.
pub fn compare(a: &Device, b: &Device, key: SortKey, direction: SortDirection) -> Ordering {
    let (Some(left), Some(right)) = (cell(a, key), cell(b, key)) else {
        return Ordering::Equal;
    };
    let ord = left.partial_cmp(&right).unwrap_or(Ordering::Equal);
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Stable sort of a copy of `devices`.
///
/// `compare` is not a total order once absent cells are involved, so rows
/// without a value stay where they are and split the list into segments.
/// Each segment is sorted on its own; no row crosses an absent one, and
/// sorting an already sorted list changes nothing.
pub fn sort_devices(
    devices: &[Arc<Device>],
    key: SortKey,
    direction: SortDirection,
) -> Vec<Arc<Device>> {
    let mut rows = devices.to_vec();
    for segment in rows.split_mut(|d| cell(d, key).is_none()) {
        segment.sort_by(|a, b| compare(a, b, key, direction));
    }
    rows
}

/// Filter, then sort.
pub fn visible_devices(
    devices: &[Arc<Device>],
    query: &str,
    key: SortKey,
    direction: SortDirection,
) -> Vec<Arc<Device>> {
    sort_devices(&filter_devices(devices, query), key, direction)
}

// ── DeviceListView ──────────────────────────────────────────────────

/// State of the device table: search box plus sort header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceListView {
    pub query: String,
    pub sort_key: SortKey,
    pub direction: SortDirection,
}

impl DeviceListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Header click: the active column flips direction, another column
    /// becomes active in ascending order.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction = self.direction.toggle();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn rows(&self, devices: &[Arc<Device>]) -> Vec<Arc<Device>> {
        visible_devices(devices, &self.query, self.sort_key, self.direction)
    }
}
