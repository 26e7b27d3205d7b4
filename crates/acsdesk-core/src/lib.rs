//! Device registry, simulated ACS transport and table view-model behind
//! the acsdesk console.
//!
//! - **[`Console`]** — Facade consumed by front ends. Owns the device store,
//!   the ACS config store and the transport, and maps every failure to a
//!   [`Notification`], an empty result, or a returned validation error.
//!
//! - **[`DeviceStore`]** — Insertion-ordered in-memory registry of
//!   [`Device`]s with push-based snapshots ([`DeviceStream`]).
//!
//! - **[`MockTransport`]** — Stand-in for ACS round-trips: simulated
//!   latency ([`LatencyProfile`]), find-or-provision lookups, and connection
//!   tests decided by an injectable [`ConnectionProbe`].
//!
//! - **[`view`]** — Pure filter/sort derivation of the device table.
//!
//! - **[`SelectionSync`] / [`DetailLoader`]** — Selected device mirrored
//!   into a shareable URL, with stale-result protection for detail loads.
//!
//! - **[`ConfigStore`]** — The single persisted [`AcsConfig`], backed by a
//!   [`Storage`] implementation.

pub mod config;
pub mod config_store;
pub mod console;
pub mod error;
pub mod model;
pub mod notify;
pub mod selection;
pub mod storage;
pub mod store;
pub mod stream;
pub mod transport;
pub mod validation;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ConsoleConfig;
pub use config_store::{ACS_CONFIG_KEY, ConfigStore};
pub use console::Console;
pub use error::CoreError;
pub use notify::{Notification, NotificationLevel};
pub use selection::{DetailLoader, LoadOutcome, SELECTION_PARAM, SelectionSync};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{DeviceStore, IdGenerator, TimestampIdGenerator};
pub use stream::{DeviceStream, EntityStream};
pub use transport::{
    ConnectionProbe, FixedProbe, LatencyProfile, LogLine, MockTransport, RandomProbe,
};
pub use validation::{AcsConfigForm, AddDeviceForm, FieldError, ValidationErrors};
pub use view::{DeviceListView, SortDirection, SortKey};

pub use model::{AcsConfig, Device, DeviceId, DeviceStatus, MacAddress, ParameterValue};
