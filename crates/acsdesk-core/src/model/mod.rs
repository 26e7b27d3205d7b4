// ── Domain model ──

pub mod acs_config;
pub mod device;
pub mod device_id;

pub use acs_config::{AcsConfig, INFORM_INTERVAL_MAX_SECS, INFORM_INTERVAL_MIN_SECS};
pub use device::{Device, DeviceStatus, FIRMWARE_UNKNOWN, NewDevice, ParameterValue};
pub use device_id::{DeviceId, MacAddress, MacAddressError};
