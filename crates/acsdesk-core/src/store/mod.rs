// ── Device record store ──
//
// Insertion-ordered entity storage with push-based change notification.

mod collection;
mod device_store;

pub use device_store::{DeviceStore, IdGenerator, MAX_ID_ATTEMPTS, TimestampIdGenerator};
