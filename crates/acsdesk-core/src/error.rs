// ── Core error types ──
//
// Errors surfaced by acsdesk-core. The `Console` facade decides which of
// these become notifications, which become empty/placeholder results and
// which are returned to the caller (validation only).

use thiserror::Error;

use crate::storage::StorageError;
use crate::validation::ValidationErrors;

/// Failures surfaced by the console facade.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("Device not found: {id}")]
    DeviceNotFound { id: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Cannot connect to ACS at {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Could not allocate a unique device id after {attempts} attempts")]
    IdExhausted { attempts: u32 },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DeviceNotFound { .. })
    }
}
