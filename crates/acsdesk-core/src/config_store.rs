// ── ACS config store ──
//
// Owns the single active ACS connection profile. Loaded from durable
// storage on first access; a missing or unreadable record falls back to
// the built-in default. `save` overwrites the record wholesale.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::AcsConfig;
use crate::storage::Storage;

/// Storage key of the persisted ACS profile.
pub const ACS_CONFIG_KEY: &str = "acs_config";

pub struct ConfigStore {
    storage: Arc<dyn Storage>,
    active: ArcSwapOption<AcsConfig>,
    /// Serializes first load against `save`.
    write_gate: Mutex<()>,
}

impl ConfigStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            active: ArcSwapOption::empty(),
            write_gate: Mutex::new(()),
        }
    }

    /// The active profile, loading it from storage on first call.
    pub fn get(&self) -> Arc<AcsConfig> {
        if let Some(config) = self.active.load_full() {
            return config;
        }
        let _gate = self.write_gate.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(config) = self.active.load_full() {
            return config;
        }
        let config = Arc::new(self.load_persisted());
        self.active.store(Some(Arc::clone(&config)));
        config
    }

    /// Persist `config` and make it the active profile.
    ///
    /// The active profile only changes once the write succeeded.
    pub fn save(&self, config: &AcsConfig) -> Result<(), CoreError> {
        let _gate = self.write_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let json = serde_json::to_string(config)?;
        self.storage.write(ACS_CONFIG_KEY, &json)?;
        self.active.store(Some(Arc::new(config.clone())));
        info!(endpoint = %config.endpoint(), "ACS configuration saved");
        Ok(())
    }

    fn load_persisted(&self) -> AcsConfig {
        match self.storage.read(ACS_CONFIG_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<AcsConfig>(&raw) {
                Ok(config) => {
                    debug!(endpoint = %config.endpoint(), "loaded ACS configuration");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "stored ACS configuration is unreadable, using defaults");
                    AcsConfig::default()
                }
            },
            Ok(None) => {
                debug!("no stored ACS configuration, using defaults");
                AcsConfig::default()
            }
            Err(e) => {
                warn!(error = %e, "failed to read ACS configuration, using defaults");
                AcsConfig::default()
            }
        }
    }
}
