// ── Runtime console configuration ──
//
// Tuning for the simulated transport. The CLI builds a `ConsoleConfig`
// from its settings file and hands it in; core never reads config files.

use crate::transport::{DEFAULT_SUCCESS_RATE, LatencyProfile};

/// Configuration for one [`Console`](crate::Console) instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Simulated round-trip per operation.
    pub latency: LatencyProfile,
    /// Probability that a connection test succeeds (0.0..=1.0).
    pub success_rate: f64,
    /// Seed for connection-test outcomes. `None` draws from entropy.
    pub probe_seed: Option<u64>,
    /// Seed for synthesized device fields. `None` draws from entropy.
    pub rng_seed: Option<u64>,
}

impl ConsoleConfig {
    /// Zero latency, otherwise defaults. Handy for scripts and tests.
    pub fn instant() -> Self {
        Self {
            latency: LatencyProfile::instant(),
            ..Self::default()
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            latency: LatencyProfile::default(),
            success_rate: DEFAULT_SUCCESS_RATE,
            probe_seed: None,
            rng_seed: None,
        }
    }
}
