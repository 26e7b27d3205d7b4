// ── Connection probe ──
//
// Decides the outcome of a simulated ACS connection test. The default
// probe succeeds at a configurable rate; tests inject a fixed outcome or a
// seeded RNG.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::AcsConfig;

/// Reference success rate of a simulated connection test.
pub const DEFAULT_SUCCESS_RATE: f64 = 0.7;

/// Strategy deciding whether a connection test succeeds.
pub trait ConnectionProbe: Send + Sync {
    fn probe(&self, config: &AcsConfig) -> bool;
}

/// Always returns the same outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub bool);

impl ConnectionProbe for FixedProbe {
    fn probe(&self, _config: &AcsConfig) -> bool {
        self.0
    }
}

/// Succeeds with probability `success_rate`.
#[derive(Debug)]
pub struct RandomProbe {
    success_rate: f64,
    rng: Mutex<StdRng>,
}

impl RandomProbe {
    pub fn new(success_rate: f64) -> Self {
        Self::with_rng(success_rate, StdRng::from_entropy())
    }

    /// Reproducible sequence of outcomes.
    pub fn seeded(success_rate: f64, seed: u64) -> Self {
        Self::with_rng(success_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(success_rate: f64, rng: StdRng) -> Self {
        let success_rate = if success_rate.is_nan() {
            DEFAULT_SUCCESS_RATE
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self {
            success_rate,
            rng: Mutex::new(rng),
        }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl Default for RandomProbe {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_RATE)
    }
}

impl ConnectionProbe for RandomProbe {
    fn probe(&self, _config: &AcsConfig) -> bool {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_bool(self.success_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_probe_is_reproducible() {
        let cfg = AcsConfig::default();
        let a = RandomProbe::seeded(0.5, 7);
        let b = RandomProbe::seeded(0.5, 7);
        let run_a: Vec<bool> = (0..32).map(|_| a.probe(&cfg)).collect();
        let run_b: Vec<bool> = (0..32).map(|_| b.probe(&cfg)).collect();
        assert_eq!(run_a, run_b);
    }

    #[test]
    fn certain_rates_are_deterministic() {
        let cfg = AcsConfig::default();
        let always = RandomProbe::seeded(1.0, 1);
        let never = RandomProbe::seeded(0.0, 1);
        assert!((0..100).all(|_| always.probe(&cfg)));
        assert!((0..100).all(|_| !never.probe(&cfg)));
    }

    #[test]
    fn out_of_range_rate_is_clamped() {
        assert!((RandomProbe::seeded(3.0, 1).success_rate() - 1.0).abs() < f64::EPSILON);
        assert!(RandomProbe::seeded(-1.0, 1).success_rate().abs() < f64::EPSILON);
    }
}
