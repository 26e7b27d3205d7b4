// ── Simulated round-trip latency ──

use std::time::Duration;

/// Per-operation delay applied by the mock transport before it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    pub discover: Duration,
    pub lookup: Duration,
    pub reboot: Duration,
    pub firmware: Duration,
    pub logs: Duration,
    pub set_parameter: Duration,
    pub add_device: Duration,
    pub test_connection: Duration,
    pub save_config: Duration,
}

impl LatencyProfile {
    /// Every operation resolves on the next scheduler turn.
    pub const fn instant() -> Self {
        Self {
            discover: Duration::ZERO,
            lookup: Duration::ZERO,
            reboot: Duration::ZERO,
            firmware: Duration::ZERO,
            logs: Duration::ZERO,
            set_parameter: Duration::ZERO,
            add_device: Duration::ZERO,
            test_connection: Duration::ZERO,
            save_config: Duration::ZERO,
        }
    }
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            discover: Duration::from_millis(3000),
            lookup: Duration::from_millis(1000),
            reboot: Duration::from_millis(2000),
            firmware: Duration::from_millis(3000),
            logs: Duration::from_millis(1000),
            set_parameter: Duration::from_millis(1500),
            add_device: Duration::from_millis(2500),
            test_connection: Duration::from_millis(2000),
            save_config: Duration::from_millis(1000),
        }
    }
}

/// Suspend the caller for `delay`; zero skips the timer entirely.
pub(crate) async fn simulate(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}
