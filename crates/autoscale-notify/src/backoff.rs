//! Flat-jitter reconnect delay.
//!
//! Dashboards are low-volume clients and drops are expected to be short
//! network blips, so the delay does not grow with repeated failures. The
//! randomness spreads out reconnects from many dashboards that lost the
//! server at the same moment.

use std::time::Duration;

use rand::Rng;

/// Upper bound (exclusive) of the reconnect delay.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    max_jitter: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl ReconnectPolicy {
    pub fn new(max_jitter: Duration) -> Self {
        Self { max_jitter }
    }

    pub fn from_millis(max_jitter_ms: u64) -> Self {
        Self::new(Duration::from_millis(max_jitter_ms))
    }

    pub fn max_jitter(&self) -> Duration {
        self.max_jitter
    }

    /// Draw the next delay, uniformly from `[0, max_jitter)` milliseconds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng.gen_range(0..max_ms))
    }
}
