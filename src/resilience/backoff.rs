//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Stateful jittered exponential backoff.
///
/// Delay doubles per consecutive failure, capped at `max_ms`, with up to 10%
/// jitter so restarting watchers do not poll in lockstep.
#[derive(Debug)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    attempt: u32,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            attempt: 0,
        }
    }

    /// Forget accumulated failures after a success.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Delay to sleep before the next retry.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        let exponential = 2u64.saturating_pow(self.attempt - 1);
        let capped = self.base_ms.saturating_mul(exponential).min(self.max_ms);

        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }
}
