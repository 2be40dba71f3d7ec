//! Delay policy between refresh cycles

use std::time::Duration;

/// Exponential backoff over whole-cycle failures
///
/// Never waits less than the refresh interval, so a failing upstream is
/// not polled faster than a healthy one.
#[derive(Debug, Clone)]
pub struct Backoff {
    interval: Duration,
    max_delay: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(interval: Duration, max_delay: Duration) -> Self {
        Self {
            interval,
            max_delay: max_delay.max(interval),
            failures: 0,
        }
    }

    /// Consecutive failed cycles so far
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay after a published cycle
    pub fn on_success(&mut self) -> Duration {
        self.failures = 0;
        self.interval
    }

    /// Delay after a failed cycle
    pub fn on_failure(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let exp = (self.failures - 1).min(16);
        self.interval
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}
