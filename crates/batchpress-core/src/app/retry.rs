//! Report delivery retry policy.
//!
//! A unit that cannot hand its outcome to the aggregator would stall its job
//! below `total_items` forever, so delivery is attempted more than once with
//! exponential backoff before the unit gives up and logs the loss.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReportRetryPolicy {
    /// Delay before the first re-attempt.
    pub base_delay: Duration,

    /// Backoff multiplier.
    pub multiplier: f64,

    /// Total delivery attempts (including the first).
    pub max_attempts: u32,
}

impl Default for ReportRetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_attempts: 3,
        }
    }
}

impl ReportRetryPolicy {
    /// Delay before the next attempt, given the number of attempts already
    /// made (1-indexed). delay = base_delay * multiplier^(attempts - 1)
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let base_secs = self.base_delay.as_secs_f64();
        let delay_secs = base_secs * self.multiplier.powi(attempts.saturating_sub(1) as i32);
        Duration::from_secs_f64(delay_secs)
    }
}
