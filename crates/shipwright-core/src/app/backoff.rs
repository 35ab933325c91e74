//! Backoff policy: decides delays between notification attempts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Capped exponential backoff with an attempt budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt.
    pub base_delay: Duration,

    /// Growth factor applied after every further failure.
    pub multiplier: f64,

    /// Upper bound for a single delay.
    pub max_delay: Duration,

    /// Total attempts, including the first one.
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    /// 8 attempts, 1s doubling up to 60s.
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            max_attempts: 8,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait after `failures` failed attempts (1-indexed).
    ///
    /// delay = min(base_delay * multiplier^(failures - 1), max_delay)
    ///
    /// With the defaults: 1, 2, 4, 8, 16, 32, 60, 60, ...
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// The delay associated with each attempt of the budget.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.max_attempts).map(|n| self.delay_for(n)).collect()
    }
}
