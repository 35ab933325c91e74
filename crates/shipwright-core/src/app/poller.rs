//! Availability poller - waits for a hosted URL to answer 200.
//!
//! Polling -> Resolved (probe returned 200)
//! Polling -> Expired  (deadline reached)
//!
//! The last sleep is clamped to the time remaining, so expiry happens exactly
//! at `now + timeout` and never before it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::PollConfig;
use crate::ports::{Clock, HttpTransport};

/// Terminal states of one poll; the loop itself is the Polling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Resolved,
    Expired,
}

pub struct AvailabilityPoller {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    config: PollConfig,
}

impl AvailabilityPoller {
    pub fn new(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>, config: PollConfig) -> Self {
        Self {
            transport,
            clock,
            config,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// `true` once the URL answers 200, `false` when the deadline passes.
    pub async fn wait_until_available(&self, url: &str) -> bool {
        let start = self.clock.now();
        let deadline = chrono::Duration::from_std(self.config.timeout)
            .ok()
            .and_then(|timeout| start.checked_add_signed(timeout))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC);
        let mut probes = 0u32;

        let state = loop {
            if self.clock.now() >= deadline {
                break PollState::Expired;
            }

            probes += 1;
            match self.transport.get_status(url).await {
                Ok(200) => break PollState::Resolved,
                Ok(status) => debug!(url, probes, status, "not available yet"),
                Err(e) => debug!(url, probes, "probe failed: {e}"),
            }

            let remaining = (deadline - self.clock.now()).to_std().unwrap_or(Duration::ZERO);
            if remaining.is_zero() {
                break PollState::Expired;
            }
            self.clock.sleep(self.config.interval.min(remaining)).await;
        };

        info!(url, probes, ?state, "availability poll finished");
        state == PollState::Resolved
    }
}
