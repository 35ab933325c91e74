//! Completion notifier - delivers the result payload to the caller's callback.
//!
//! Only a 200 counts as delivered. Every other status and every transport
//! error is a failed attempt, followed by the policy's delay for that attempt.
//! Once the budget is spent no further POST is made.

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::backoff::BackoffPolicy;
use crate::domain::{NotificationPayload, PipelineError};
use crate::ports::{Clock, HttpTransport};

pub struct CompletionNotifier {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    policy: BackoffPolicy,
}

impl CompletionNotifier {
    pub fn new(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>, policy: BackoffPolicy) -> Self {
        Self {
            transport,
            clock,
            policy,
        }
    }

    /// Returns the attempt number that succeeded.
    pub async fn notify(
        &self,
        url: &str,
        payload: &NotificationPayload,
    ) -> Result<u32, PipelineError> {
        let body = serde_json::to_value(payload).map_err(|e| {
            warn!(url, "payload could not be serialized: {e}");
            PipelineError::DeliveryFailure {
                url: url.to_string(),
                attempts: 0,
            }
        })?;
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.transport.post_json(url, &body).await {
                Ok(200) => {
                    info!(url, attempt, "notification delivered");
                    return Ok(attempt);
                }
                Ok(status) => warn!(url, attempt, status, "notification rejected"),
                Err(e) => warn!(url, attempt, "notification failed: {e}"),
            }

            self.clock.sleep(self.policy.delay_for(attempt)).await;
        }

        Err(PipelineError::DeliveryFailure {
            url: url.to_string(),
            attempts,
        })
    }
}
