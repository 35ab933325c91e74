//! Errors - pipeline error taxonomy and its fatal / warning classification.

use std::time::Duration;

use thiserror::Error;

/// How the orchestrator reacts to a failed stage.
///
/// - Fatal: abort the remaining stages, no notification
/// - Warning: log and continue with the next stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fatal,
    Warning,
}

/// Every failure a run can hit after it was accepted.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("attachment '{name}' rejected: {reason}")]
    Decode { name: String, reason: String },

    #[error("artifact build failed: {0}")]
    Build(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("repository provisioning failed: {0}")]
    Provision(String),

    #[error("hosting could not be enabled: {0}")]
    ProvisionWarning(String),

    #[error("{url} did not become available within {waited:?}")]
    AvailabilityTimeout { url: String, waited: Duration },

    #[error("notification to {url} failed after {attempts} attempts")]
    DeliveryFailure { url: String, attempts: u32 },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ProvisionWarning(_)
            | PipelineError::AvailabilityTimeout { .. }
            | PipelineError::DeliveryFailure { .. } => ErrorKind::Warning,
            _ => ErrorKind::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}
