//! IdGenerator port - ULID-based ids and collision-resistant names.
//!
//! Ids are built from the injected clock's timestamp plus 80 random bits, so
//! tests with a `VirtualClock` still get unique ids while the timestamp part
//! stays deterministic.

use std::sync::Arc;

use ulid::Ulid;

use crate::domain::{RunId, WorkspaceId};
use crate::ports::Clock;

/// Thread-safe id source shared by intake and the pipeline workers.
pub trait IdGenerator: Send + Sync {
    fn generate_run_id(&self) -> RunId;

    fn generate_workspace_id(&self) -> WorkspaceId;

    /// Short lowercase suffix used to make repository names unique.
    fn generate_repo_suffix(&self) -> String;
}

pub struct UlidGenerator {
    clock: Arc<dyn Clock>,
}

impl UlidGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl IdGenerator for UlidGenerator {
    fn generate_run_id(&self) -> RunId {
        RunId::from(self.next_ulid())
    }

    fn generate_workspace_id(&self) -> WorkspaceId {
        WorkspaceId::from(self.next_ulid())
    }

    fn generate_repo_suffix(&self) -> String {
        // the trailing characters of a ULID come from the random part
        let encoded = self.next_ulid().to_string().to_lowercase();
        encoded[encoded.len() - 6..].to_string()
    }
}
