//! Domain model (ids, task descriptor, outcomes, errors, run state).

pub mod errors;
pub mod ids;
pub mod outcome;
pub mod publish;
pub mod report;
pub mod state;
pub mod task;

pub use self::errors::{ErrorKind, PipelineError};
pub use self::ids::{RunId, WorkspaceId};
pub use self::outcome::{Stage, StageOutcome, StageRecord, StageStatus};
pub use self::publish::{CommitId, NotificationPayload, PublishResult};
pub use self::report::RunReport;
pub use self::state::RunState;
pub use self::task::{Attachment, DataUri, TaskDescriptor, decode_data_uri};
