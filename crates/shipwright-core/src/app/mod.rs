//! App - application layer.
//!
//! Combines the ports into the pipeline and the machinery around it.
//!
//! # Components
//! - **TaskPipeline**: stage sequencing for one submission
//! - **WorkspaceManager / Publisher / AvailabilityPoller / CompletionNotifier**:
//!   one stage each
//! - **WorkerGroup**: fixed worker pool over a bounded queue
//! - **StatusBoard**: per-run state for the status route
//! - **Intake**: secret check and enqueue
//! - **AppBuilder**: wiring with fail-fast validation

pub mod backoff;
pub mod builder;
pub mod intake;
pub mod notifier;
pub mod pipeline;
pub mod poller;
pub mod publisher;
pub mod runtime;
pub mod status;
pub mod workspace;

pub use self::backoff::BackoffPolicy;
pub use self::builder::{App, AppBuilder, BuildError, RunningApp};
pub use self::intake::{AdminUpdate, Intake, IntakeError, IntakeRequest};
pub use self::notifier::CompletionNotifier;
pub use self::pipeline::{PipelinePorts, TaskPipeline};
pub use self::poller::{AvailabilityPoller, PollState};
pub use self::publisher::Publisher;
pub use self::runtime::{SubmitError, TaskSubmitter, WorkerGroup};
pub use self::status::{RunCounts, RunStatus, StatusBoard};
pub use self::workspace::{Workspace, WorkspaceManager};
