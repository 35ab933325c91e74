//! Ports - abstraction layer.
//!
//! Each trait is the seam between the pipeline and something outside the
//! process (git, the hosting API, HTTP endpoints, the secret file, time).
//! Real implementations live in `impls`; tests use fakes.

pub mod artifact_builder;
pub mod clock;
pub mod hosting;
pub mod http;
pub mod id_generator;
pub mod secret_store;
pub mod vcs;

pub use self::artifact_builder::{ArtifactBuilder, FileMap};
pub use self::clock::{Clock, SystemClock, VirtualClock};
pub use self::hosting::{HostError, RemoteRepository, RepositoryHost};
pub use self::http::{HttpTransport, TransportError};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::secret_store::{SecretStore, SecretStoreError};
pub use self::vcs::{VcsError, VersionControl};
