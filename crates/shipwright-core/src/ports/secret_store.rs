//! SecretStore port - submitter email -> shared secret.
//!
//! # Implementations
//! - `InMemorySecretStore`: tests and ephemeral setups
//! - `FileSecretStore`: JSON file, rewritten atomically on every `set`

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("secret store is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Reads and writes may come from different tasks concurrently;
/// implementations synchronize internally.
pub trait SecretStore: Send + Sync {
    fn get(&self, email: &str) -> Option<String>;

    /// Insert or overwrite, then persist.
    fn set(&self, email: &str, secret: &str) -> Result<(), SecretStoreError>;
}
