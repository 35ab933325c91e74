//! HttpTransport port - the two HTTP calls the pipeline makes on its own:
//! availability probes and callback notifications.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Returns the response status code; anything below HTTP (DNS, TLS, timeout)
/// is a `TransportError`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_status(&self, url: &str) -> Result<u16, TransportError>;

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16, TransportError>;
}
