//! ReqwestTransport - `HttpTransport` over a shared reqwest client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::ports::{HttpTransport, TransportError};

/// Per-request timeout, matching the poll/notify budget of one attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("shipwright/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_status(&self, url: &str) -> Result<u16, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(response.status().as_u16())
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16, TransportError> {
        // `.json` also sets `Content-Type: application/json`
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();

        let err = transport.get_status("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.to_string().starts_with("transport error"));

        let err = transport
            .post_json("http://127.0.0.1:9/", &serde_json::json!({}))
            .await;
        assert!(err.is_err());
    }
}
