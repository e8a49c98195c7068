//! reqwest-backed transport.

use crate::call::{ApiCall, ApiResponse, Transport};
use crate::error::{ApiErrorBody, TransportError};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, instrument};

/// Sends API calls over HTTP(S) to a fixed base URL.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport with its own connection pool.
    ///
    /// `timeout` is the default for calls that do not carry their own.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connection`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection {
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns the base URL calls are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, call), fields(path = %call.path))]
    async fn perform(&self, call: &ApiCall) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, call.path);

        let mut request = self.client.post(&url).json(&call.body);
        for (name, value) in &call.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = call.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    path: call.path.clone(),
                }
            } else {
                TransportError::Connection {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let text = response.text().await.unwrap_or_default();
            debug!(status = %status, body = %text, "API returned error");
            return Err(TransportError::Http {
                status: status.as_u16(),
                retry_after,
                body: serde_json::from_str::<ApiErrorBody>(&text).ok(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Decode {
                reason: e.to_string(),
            })?;
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
                reason: e.to_string(),
            })?
        };

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}
