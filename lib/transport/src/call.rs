//! The transport seam: one request in, one response or failure out.

use crate::error::TransportError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// HTTP header names to values.
pub type HeaderSet = BTreeMap<String, String>;

/// A fully prepared API request, sent as a JSON POST.
///
/// The same value is re-sent unchanged on every retry attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    /// Path relative to the API base URL, starting with `/`.
    pub path: String,
    /// JSON request body.
    pub body: JsonValue,
    /// Headers sent with the request, including authorization.
    pub headers: HeaderSet,
    /// Per-request timeout; the transport default applies when unset.
    pub timeout: Option<Duration>,
}

impl ApiCall {
    /// Creates a POST call with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: JsonValue) -> Self {
        Self {
            path: path.into(),
            body,
            headers: HeaderSet::new(),
            timeout: None,
        }
    }


    /// Sets the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderSet) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Decoded body; `Null` for an empty body.
    pub body: JsonValue,
}

impl ApiResponse {
    /// A 200 response with the given body.
    #[must_use]
    pub fn ok(body: JsonValue) -> Self {
        Self { status: 200, body }
    }

    /// A 200 response with an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::ok(JsonValue::Null)
    }

    /// Deserializes the body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        T::deserialize(&self.body).map_err(|e| TransportError::Decode {
            reason: e.to_string(),
        })
    }
}

/// Performs API calls.
///
/// Implementations are shared across concurrent calls and must not hold
/// per-call state.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request and waits for its response.
    async fn perform(&self, call: &ApiCall) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn perform(&self, call: &ApiCall) -> Result<ApiResponse, TransportError> {
        (**self).perform(call).await
    }
}
