//! Transport-level failures and their classification.

use serde::Deserialize;
use std::fmt;

/// Error payload returned by the authorization service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code, e.g. `validation_error`.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

/// A failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw `Retry-After` header value, if any.
        retry_after: Option<String>,
        /// Decoded error body, when the server sent one.
        body: Option<ApiErrorBody>,
    },
    /// The call did not complete within its timeout.
    Timeout { path: String },
    /// The connection could not be established or was dropped.
    Connection { reason: String },
    /// The response body could not be decoded.
    Decode { reason: String },
}

/// How a failure is treated by the retry policy and the orchestrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx other than 501.
    Service,
    /// HTTP 501.
    NotImplemented,
    /// HTTP 401.
    Unauthenticated,
    /// HTTP 403.
    Forbidden,
    /// HTTP 404.
    NotFound,
    /// Any other HTTP status, typically a 400 business-rule rejection.
    InvalidRequest,
    /// No HTTP status: timeout, connection or decoding failure.
    Transport,
}

impl TransportError {
    /// Creates an HTTP failure with no hint or body.
    #[must_use]
    pub fn http(status: u16) -> Self {
        Self::Http {
            status,
            retry_after: None,
            body: None,
        }
    }

    /// Attaches a `Retry-After` hint to an HTTP failure.
    #[must_use]
    pub fn with_retry_after(mut self, hint: impl Into<String>) -> Self {
        if let Self::Http { retry_after, .. } = &mut self {
            *retry_after = Some(hint.into());
        }
        self
    }

    /// Attaches an error body to an HTTP failure.
    #[must_use]
    pub fn with_body(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        if let Self::Http { body, .. } = &mut self {
            *body = Some(ApiErrorBody {
                code: Some(code.into()),
                message: Some(message.into()),
            });
        }
        self
    }

    /// Returns the HTTP status, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw `Retry-After` hint, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            Self::Http { retry_after, .. } => retry_after.as_deref(),
            _ => None,
        }
    }

    /// Returns the server-provided error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Http {
                body: Some(body), ..
            } => body.code.as_deref(),
            _ => None,
        }
    }

    /// Returns the best available human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Http {
                body: Some(ApiErrorBody {
                    message: Some(message),
                    ..
                }),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Classifies the failure.
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self.status() {
            Some(429) => FailureClass::RateLimited,
            Some(501) => FailureClass::NotImplemented,
            Some(500..=599) => FailureClass::Service,
            Some(401) => FailureClass::Unauthenticated,
            Some(403) => FailureClass::Forbidden,
            Some(404) => FailureClass::NotFound,
            Some(_) => FailureClass::InvalidRequest,
            None => FailureClass::Transport,
        }
    }

    /// Returns true if the call may be re-issued.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            FailureClass::RateLimited | FailureClass::Service
        )
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status, body, .. } => {
                write!(f, "HTTP {status}")?;
                if let Some(body) = body {
                    if let Some(code) = &body.code {
                        write!(f, " ({code})")?;
                    }
                    if let Some(message) = &body.message {
                        write!(f, ": {message}")?;
                    }
                }
                Ok(())
            }
            Self::Timeout { path } => write!(f, "request to '{path}' timed out"),
            Self::Connection { reason } => write!(f, "connection failed: {reason}"),
            Self::Decode { reason } => write!(f, "failed to decode response: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}
