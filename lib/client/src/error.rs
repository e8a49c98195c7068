//! Client error taxonomy.
//!
//! `FgaError` is cloneable so the same value can be attached to every
//! per-item outcome of a failed chunk. Fatal failures are returned wrapped in
//! a rootcause `Report` through [`FgaResult`].

use fgakit_core::ValidationError;
use fgakit_transport::{FailureClass, TransportError};
use std::fmt;

/// Result of a client operation. Errors here aborted the whole operation.
pub type FgaResult<T> = fgakit_core::Result<T, FgaError>;

/// Errors from client operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FgaError {
    /// Input rejected locally; nothing was sent.
    Validation(ValidationError),
    /// The client could not be configured.
    Configuration {
        /// What was wrong with the configuration.
        reason: String,
    },
    /// The credentials were rejected (HTTP 401).
    Authentication {
        /// Server-provided message.
        message: String,
    },
    /// The credentials lack permission (HTTP 403).
    Authorization {
        /// Server-provided message.
        message: String,
    },
    /// Still rate limited after all retries (HTTP 429).
    RateLimited {
        /// Server-provided message.
        message: String,
    },
    /// Server failure that persisted through all retries (HTTP 5xx).
    Service {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },
    /// The endpoint is not implemented by the server (HTTP 501).
    NotImplemented {
        /// Server-provided message.
        message: String,
    },
    /// The server rejected the request (HTTP 400, 422 and other 4xx).
    InvalidRequest {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code, e.g. `validation_error`.
        code: Option<String>,
        /// Server-provided message.
        message: String,
    },
    /// The store or model does not exist (HTTP 404).
    NotFound {
        /// Server-provided message.
        message: String,
    },
    /// One item inside a grouped check failed on the server.
    CheckItem {
        /// Input error code, when the item itself was invalid.
        input_error: Option<String>,
        /// Internal error code, when the server failed on the item.
        internal_error: Option<String>,
        /// Server-provided message.
        message: String,
    },
    /// No HTTP response: timeout or connection failure.
    Transport {
        /// Error details.
        reason: String,
    },
    /// The response did not match the request.
    Protocol {
        /// Error details.
        reason: String,
    },
}

impl FgaError {
    /// Returns true for failures that abort an entire batch.
    ///
    /// Retrying sibling items under rejected credentials cannot succeed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Authorization { .. })
    }

    /// Returns true for locally rejected input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl fmt::Display for FgaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "validation failed: {e}"),
            Self::Configuration { reason } => write!(f, "invalid configuration: {reason}"),
            Self::Authentication { message } => write!(f, "authentication failed: {message}"),
            Self::Authorization { message } => write!(f, "not authorized: {message}"),
            Self::RateLimited { message } => write!(f, "rate limited: {message}"),
            Self::Service { status, message } => {
                write!(f, "service error (HTTP {status}): {message}")
            }
            Self::NotImplemented { message } => write!(f, "not implemented: {message}"),
            Self::InvalidRequest {
                status,
                code,
                message,
            } => match code {
                Some(code) => write!(f, "request rejected (HTTP {status}, {code}): {message}"),
                None => write!(f, "request rejected (HTTP {status}): {message}"),
            },
            Self::NotFound { message } => write!(f, "not found: {message}"),
            Self::CheckItem {
                input_error,
                internal_error,
                message,
            } => {
                write!(f, "check failed: {message}")?;
                if let Some(input_error) = input_error {
                    write!(f, " (input error: {input_error})")?;
                }
                if let Some(internal_error) = internal_error {
                    write!(f, " (internal error: {internal_error})")?;
                }
                Ok(())
            }
            Self::Transport { reason } => write!(f, "transport failure: {reason}"),
            Self::Protocol { reason } => write!(f, "protocol error: {reason}"),
        }
    }
}

impl std::error::Error for FgaError {}

impl From<ValidationError> for FgaError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<TransportError> for FgaError {
    fn from(e: TransportError) -> Self {
        let message = e.message();
        match (e.class(), &e) {
            (_, TransportError::Decode { reason }) => Self::Protocol {
                reason: reason.clone(),
            },
            (FailureClass::Transport, _) => Self::Transport { reason: message },
            (FailureClass::Unauthenticated, _) => Self::Authentication { message },
            (FailureClass::Forbidden, _) => Self::Authorization { message },
            (FailureClass::RateLimited, _) => Self::RateLimited { message },
            (FailureClass::NotImplemented, _) => Self::NotImplemented { message },
            (FailureClass::NotFound, _) => Self::NotFound { message },
            (FailureClass::Service, _) => Self::Service {
                status: e.status().unwrap_or(500),
                message,
            },
            (FailureClass::InvalidRequest, _) => Self::InvalidRequest {
                status: e.status().unwrap_or(400),
                code: e.code().map(str::to_string),
                message,
            },
        }
    }
}
