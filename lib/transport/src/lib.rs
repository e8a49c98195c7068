//! Transport layer for fgakit.
//!
//! This crate provides:
//!
//! - **Transport trait**: the single-call seam the orchestrators sit on
//! - **Retry policy**: bounded retry with Retry-After support and capped backoff
//! - **HTTP transport**: the reqwest implementation
//! - **Mock transport**: a scripted implementation for tests

pub mod call;
pub mod error;
pub mod headers;
pub mod http;
pub mod mock;
pub mod retry;
pub mod retry_after;

pub use call::{ApiCall, ApiResponse, HeaderSet, Transport};
pub use error::{ApiErrorBody, FailureClass, TransportError};
pub use headers::merge_headers;
pub use http::HttpTransport;
pub use mock::MockTransport;
pub use retry::{RetryPolicy, with_retry};
pub use retry_after::RetryAfter;
