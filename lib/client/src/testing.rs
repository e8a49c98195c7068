//! Shared fixtures for client tests.

use crate::client::FgaClient;
use crate::config::ClientConfig;
use fgakit_transport::{ApiCall, MockTransport, RetryPolicy};
use serde_json::Value as JsonValue;
use std::time::Duration;

pub(crate) const STORE: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
pub(crate) const MODEL: &str = "01GXSA8YR785C4FYS3C0RTG7B1";

/// A valid configuration with fast retries.
pub(crate) fn config() -> ClientConfig {
    ClientConfig::new("http://localhost:8080")
        .with_store_id(STORE)
        .with_retry(RetryPolicy::new(
            3,
            Duration::from_millis(1),
            Duration::from_millis(5),
        ))
}

pub(crate) fn client(mock: MockTransport) -> FgaClient<MockTransport> {
    FgaClient::with_transport(config(), mock).unwrap()
}

/// The string at `pointer` in the call body, or empty.
pub(crate) fn body_str(call: &ApiCall, pointer: &str) -> String {
    call.body
        .pointer(pointer)
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}
