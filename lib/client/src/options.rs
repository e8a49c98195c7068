//! Per-operation options.

use fgakit_transport::{HeaderSet, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of calls an orchestrator keeps in flight.
pub const DEFAULT_MAX_PARALLEL_REQUESTS: usize = 10;
/// Default number of checks sent in one grouped batch-check call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;
/// Default number of tuples sent in one non-transactional write call.
pub const DEFAULT_MAX_PER_CHUNK: usize = 1;

/// Read consistency requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyPreference {
    #[default]
    Unspecified,
    MinimizeLatency,
    HigherConsistency,
}

/// Options shared by every call an operation makes.
///
/// Anything left unset falls back to the client configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Overrides the configured authorization model.
    pub authorization_model_id: Option<String>,
    /// Read consistency for check and list calls.
    pub consistency: Option<ConsistencyPreference>,
    /// Extra headers; these win over configured defaults.
    pub headers: HeaderSet,
    /// Overrides the configured retry policy.
    pub retry: Option<RetryPolicy>,
    /// Overrides the configured per-call timeout.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    #[must_use]
    pub fn with_authorization_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.authorization_model_id = Some(model_id.into());
        self
    }

    #[must_use]
    pub fn with_consistency(mut self, consistency: ConsistencyPreference) -> Self {
        self.consistency = Some(consistency);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for the batch-check operations.
#[derive(Debug, Clone)]
pub struct BatchCheckOptions {
    pub request: RequestOptions,
    /// Calls in flight at once. Values below one are treated as one.
    pub max_parallel_requests: usize,
    /// Checks per grouped call. Ignored by the one-call-per-check variant.
    pub max_batch_size: usize,
}

impl Default for BatchCheckOptions {
    fn default() -> Self {
        Self {
            request: RequestOptions::default(),
            max_parallel_requests: DEFAULT_MAX_PARALLEL_REQUESTS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl BatchCheckOptions {
    #[must_use]
    pub fn with_request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    #[must_use]
    pub fn with_max_parallel_requests(mut self, limit: usize) -> Self {
        self.max_parallel_requests = limit;
        self
    }

    #[must_use]
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }
}

/// How a write is split into calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteTransactionPolicy {
    /// Send everything in one all-or-nothing call.
    pub transactional: bool,
    /// Tuples per call when not transactional.
    pub max_per_chunk: usize,
    /// Calls in flight when not transactional.
    pub max_parallel_requests: usize,
}

impl Default for WriteTransactionPolicy {
    fn default() -> Self {
        Self {
            transactional: true,
            max_per_chunk: DEFAULT_MAX_PER_CHUNK,
            max_parallel_requests: DEFAULT_MAX_PARALLEL_REQUESTS,
        }
    }
}

impl WriteTransactionPolicy {
    /// A chunked policy with `max_per_chunk` tuples per call.
    #[must_use]
    pub fn chunked(max_per_chunk: usize, max_parallel_requests: usize) -> Self {
        Self {
            transactional: false,
            max_per_chunk,
            max_parallel_requests,
        }
    }
}

/// What the server does when a written tuple already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDuplicateWrite {
    #[default]
    Error,
    Ignore,
}

/// What the server does when a deleted tuple does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMissingDelete {
    #[default]
    Error,
    Ignore,
}

/// Server-side conflict handling for writes and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConflictPolicy {
    pub on_duplicate_write: OnDuplicateWrite,
    pub on_missing_delete: OnMissingDelete,
}

impl ConflictPolicy {
    /// Ignores both duplicate writes and missing deletes.
    #[must_use]
    pub fn ignore_all() -> Self {
        Self {
            on_duplicate_write: OnDuplicateWrite::Ignore,
            on_missing_delete: OnMissingDelete::Ignore,
        }
    }
}

/// Options for write operations.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub request: RequestOptions,
    pub transaction: WriteTransactionPolicy,
    pub conflict: ConflictPolicy,
}

impl WriteOptions {
    #[must_use]
    pub fn with_request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    #[must_use]
    pub fn with_transaction(mut self, transaction: WriteTransactionPolicy) -> Self {
        self.transaction = transaction;
        self
    }

    #[must_use]
    pub fn with_conflict(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }
}
