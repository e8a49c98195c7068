//! Client for OpenFGA-compatible authorization services.
//!
//! This crate provides:
//!
//! - **Batch checks**: one call per item, or grouped server-side batch checks
//! - **Writes**: transactional or chunked tuple writes and deletes
//! - **List relations**: which of a set of relations a user holds
//! - **Blocking client**: a synchronous front end over the async one
//!
//! Every operation shares one bounded dispatcher. Recoverable failures are
//! reported per item; rejected credentials abort the whole operation.

mod batch_check;
pub mod blocking;
pub mod client;
pub mod config;
mod dispatch;
pub mod error;
mod list_relations;
pub mod model;
pub mod options;
mod wire;
mod write;

#[cfg(test)]
mod testing;

pub use blocking::BlockingFgaClient;
pub use client::FgaClient;
pub use config::{ClientConfig, RetrySettings};
pub use error::{FgaError, FgaResult};
pub use model::{
    BatchResult, CheckItem, ListObjectsRequest, ListRelationsRequest, SingleItemOutcome,
    WriteRequest, WriteResponse,
};
pub use options::{
    BatchCheckOptions, ConflictPolicy, ConsistencyPreference, OnDuplicateWrite, OnMissingDelete,
    RequestOptions, WriteOptions, WriteTransactionPolicy,
};

pub use fgakit_core::{
    AuthorizationModelId, ConditionReference, CorrelationId, RelationshipTuple, StoreId,
    ValidationError,
};
pub use fgakit_transport::{HttpTransport, MockTransport, RetryPolicy, Transport};
