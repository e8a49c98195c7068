//! Core types and utilities for fgakit.
//!
//! This crate provides the identifiers, relationship tuples, error
//! foundation and batch helpers shared by the transport and client crates.

pub mod batch;
pub mod error;
pub mod id;
pub mod tuple;

pub use batch::{CorrelationTracker, chunk};
pub use error::{Result, ValidationError};
pub use id::{AuthorizationModelId, CorrelationId, ParseIdError, StoreId};
pub use tuple::{ConditionReference, RelationshipTuple, TupleKeyWithoutCondition};
