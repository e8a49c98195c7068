//! Error handling foundation for fgakit.
//!
//! This module provides the `Result` type alias using rootcause, plus the
//! local validation failures shared by every crate in the workspace. Local
//! validation errors are always raised before any network activity.

use crate::id::CorrelationId;
use rootcause::Report;
use std::fmt;

/// A Result type alias using rootcause's Report for error handling.
///
/// Each layer adds its own context via `.context()` as errors propagate.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

/// Input rejected locally, before it could reach the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The same correlation id appeared twice in one batch submission.
    DuplicateCorrelationId { id: CorrelationId },
    /// A chunk size of zero was requested.
    InvalidChunkSize { size: usize },
    /// An identifier did not have the expected format.
    MalformedIdentifier { kind: &'static str, value: String },
    /// A required field was missing or empty.
    MissingField { field: &'static str },
    /// A configured limit was out of range.
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCorrelationId { id } => {
                write!(f, "duplicate correlation id '{id}' in batch")
            }
            Self::InvalidChunkSize { size } => {
                write!(f, "chunk size must be at least 1, got {size}")
            }
            Self::MalformedIdentifier { kind, value } => {
                write!(f, "malformed {kind}: '{value}'")
            }
            Self::MissingField { field } => write!(f, "'{field}' is required"),
            Self::OutOfRange { field, value, max } => {
                write!(f, "'{field}' is {value}, must be at most {max}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
