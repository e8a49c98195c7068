//! Requests and outcomes of client operations.

use crate::error::FgaError;
use fgakit_core::{CorrelationId, RelationshipTuple};
use serde_json::{Map, Value as JsonValue};

/// One authorization question: does `user` have `relation` on `object`?
#[derive(Debug, Clone, PartialEq)]
pub struct CheckItem {
    /// The subject, e.g. `user:anne` or `group:eng#member`.
    pub user: String,
    /// Relation name as defined in the authorization model.
    pub relation: String,
    /// The resource, e.g. `document:roadmap`.
    pub object: String,
    /// Identifies the item within a batch. Generated when absent.
    pub correlation_id: Option<CorrelationId>,
    /// Tuples considered for this check only, never persisted.
    pub contextual_tuples: Vec<RelationshipTuple>,
    /// Values for condition evaluation.
    pub context: Option<Map<String, JsonValue>>,
}

impl CheckItem {
    #[must_use]
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object: object.into(),
            correlation_id: None,
            contextual_tuples: Vec::new(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<CorrelationId>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_contextual_tuples(mut self, tuples: Vec<RelationshipTuple>) -> Self {
        self.contextual_tuples = tuples;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Map<String, JsonValue>) -> Self {
        self.context = Some(context);
        self
    }
}

/// Outcome of one check within a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub correlation_id: CorrelationId,
    /// False whenever the check failed without an explicit answer.
    pub allowed: bool,
    /// The submitted item, with its correlation id filled in.
    pub request: CheckItem,
    pub error: Option<FgaError>,
}

impl BatchResult {
    pub(crate) fn answered(
        request: CheckItem,
        correlation_id: CorrelationId,
        allowed: bool,
    ) -> Self {
        Self {
            correlation_id,
            allowed,
            request,
            error: None,
        }
    }

    pub(crate) fn failed(
        request: CheckItem,
        correlation_id: CorrelationId,
        error: FgaError,
    ) -> Self {
        Self {
            correlation_id,
            allowed: false,
            request,
            error: Some(error),
        }
    }

    /// Returns true if the check completed without error.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of writing or deleting one tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleItemOutcome {
    pub item: RelationshipTuple,
    pub succeeded: bool,
    pub error: Option<FgaError>,
}

impl SingleItemOutcome {
    pub(crate) fn succeeded(item: RelationshipTuple) -> Self {
        Self {
            item,
            succeeded: true,
            error: None,
        }
    }

    pub(crate) fn failed(item: RelationshipTuple, error: FgaError) -> Self {
        Self {
            item,
            succeeded: false,
            error: Some(error),
        }
    }
}

/// Tuples to write and delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteRequest {
    /// Tuples to create.
    pub writes: Vec<RelationshipTuple>,
    /// Tuples to remove. Conditions are ignored.
    pub deletes: Vec<RelationshipTuple>,
}

impl WriteRequest {
    #[must_use]
    pub fn new(writes: Vec<RelationshipTuple>, deletes: Vec<RelationshipTuple>) -> Self {
        Self { writes, deletes }
    }

    /// Returns true if there is nothing to write or delete.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.deletes.is_empty()
    }
}

/// Per-tuple outcomes of a write. A side with no input is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteResponse {
    /// Outcomes for [`WriteRequest::writes`], in input order.
    pub writes: Option<Vec<SingleItemOutcome>>,
    /// Outcomes for [`WriteRequest::deletes`], in input order.
    pub deletes: Option<Vec<SingleItemOutcome>>,
}

impl WriteResponse {
    /// Iterates over every outcome that failed, writes first.
    pub fn failures(&self) -> impl Iterator<Item = &SingleItemOutcome> {
        self.writes
            .iter()
            .chain(self.deletes.iter())
            .flatten()
            .filter(|outcome| !outcome.succeeded)
    }
}

/// Which of the candidate relations does `user` have on `object`?
#[derive(Debug, Clone, PartialEq)]
pub struct ListRelationsRequest {
    pub user: String,
    pub object: String,
    pub relations: Vec<String>,
    pub contextual_tuples: Vec<RelationshipTuple>,
    pub context: Option<Map<String, JsonValue>>,
}

impl ListRelationsRequest {
    #[must_use]
    pub fn new<R: Into<String>>(
        user: impl Into<String>,
        object: impl Into<String>,
        relations: impl IntoIterator<Item = R>,
    ) -> Self {
        Self {
            user: user.into(),
            object: object.into(),
            relations: relations.into_iter().map(Into::into).collect(),
            contextual_tuples: Vec::new(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_contextual_tuples(mut self, tuples: Vec<RelationshipTuple>) -> Self {
        self.contextual_tuples = tuples;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Map<String, JsonValue>) -> Self {
        self.context = Some(context);
        self
    }
}

/// Which objects of `object_type` does `user` have `relation` on?
#[derive(Debug, Clone, PartialEq)]
pub struct ListObjectsRequest {
    pub user: String,
    pub relation: String,
    pub object_type: String,
    pub contextual_tuples: Vec<RelationshipTuple>,
    pub context: Option<Map<String, JsonValue>>,
}

impl ListObjectsRequest {
    #[must_use]
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object_type: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object_type: object_type.into(),
            contextual_tuples: Vec::new(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_contextual_tuples(mut self, tuples: Vec<RelationshipTuple>) -> Self {
        self.contextual_tuples = tuples;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Map<String, JsonValue>) -> Self {
        self.context = Some(context);
        self
    }
}
