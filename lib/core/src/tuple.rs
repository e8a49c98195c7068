//! Relationship tuples: the facts stored by the authorization service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// A named condition attached to a tuple, with the parameters it is
/// evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionReference {
    /// Condition name as declared in the authorization model.
    pub name: String,
    /// Parameter values bound at write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, JsonValue>>,
}

impl ConditionReference {
    /// Creates a condition reference without bound parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: None,
        }
    }

    /// Binds condition parameters.
    #[must_use]
    pub fn with_context(mut self, context: Map<String, JsonValue>) -> Self {
        self.context = Some(context);
        self
    }
}

/// One edge in the authorization graph: `user` has `relation` on `object`.
///
/// Equality is structural over all four fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipTuple {
    /// The subject, e.g. `user:anne` or `team:eng#member`.
    pub user: String,
    /// The relation name, e.g. `viewer`.
    pub relation: String,
    /// The object, e.g. `document:roadmap`.
    pub object: String,
    /// Optional condition guarding the tuple.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionReference>,
}

impl RelationshipTuple {
    /// Creates an unconditional tuple.
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
            condition: None,
        }
    }

    /// Attaches a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: ConditionReference) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Returns the key used to delete this tuple.
    ///
    /// Deletes identify tuples by user, relation and object only.
    #[must_use]
    pub fn delete_key(&self) -> TupleKeyWithoutCondition {
        TupleKeyWithoutCondition {
            user: self.user.clone(),
            relation: self.relation.clone(),
            object: self.object.clone(),
        }
    }
}

impl fmt::Display for RelationshipTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.user)?;
        if let Some(condition) = &self.condition {
            write!(f, "[{}]", condition.name)?;
        }
        Ok(())
    }
}

/// Wire form of a tuple in a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleKeyWithoutCondition {
    /// The subject.
    pub user: String,
    /// The relation name.
    pub relation: String,
    /// The object.
    pub object: String,
}
