//! JSON bodies exchanged with the authorization service.

use crate::error::FgaError;
use crate::model::{BatchResult, CheckItem, ListObjectsRequest};
use crate::options::{ConflictPolicy, ConsistencyPreference, OnDuplicateWrite, OnMissingDelete};
use fgakit_core::{CorrelationId, RelationshipTuple, TupleKeyWithoutCondition};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub(crate) struct CheckTupleKey<'a> {
    user: &'a str,
    relation: &'a str,
    object: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TupleKeys<'a> {
    tuple_keys: &'a [RelationshipTuple],
}

fn contextual(tuples: &[RelationshipTuple]) -> Option<TupleKeys<'_>> {
    (!tuples.is_empty()).then_some(TupleKeys { tuple_keys: tuples })
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckBody<'a> {
    tuple_key: CheckTupleKey<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contextual_tuples: Option<TupleKeys<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Map<String, JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_model_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    consistency: Option<ConsistencyPreference>,
}

impl<'a> CheckBody<'a> {
    pub(crate) fn new(
        item: &'a CheckItem,
        authorization_model_id: Option<&'a str>,
        consistency: Option<ConsistencyPreference>,
    ) -> Self {
        Self {
            tuple_key: CheckTupleKey {
                user: &item.user,
                relation: &item.relation,
                object: &item.object,
            },
            contextual_tuples: contextual(&item.contextual_tuples),
            context: item.context.as_ref(),
            authorization_model_id,
            consistency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckResponseBody {
    #[serde(default)]
    pub allowed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchCheckItemBody<'a> {
    tuple_key: CheckTupleKey<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contextual_tuples: Option<TupleKeys<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Map<String, JsonValue>>,
    correlation_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchCheckBody<'a> {
    checks: Vec<BatchCheckItemBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_model_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    consistency: Option<ConsistencyPreference>,
}

impl<'a> BatchCheckBody<'a> {
    pub(crate) fn new(
        items: &'a [(CorrelationId, CheckItem)],
        authorization_model_id: Option<&'a str>,
        consistency: Option<ConsistencyPreference>,
    ) -> Self {
        let checks = items
            .iter()
            .map(|(id, item)| BatchCheckItemBody {
                tuple_key: CheckTupleKey {
                    user: &item.user,
                    relation: &item.relation,
                    object: &item.object,
                },
                contextual_tuples: contextual(&item.contextual_tuples),
                context: item.context.as_ref(),
                correlation_id: id.as_str(),
            })
            .collect();
        Self {
            checks,
            authorization_model_id,
            consistency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchCheckResponseBody {
    #[serde(default)]
    pub result: HashMap<String, BatchCheckSingleResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchCheckSingleResult {
    #[serde(default)]
    pub allowed: Option<bool>,
    #[serde(default)]
    pub error: Option<CheckErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckErrorBody {
    #[serde(default)]
    pub input_error: Option<String>,
    #[serde(default)]
    pub internal_error: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl BatchCheckSingleResult {
    pub(crate) fn into_result(
        self,
        correlation_id: CorrelationId,
        request: CheckItem,
    ) -> BatchResult {
        match self.error {
            Some(error) => BatchResult {
                correlation_id,
                allowed: self.allowed.unwrap_or(false),
                request,
                error: Some(FgaError::CheckItem {
                    input_error: error.input_error,
                    internal_error: error.internal_error,
                    message: error.message,
                }),
            },
            None => BatchResult::answered(request, correlation_id, self.allowed.unwrap_or(false)),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct WritesBody<'a> {
    tuple_keys: &'a [RelationshipTuple],
    on_duplicate: OnDuplicateWrite,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeletesBody {
    tuple_keys: Vec<TupleKeyWithoutCondition>,
    on_missing: OnMissingDelete,
}

#[derive(Debug, Serialize)]
pub(crate) struct WriteBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    writes: Option<WritesBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deletes: Option<DeletesBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_model_id: Option<&'a str>,
}

impl<'a> WriteBody<'a> {
    /// Either side is left out of the body when empty.
    pub(crate) fn new(
        writes: &'a [RelationshipTuple],
        deletes: &'a [RelationshipTuple],
        conflict: ConflictPolicy,
        authorization_model_id: Option<&'a str>,
    ) -> Self {
        Self {
            writes: (!writes.is_empty()).then_some(WritesBody {
                tuple_keys: writes,
                on_duplicate: conflict.on_duplicate_write,
            }),
            deletes: (!deletes.is_empty()).then(|| DeletesBody {
                tuple_keys: deletes.iter().map(RelationshipTuple::delete_key).collect(),
                on_missing: conflict.on_missing_delete,
            }),
            authorization_model_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ListObjectsBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_model_id: Option<&'a str>,
    #[serde(rename = "type")]
    object_type: &'a str,
    relation: &'a str,
    user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    contextual_tuples: Option<TupleKeys<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Map<String, JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    consistency: Option<ConsistencyPreference>,
}

impl<'a> ListObjectsBody<'a> {
    pub(crate) fn new(
        request: &'a ListObjectsRequest,
        authorization_model_id: Option<&'a str>,
        consistency: Option<ConsistencyPreference>,
    ) -> Self {
        Self {
            authorization_model_id,
            object_type: &request.object_type,
            relation: &request.relation,
            user: &request.user,
            contextual_tuples: contextual(&request.contextual_tuples),
            context: request.context.as_ref(),
            consistency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListObjectsResponseBody {
    #[serde(default)]
    pub objects: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgakit_core::ConditionReference;
    use serde_json::json;

    #[test]
    fn check_body_omits_unset_fields() {
        let item = CheckItem::new("user:anne", "viewer", "document:roadmap");
        let body = serde_json::to_value(CheckBody::new(&item, None, None)).unwrap();
        assert_eq!(
            body,
            json!({"tuple_key": {
                "user": "user:anne",
                "relation": "viewer",
                "object": "document:roadmap"
            }})
        );
    }

    #[test]
    fn check_body_carries_context_and_model() {
        let mut context = Map::new();
        context.insert("ip".to_string(), json!("10.0.0.1"));
        let item = CheckItem::new("user:anne", "viewer", "document:roadmap")
            .with_contextual_tuples(vec![RelationshipTuple::new(
                "user:anne",
                "member",
                "team:eng",
            )])
            .with_context(context);

        let body = serde_json::to_value(CheckBody::new(
            &item,
            Some("01GXSA8YR785C4FYS3C0RTG7B1"),
            Some(ConsistencyPreference::MinimizeLatency),
        ))
        .unwrap();

        assert_eq!(body["authorization_model_id"], json!("01GXSA8YR785C4FYS3C0RTG7B1"));
        assert_eq!(body["consistency"], json!("MINIMIZE_LATENCY"));
        assert_eq!(body["context"], json!({"ip": "10.0.0.1"}));
        assert_eq!(
            body["contextual_tuples"]["tuple_keys"][0],
            json!({"user": "user:anne", "relation": "member", "object": "team:eng"})
        );
    }

    #[test]
    fn deletes_drop_conditions() {
        let writes = vec![
            RelationshipTuple::new("user:anne", "viewer", "document:a")
                .with_condition(ConditionReference::new("in_office")),
        ];
        let deletes = vec![
            RelationshipTuple::new("user:bob", "viewer", "document:a")
                .with_condition(ConditionReference::new("in_office")),
        ];

        let body = WriteBody::new(&writes, &deletes, ConflictPolicy::ignore_all(), None);
        let body = serde_json::to_value(body).unwrap();

        assert_eq!(body["writes"]["on_duplicate"], json!("ignore"));
        assert_eq!(
            body["writes"]["tuple_keys"][0]["condition"],
            json!({"name": "in_office"})
        );
        assert_eq!(body["deletes"]["on_missing"], json!("ignore"));
        assert_eq!(
            body["deletes"]["tuple_keys"][0],
            json!({"user": "user:bob", "relation": "viewer", "object": "document:a"})
        );
    }

    #[test]
    fn empty_side_is_omitted() {
        let writes = vec![RelationshipTuple::new("user:anne", "viewer", "document:a")];
        let body =
            serde_json::to_value(WriteBody::new(&writes, &[], ConflictPolicy::default(), None))
                .unwrap();
        assert!(body.get("deletes").is_none());
        assert_eq!(body["writes"]["on_duplicate"], json!("error"));
    }

    #[test]
    fn item_error_forces_allowed_false() {
        let raw: BatchCheckSingleResult = serde_json::from_value(json!({
            "error": {"input_error": "relation_not_found", "message": "no relation 'owner'"}
        }))
        .unwrap();
        let item = CheckItem::new("user:anne", "owner", "document:a");

        let result = raw.into_result(CorrelationId::from("c1"), item);

        assert!(!result.allowed);
        assert!(matches!(
            result.error,
            Some(FgaError::CheckItem { input_error: Some(ref e), .. }) if e == "relation_not_found"
        ));
    }
}
