//! Batch authorization checks.
//!
//! Two strategies share correlation-id assignment and bounded dispatch:
//! [`FgaClient::client_batch_check`] sends one check call per item, while
//! [`FgaClient::batch_check`] groups items into server-side batch-check calls.

use crate::client::{FgaClient, Operation};
use crate::dispatch::dispatch_bounded;
use crate::error::{FgaError, FgaResult};
use crate::model::{BatchResult, CheckItem};
use crate::options::BatchCheckOptions;
use crate::wire::{BatchCheckBody, BatchCheckResponseBody};
use fgakit_core::{CorrelationId, CorrelationTracker, ValidationError, chunk};
use fgakit_transport::Transport;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Assigns missing correlation ids and rejects duplicates.
///
/// Every returned item carries its id in `correlation_id` as well.
fn identify(items: Vec<CheckItem>) -> Result<Vec<(CorrelationId, CheckItem)>, ValidationError> {
    let mut tracker = CorrelationTracker::new();
    items
        .into_iter()
        .map(|mut item| {
            let id = tracker.ensure(item.correlation_id.take())?;
            item.correlation_id = Some(id.clone());
            Ok((id, item))
        })
        .collect()
}

impl<T: Transport> FgaClient<T> {
    /// Checks every item with one call each, at most
    /// `options.max_parallel_requests` at a time.
    ///
    /// Results are in input order. A failed check is reported in its own
    /// result; only rejected credentials fail the whole batch.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate correlation ids or invalid options
    /// (before any call), or when the server answers 401 or 403.
    #[instrument(skip(self, items, options), fields(items = items.len(), max_parallel = options.max_parallel_requests))]
    pub async fn client_batch_check(
        &self,
        items: Vec<CheckItem>,
        options: &BatchCheckOptions,
    ) -> FgaResult<Vec<BatchResult>> {
        let identified = identify(items).map_err(FgaError::from)?;
        if identified.is_empty() {
            return Ok(Vec::new());
        }
        let op = self.operation(&options.request)?;

        let results = dispatch_bounded(identified, options.max_parallel_requests, |(id, item)| {
            self.check_item(&op, id, item)
        })
        .await?;

        debug!(
            allowed = results.iter().filter(|r| r.allowed).count(),
            failed = results.iter().filter(|r| !r.is_ok()).count(),
            "batch check complete"
        );
        Ok(results)
    }

    async fn check_item(
        &self,
        op: &Operation<'_>,
        id: CorrelationId,
        item: CheckItem,
    ) -> Result<BatchResult, FgaError> {
        match self.check_with(op, &item).await {
            Ok(allowed) => Ok(BatchResult::answered(item, id, allowed)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(correlation_id = %id, error = %e, "check failed");
                Ok(BatchResult::failed(item, id, e))
            }
        }
    }

    /// Checks every item through the server's batch-check endpoint, in
    /// groups of `options.max_batch_size`.
    ///
    /// There is exactly one result per item, matched by correlation id; the
    /// order of results is unspecified. A failed group marks each of its items
    /// failed; only rejected credentials fail the whole batch.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate correlation ids or invalid options
    /// (before any call), when the server answers 401 or 403, or when a
    /// response names a correlation id that was not sent.
    #[instrument(skip(self, items, options), fields(items = items.len(), max_batch_size = options.max_batch_size))]
    pub async fn batch_check(
        &self,
        items: Vec<CheckItem>,
        options: &BatchCheckOptions,
    ) -> FgaResult<Vec<BatchResult>> {
        let identified = identify(items).map_err(FgaError::from)?;
        let groups = chunk(&identified, options.max_batch_size).map_err(FgaError::from)?;
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        let op = self.operation(&options.request)?;

        let results = dispatch_bounded(groups, options.max_parallel_requests, |group| {
            self.check_group(&op, group)
        })
        .await?;

        let results: Vec<BatchResult> = results.into_iter().flatten().collect();
        debug!(
            allowed = results.iter().filter(|r| r.allowed).count(),
            failed = results.iter().filter(|r| !r.is_ok()).count(),
            "grouped batch check complete"
        );
        Ok(results)
    }

    async fn check_group(
        &self,
        op: &Operation<'_>,
        group: Vec<(CorrelationId, CheckItem)>,
    ) -> Result<Vec<BatchResult>, FgaError> {
        let body = BatchCheckBody::new(&group, op.model_id.as_deref(), op.options.consistency);
        let call = self.request(op, "batch-check", &body)?;
        let response = match self.send(op, &call).await.and_then(|response| {
            response
                .json::<BatchCheckResponseBody>()
                .map_err(FgaError::from)
        }) {
            Ok(response) => response,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(items = group.len(), error = %e, "batch check group failed");
                return Ok(group
                    .into_iter()
                    .map(|(id, item)| BatchResult::failed(item, id, e.clone()))
                    .collect());
            }
        };

        let mut pending: HashMap<CorrelationId, CheckItem> = group.into_iter().collect();
        let mut results = Vec::with_capacity(pending.len());
        for (raw_id, outcome) in response.result {
            let id = CorrelationId::from(raw_id);
            let Some(item) = pending.remove(&id) else {
                return Err(FgaError::Protocol {
                    reason: format!("batch check response names unknown correlation id '{id}'"),
                });
            };
            results.push(outcome.into_result(id, item));
        }
        for (id, item) in pending {
            warn!(correlation_id = %id, "batch check response omitted item");
            let error = FgaError::Protocol {
                reason: format!("batch check response has no result for correlation id '{id}'"),
            };
            results.push(BatchResult::failed(item, id, error));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{STORE, body_str, client};
    use fgakit_transport::{ApiCall, ApiResponse, MockTransport, TransportError};
    use serde_json::{Map, Value as JsonValue, json};
    use std::time::Duration;

    fn items(n: usize) -> Vec<CheckItem> {
        (0..n)
            .map(|i| CheckItem::new(format!("user:{i}"), "viewer", "document:roadmap"))
            .collect()
    }

    /// Answers a batch-check call with `allowed` for every check it names.
    fn answer_all(call: &ApiCall, allowed: bool) -> ApiResponse {
        let mut result = Map::new();
        for check in call.body["checks"].as_array().into_iter().flatten() {
            if let Some(id) = check["correlation_id"].as_str() {
                result.insert(id.to_string(), json!({"allowed": allowed}));
            }
        }
        ApiResponse::ok(json!({"result": JsonValue::Object(result)}))
    }

    #[test]
    fn identify_assigns_and_keeps_ids() {
        let identified = identify(vec![
            CheckItem::new("user:anne", "viewer", "document:a").with_correlation_id("mine"),
            CheckItem::new("user:bob", "viewer", "document:a"),
        ])
        .unwrap();

        assert_eq!(identified[0].0.as_str(), "mine");
        assert_eq!(identified[1].1.correlation_id.as_ref(), Some(&identified[1].0));
    }

    #[tokio::test]
    async fn parallel_results_follow_input_order() {
        let fga = client(
            MockTransport::new(|call, _| {
                let user = body_str(call, "/tuple_key/user");
                let allowed = user.ends_with(['0', '2', '4', '6', '8']);
                Ok(ApiResponse::ok(json!({"allowed": allowed})))
            })
            .with_latency(Duration::from_millis(1)),
        );

        let results = fga
            .client_batch_check(items(9), &BatchCheckOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 9);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.request.user, format!("user:{i}"));
            assert_eq!(result.allowed, i % 2 == 0);
            assert!(result.is_ok());
        }
    }

    #[tokio::test]
    async fn parallel_respects_limit() {
        let fga = client(
            MockTransport::always(ApiResponse::ok(json!({"allowed": true})))
                .with_latency(Duration::from_millis(5)),
        );
        let options = BatchCheckOptions::default().with_max_parallel_requests(3);

        let results = fga.client_batch_check(items(12), &options).await.unwrap();

        assert_eq!(results.len(), 12);
        assert_eq!(fga.transport().call_count(), 12);
        assert!(fga.transport().peak_in_flight() <= 3);
    }

    #[tokio::test]
    async fn grouped_respects_limit() {
        let fga = client(
            MockTransport::new(|call, _| Ok(answer_all(call, true)))
                .with_latency(Duration::from_millis(5)),
        );
        let options = BatchCheckOptions::default()
            .with_max_batch_size(1)
            .with_max_parallel_requests(2);

        let results = fga.batch_check(items(8), &options).await.unwrap();

        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.allowed));
        assert_eq!(fga.transport().call_count(), 8);
        assert!(fga.transport().peak_in_flight() <= 2);
    }

    #[tokio::test]
    async fn parallel_captures_item_failures() {
        let fga = client(MockTransport::new(|call, _| {
            if body_str(call, "/tuple_key/user") == "user:1" {
                Err(TransportError::http(400).with_body("validation_error", "bad user"))
            } else {
                Ok(ApiResponse::ok(json!({"allowed": true})))
            }
        }));

        let results = fga
            .client_batch_check(items(3), &BatchCheckOptions::default())
            .await
            .unwrap();

        assert!(results[0].allowed && results[0].is_ok());
        assert!(!results[1].allowed);
        assert!(matches!(
            results[1].error,
            Some(FgaError::InvalidRequest { status: 400, .. })
        ));
        assert!(results[2].allowed && results[2].is_ok());
    }

    #[tokio::test]
    async fn parallel_aborts_on_authentication_failure() {
        let fga = client(MockTransport::new(|call, _| {
            if body_str(call, "/tuple_key/user") == "user:1" {
                Err(TransportError::http(401).with_body("unauthenticated", "token expired"))
            } else {
                Ok(ApiResponse::ok(json!({"allowed": true})))
            }
        }));
        let options = BatchCheckOptions::default().with_max_parallel_requests(1);

        let err = fga.client_batch_check(items(3), &options).await.unwrap_err();

        assert!(matches!(
            err.current_context(),
            FgaError::Authentication { .. }
        ));
    }

    #[tokio::test]
    async fn parallel_rejects_duplicate_ids_before_dispatch() {
        let fga = client(MockTransport::always(ApiResponse::ok(json!({"allowed": true}))));
        let batch = vec![
            CheckItem::new("user:anne", "viewer", "document:a").with_correlation_id("same"),
            CheckItem::new("user:bob", "viewer", "document:a").with_correlation_id("same"),
        ];

        let err = fga
            .client_batch_check(batch, &BatchCheckOptions::default())
            .await
            .unwrap_err();

        assert!(err.current_context().is_validation());
        assert_eq!(fga.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn empty_batch_makes_no_calls() {
        let fga = client(MockTransport::always(ApiResponse::ok(json!({"allowed": true}))));

        let parallel = fga
            .client_batch_check(Vec::new(), &BatchCheckOptions::default())
            .await
            .unwrap();
        let grouped = fga
            .batch_check(Vec::new(), &BatchCheckOptions::default())
            .await
            .unwrap();

        assert!(parallel.is_empty());
        assert!(grouped.is_empty());
        assert_eq!(fga.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn grouped_rejects_duplicate_ids_before_dispatch() {
        let fga = client(MockTransport::new(|call, _| Ok(answer_all(call, true))));
        let mut batch = items(4);
        batch[1].correlation_id = Some(CorrelationId::from("dup"));
        batch[3].correlation_id = Some(CorrelationId::from("dup"));

        let err = fga
            .batch_check(batch, &BatchCheckOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            FgaError::Validation(ValidationError::DuplicateCorrelationId { .. })
        ));
        assert_eq!(fga.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn grouped_chunks_and_covers_every_item() {
        let fga = client(MockTransport::new(|call, _| Ok(answer_all(call, true))));
        let options = BatchCheckOptions::default().with_max_batch_size(2);

        let results = fga.batch_check(items(5), &options).await.unwrap();

        let calls = fga.transport().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].path, format!("/stores/{STORE}/batch-check"));

        let mut users: Vec<String> = results.iter().map(|r| r.request.user.clone()).collect();
        users.sort();
        assert_eq!(users, vec!["user:0", "user:1", "user:2", "user:3", "user:4"]);
        for result in &results {
            assert!(result.allowed);
            assert_eq!(result.request.correlation_id.as_ref(), Some(&result.correlation_id));
        }
    }

    #[tokio::test]
    async fn grouped_item_error_is_reported() {
        let fga = client(MockTransport::new(|_, _| {
            Ok(ApiResponse::ok(json!({"result": {
                "a": {"allowed": true},
                "b": {"error": {
                    "input_error": "relation_not_found",
                    "message": "no relation 'owner'"
                }}
            }})))
        }));
        let batch = vec![
            CheckItem::new("user:anne", "viewer", "document:a").with_correlation_id("a"),
            CheckItem::new("user:anne", "owner", "document:a").with_correlation_id("b"),
        ];

        let results = fga
            .batch_check(batch, &BatchCheckOptions::default())
            .await
            .unwrap();

        let by_id: HashMap<&str, &BatchResult> = results
            .iter()
            .map(|r| (r.correlation_id.as_str(), r))
            .collect();
        assert!(by_id["a"].allowed && by_id["a"].is_ok());
        assert!(!by_id["b"].allowed);
        assert!(matches!(by_id["b"].error, Some(FgaError::CheckItem { .. })));
    }

    #[tokio::test]
    async fn grouped_failure_is_scoped_to_its_chunk() {
        let fga = client(MockTransport::new(|call, _| {
            if call.body["checks"][0]["tuple_key"]["user"] == json!("user:2") {
                Err(TransportError::http(400).with_body("validation_error", "bad chunk"))
            } else {
                Ok(answer_all(call, true))
            }
        }));
        let options = BatchCheckOptions::default().with_max_batch_size(2);

        let results = fga.batch_check(items(5), &options).await.unwrap();

        assert_eq!(results.len(), 5);
        for result in &results {
            let in_failed_chunk =
                result.request.user == "user:2" || result.request.user == "user:3";
            assert_eq!(result.error.is_some(), in_failed_chunk);
            assert_eq!(result.allowed, !in_failed_chunk);
        }
    }

    #[tokio::test]
    async fn grouped_unknown_id_is_fatal() {
        let fga = client(MockTransport::always(ApiResponse::ok(json!({"result": {
            "stranger": {"allowed": true}
        }}))));

        let err = fga
            .batch_check(items(1), &BatchCheckOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), FgaError::Protocol { .. }));
    }

    #[tokio::test]
    async fn grouped_missing_id_is_item_error() {
        let fga = client(MockTransport::always(ApiResponse::ok(json!({"result": {
            "a": {"allowed": true}
        }}))));
        let batch = vec![
            CheckItem::new("user:anne", "viewer", "document:a").with_correlation_id("a"),
            CheckItem::new("user:bob", "viewer", "document:a").with_correlation_id("b"),
        ];

        let results = fga
            .batch_check(batch, &BatchCheckOptions::default())
            .await
            .unwrap();

        let missing = results
            .iter()
            .find(|r| r.correlation_id.as_str() == "b")
            .unwrap();
        assert!(!missing.allowed);
        assert!(matches!(missing.error, Some(FgaError::Protocol { .. })));
    }

    #[tokio::test]
    async fn grouped_aborts_on_forbidden() {
        let fga = client(MockTransport::new(|_, _| Err(TransportError::http(403))));

        let err = fga
            .batch_check(items(3), &BatchCheckOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), FgaError::Authorization { .. }));
        assert_eq!(fga.transport().call_count(), 1);
    }
}
