//! The asynchronous client.

use crate::config::{ClientConfig, ResolvedConfig, parse_id};
use crate::error::{FgaError, FgaResult};
use crate::model::{CheckItem, ListObjectsRequest};
use crate::options::RequestOptions;
use crate::wire::{CheckBody, CheckResponseBody, ListObjectsBody, ListObjectsResponseBody};
use fgakit_core::{AuthorizationModelId, StoreId, ValidationError};
use fgakit_transport::{
    ApiCall, ApiResponse, HttpTransport, RetryPolicy, Transport, merge_headers, with_retry,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Client for an OpenFGA-compatible authorization service.
///
/// Cloning is cheap: clones share the transport and the configuration.
/// Configuration never changes after construction; `with_store_id` and
/// `with_authorization_model_id` derive a new client instead.
pub struct FgaClient<T = HttpTransport> {
    transport: Arc<T>,
    config: Arc<ResolvedConfig>,
}

impl<T> Clone for FgaClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T> std::fmt::Debug for FgaClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FgaClient")
            .field("store_id", &self.config.store_id)
            .field("authorization_model_id", &self.config.authorization_model_id)
            .finish_non_exhaustive()
    }
}

impl FgaClient<HttpTransport> {
    /// Creates a client that talks HTTP to `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> FgaResult<Self> {
        let resolved = config.resolve()?;
        let transport =
            HttpTransport::new(&config.api_url, resolved.timeout).map_err(FgaError::from)?;
        Ok(Self::from_parts(transport, resolved))
    }
}

impl<T: Transport> FgaClient<T> {
    /// Creates a client over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_transport(config: ClientConfig, transport: T) -> FgaResult<Self> {
        let resolved = config.resolve()?;
        Ok(Self::from_parts(transport, resolved))
    }

    fn from_parts(transport: T, config: ResolvedConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
        }
    }

    /// Returns a client targeting another store, sharing this client's transport.
    #[must_use]
    pub fn with_store_id(&self, store_id: StoreId) -> Self {
        let mut config = (*self.config).clone();
        config.store_id = Some(store_id);
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::new(config),
        }
    }

    /// Returns a client pinned to another model, sharing this client's transport.
    #[must_use]
    pub fn with_authorization_model_id(&self, model_id: AuthorizationModelId) -> Self {
        let mut config = (*self.config).clone();
        config.authorization_model_id = Some(model_id);
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::new(config),
        }
    }

    /// The configured default store, if any.
    #[must_use]
    pub fn store_id(&self) -> Option<StoreId> {
        self.config.store_id
    }

    /// The configured default authorization model, if any.
    #[must_use]
    pub fn authorization_model_id(&self) -> Option<AuthorizationModelId> {
        self.config.authorization_model_id
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Checks whether `item.user` has `item.relation` on `item.object`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is invalid or the call fails after retries.
    #[instrument(skip(self, item, options), fields(user = %item.user, relation = %item.relation, object = %item.object))]
    pub async fn check(&self, item: &CheckItem, options: &RequestOptions) -> FgaResult<bool> {
        let op = self.operation(options)?;
        let allowed = self.check_with(&op, item).await?;
        debug!(allowed, "check result");
        Ok(allowed)
    }

    /// Lists the objects of a type that `request.user` has `request.relation` on.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is invalid or the call fails after retries.
    #[instrument(skip(self, request, options), fields(user = %request.user, relation = %request.relation, object_type = %request.object_type))]
    pub async fn list_objects(
        &self,
        request: &ListObjectsRequest,
        options: &RequestOptions,
    ) -> FgaResult<Vec<String>> {
        let op = self.operation(options)?;
        let body = ListObjectsBody::new(request, op.model_id.as_deref(), options.consistency);
        let call = self.request(&op, "list-objects", &body)?;
        let response = self.send(&op, &call).await?;
        let objects = response
            .json::<ListObjectsResponseBody>()
            .map_err(FgaError::from)?
            .objects;
        debug!(count = objects.len(), "list objects result");
        Ok(objects)
    }

    /// Resolves everything an operation needs before its first call.
    pub(crate) fn operation<'a>(
        &self,
        options: &'a RequestOptions,
    ) -> Result<Operation<'a>, FgaError> {
        let store_id = self
            .config
            .store_id
            .ok_or(ValidationError::MissingField { field: "store_id" })?;

        let model_id = match &options.authorization_model_id {
            Some(raw) => Some(
                parse_id::<AuthorizationModelId>("authorization_model_id", raw)?.to_string(),
            ),
            None => self.config.authorization_model_id.map(|id| id.to_string()),
        };

        let retry = options.retry.unwrap_or(self.config.retry);
        retry.validate()?;

        Ok(Operation {
            store_path: format!("/stores/{store_id}"),
            model_id,
            retry,
            options,
        })
    }

    /// Builds a POST to `endpoint` under the operation's store.
    pub(crate) fn request(
        &self,
        op: &Operation<'_>,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<ApiCall, FgaError> {
        let body = serde_json::to_value(body).map_err(|e| FgaError::Protocol {
            reason: format!("failed to encode request body: {e}"),
        })?;
        let headers = merge_headers(&self.config.default_headers, &op.options.headers);
        let timeout = op.options.timeout.unwrap_or(self.config.timeout);
        Ok(ApiCall::post(format!("{}/{endpoint}", op.store_path), body)
            .with_headers(headers)
            .with_timeout(Some(timeout)))
    }

    /// Performs `call` under the operation's retry policy.
    pub(crate) async fn send(
        &self,
        op: &Operation<'_>,
        call: &ApiCall,
    ) -> Result<ApiResponse, FgaError> {
        with_retry(&op.retry, || self.transport.perform(call))
            .await
            .map_err(FgaError::from)
    }

    pub(crate) async fn check_with(
        &self,
        op: &Operation<'_>,
        item: &CheckItem,
    ) -> Result<bool, FgaError> {
        let body = CheckBody::new(item, op.model_id.as_deref(), op.options.consistency);
        let call = self.request(op, "check", &body)?;
        let response = self.send(op, &call).await?;
        Ok(response.json::<CheckResponseBody>()?.allowed)
    }
}

/// Settings of one operation, resolved and validated up front.
#[derive(Debug)]
pub(crate) struct Operation<'a> {
    store_path: String,
    pub model_id: Option<String>,
    retry: RetryPolicy,
    pub options: &'a RequestOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MODEL, STORE, body_str, client, config};
    use fgakit_transport::{MockTransport, TransportError};
    use serde_json::json;

    #[tokio::test]
    async fn check_posts_to_store() {
        let fga = client(MockTransport::always(ApiResponse::ok(json!({"allowed": true}))));
        let item = CheckItem::new("user:anne", "viewer", "document:roadmap");

        let allowed = fga.check(&item, &RequestOptions::default()).await.unwrap();

        assert!(allowed);
        let calls = fga.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, format!("/stores/{STORE}/check"));
        assert_eq!(body_str(&calls[0], "/tuple_key/user"), "user:anne");
        assert_eq!(
            calls[0].headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn check_retries_rate_limit() {
        let fga = client(MockTransport::new(|_, index| {
            if index == 0 {
                Err(TransportError::http(429).with_retry_after("0"))
            } else {
                Ok(ApiResponse::ok(json!({"allowed": true})))
            }
        }));

        let allowed = fga
            .check(&CheckItem::new("user:anne", "viewer", "document:a"), &RequestOptions::default())
            .await
            .unwrap();

        assert!(allowed);
        assert_eq!(fga.transport().call_count(), 2);
    }

    #[tokio::test]
    async fn not_implemented_is_not_retried() {
        let fga = client(MockTransport::new(|_, _| Err(TransportError::http(501))));

        let err = fga
            .check(&CheckItem::new("user:anne", "viewer", "document:a"), &RequestOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), FgaError::NotImplemented { .. }));
        assert_eq!(fga.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn model_id_override_is_sent_and_validated() {
        let fga = client(MockTransport::always(ApiResponse::ok(json!({"allowed": false}))));
        let item = CheckItem::new("user:anne", "viewer", "document:a");

        let options = RequestOptions::default().with_authorization_model_id(MODEL);
        fga.check(&item, &options).await.unwrap();
        assert_eq!(
            body_str(&fga.transport().calls()[0], "/authorization_model_id"),
            MODEL
        );

        let options = RequestOptions::default().with_authorization_model_id("bogus");
        let err = fga.check(&item, &options).await.unwrap_err();
        assert!(err.current_context().is_validation());
        assert_eq!(fga.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn missing_store_is_rejected_locally() {
        let config = ClientConfig::new("http://localhost:8080");
        let fga = FgaClient::with_transport(
            config,
            MockTransport::always(ApiResponse::ok(json!({"allowed": true}))),
        )
        .unwrap();

        let err = fga
            .check(&CheckItem::new("user:anne", "viewer", "document:a"), &RequestOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &FgaError::Validation(ValidationError::MissingField { field: "store_id" })
        );
        assert_eq!(fga.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn per_call_headers_win() {
        let fga = FgaClient::with_transport(
            config().with_api_token("secret").with_header("X-Tenant", "acme"),
            MockTransport::always(ApiResponse::ok(json!({"allowed": true}))),
        )
        .unwrap();
        let options = RequestOptions::default()
            .with_header("x-tenant", "globex")
            .with_header("content-type", "text/plain");

        fga.check(&CheckItem::new("user:anne", "viewer", "document:a"), &options)
            .await
            .unwrap();

        let headers = &fga.transport().calls()[0].headers;
        let tenant: Vec<&String> = headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("x-tenant"))
            .map(|(_, value)| value)
            .collect();
        assert_eq!(tenant, vec!["globex"]);
        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some("Bearer secret")
        );
        assert_eq!(
            headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn derived_client_targets_new_store() {
        let fga = client(MockTransport::always(ApiResponse::ok(json!({"allowed": true}))));
        let other: StoreId = "01BX5ZZKBKACTAV9WEVGEMMVRZ".parse().unwrap();

        let derived = fga.with_store_id(other);
        derived
            .check(&CheckItem::new("user:anne", "viewer", "document:a"), &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(fga.store_id().unwrap().to_string(), STORE);
        assert_eq!(
            fga.transport().calls()[0].path,
            format!("/stores/{other}/check")
        );
    }

    #[tokio::test]
    async fn list_objects_returns_objects() {
        let fga = client(MockTransport::always(ApiResponse::ok(
            json!({"objects": ["document:a", "document:b"]}),
        )));
        let request = ListObjectsRequest::new("user:anne", "viewer", "document");

        let objects = fga
            .list_objects(&request, &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(objects, vec!["document:a", "document:b"]);
        let call = &fga.transport().calls()[0];
        assert_eq!(call.path, format!("/stores/{STORE}/list-objects"));
        assert_eq!(body_str(call, "/type"), "document");
    }
}
