//! Synchronous front end.
//!
//! Each method blocks the calling thread on the async client using a private
//! current-thread runtime. Do not call these from inside an async runtime.

use crate::client::FgaClient;
use crate::config::ClientConfig;
use crate::error::{FgaError, FgaResult};
use crate::model::{
    BatchResult, CheckItem, ListObjectsRequest, ListRelationsRequest, WriteRequest, WriteResponse,
};
use crate::options::{BatchCheckOptions, RequestOptions, WriteOptions};
use fgakit_core::RelationshipTuple;
use fgakit_transport::{HttpTransport, Transport};
use tokio::runtime::{Builder, Runtime};

/// Blocking wrapper around [`FgaClient`].
pub struct BlockingFgaClient<T = HttpTransport> {
    inner: FgaClient<T>,
    runtime: Runtime,
}

impl BlockingFgaClient<HttpTransport> {
    /// Creates a blocking client that talks HTTP to `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the runtime
    /// cannot start.
    pub fn new(config: ClientConfig) -> FgaResult<Self> {
        Self::from_client(FgaClient::new(config)?)
    }
}

impl<T: Transport> BlockingFgaClient<T> {
    /// Wraps an existing async client.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot start.
    pub fn from_client(inner: FgaClient<T>) -> FgaResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FgaError::Configuration {
                reason: format!("failed to start runtime: {e}"),
            })?;
        Ok(Self { inner, runtime })
    }

    /// The wrapped async client.
    #[must_use]
    pub fn client(&self) -> &FgaClient<T> {
        &self.inner
    }

    /// See [`FgaClient::check`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::check`].
    pub fn check(&self, item: &CheckItem, options: &RequestOptions) -> FgaResult<bool> {
        self.runtime.block_on(self.inner.check(item, options))
    }

    /// See [`FgaClient::client_batch_check`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::client_batch_check`].
    pub fn client_batch_check(
        &self,
        items: Vec<CheckItem>,
        options: &BatchCheckOptions,
    ) -> FgaResult<Vec<BatchResult>> {
        self.runtime.block_on(self.inner.client_batch_check(items, options))
    }

    /// See [`FgaClient::batch_check`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::batch_check`].
    pub fn batch_check(
        &self,
        items: Vec<CheckItem>,
        options: &BatchCheckOptions,
    ) -> FgaResult<Vec<BatchResult>> {
        self.runtime.block_on(self.inner.batch_check(items, options))
    }

    /// See [`FgaClient::write`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::write`].
    pub fn write(&self, request: WriteRequest, options: &WriteOptions) -> FgaResult<WriteResponse> {
        self.runtime.block_on(self.inner.write(request, options))
    }

    /// See [`FgaClient::write_tuples`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::write`].
    pub fn write_tuples(
        &self,
        tuples: Vec<RelationshipTuple>,
        options: &WriteOptions,
    ) -> FgaResult<WriteResponse> {
        self.runtime.block_on(self.inner.write_tuples(tuples, options))
    }

    /// See [`FgaClient::delete_tuples`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::write`].
    pub fn delete_tuples(
        &self,
        tuples: Vec<RelationshipTuple>,
        options: &WriteOptions,
    ) -> FgaResult<WriteResponse> {
        self.runtime.block_on(self.inner.delete_tuples(tuples, options))
    }

    /// See [`FgaClient::list_relations`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::list_relations`].
    pub fn list_relations(
        &self,
        request: ListRelationsRequest,
        options: &BatchCheckOptions,
    ) -> FgaResult<Vec<String>> {
        self.runtime.block_on(self.inner.list_relations(request, options))
    }

    /// See [`FgaClient::list_objects`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::list_objects`].
    pub fn list_objects(
        &self,
        request: &ListObjectsRequest,
        options: &RequestOptions,
    ) -> FgaResult<Vec<String>> {
        self.runtime.block_on(self.inner.list_objects(request, options))
    }
}
