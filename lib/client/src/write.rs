//! Writing and deleting relationship tuples.

use crate::client::{FgaClient, Operation};
use crate::dispatch::dispatch_bounded;
use crate::error::{FgaError, FgaResult};
use crate::model::{SingleItemOutcome, WriteRequest, WriteResponse};
use crate::options::WriteOptions;
use crate::wire::WriteBody;
use fgakit_core::{RelationshipTuple, ValidationError, chunk};
use fgakit_transport::Transport;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Writes,
    Deletes,
}

impl Side {
    fn as_str(self) -> &'static str {
        match self {
            Self::Writes => "writes",
            Self::Deletes => "deletes",
        }
    }
}

fn all_succeeded(tuples: Vec<RelationshipTuple>) -> Option<Vec<SingleItemOutcome>> {
    (!tuples.is_empty()).then(|| tuples.into_iter().map(SingleItemOutcome::succeeded).collect())
}

impl<T: Transport> FgaClient<T> {
    /// Writes and deletes tuples.
    ///
    /// Transactional mode sends one all-or-nothing call and fails as a whole.
    /// Chunked mode sends writes, then deletes, in chunks; a failed chunk
    /// marks its own tuples failed and leaves the others alone.
    ///
    /// # Errors
    ///
    /// Returns an error if both sides are empty or the options are invalid
    /// (before any call), when the server answers 401 or 403, and, in
    /// transactional mode, when the single call fails.
    #[instrument(skip(self, request, options), fields(writes = request.writes.len(), deletes = request.deletes.len(), transactional = options.transaction.transactional))]
    pub async fn write(
        &self,
        request: WriteRequest,
        options: &WriteOptions,
    ) -> FgaResult<WriteResponse> {
        if request.is_empty() {
            return Err(FgaError::from(ValidationError::MissingField {
                field: "writes or deletes",
            })
            .into());
        }
        let op = self.operation(&options.request)?;

        if options.transaction.transactional {
            let body = WriteBody::new(
                &request.writes,
                &request.deletes,
                options.conflict,
                op.model_id.as_deref(),
            );
            let call = self.request(&op, "write", &body)?;
            self.send(&op, &call).await?;
            debug!("transactional write committed");
            return Ok(WriteResponse {
                writes: all_succeeded(request.writes),
                deletes: all_succeeded(request.deletes),
            });
        }

        let writes = self.write_side(&op, options, Side::Writes, request.writes).await?;
        let deletes = self.write_side(&op, options, Side::Deletes, request.deletes).await?;
        let response = WriteResponse { writes, deletes };
        debug!(failed = response.failures().count(), "chunked write complete");
        Ok(response)
    }

    /// Writes tuples. See [`FgaClient::write`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::write`].
    pub async fn write_tuples(
        &self,
        tuples: Vec<RelationshipTuple>,
        options: &WriteOptions,
    ) -> FgaResult<WriteResponse> {
        self.write(WriteRequest::new(tuples, Vec::new()), options).await
    }

    /// Deletes tuples. See [`FgaClient::write`].
    ///
    /// # Errors
    ///
    /// As for [`FgaClient::write`].
    pub async fn delete_tuples(
        &self,
        tuples: Vec<RelationshipTuple>,
        options: &WriteOptions,
    ) -> FgaResult<WriteResponse> {
        self.write(WriteRequest::new(Vec::new(), tuples), options).await
    }

    async fn write_side(
        &self,
        op: &Operation<'_>,
        options: &WriteOptions,
        side: Side,
        tuples: Vec<RelationshipTuple>,
    ) -> Result<Option<Vec<SingleItemOutcome>>, FgaError> {
        if tuples.is_empty() {
            return Ok(None);
        }
        let chunks = chunk(&tuples, options.transaction.max_per_chunk)?;
        let limit = options.transaction.max_parallel_requests;
        let outcomes = dispatch_bounded(chunks, limit, |tuples| {
            self.write_chunk(op, options, side, tuples)
        })
        .await?;
        Ok(Some(outcomes.into_iter().flatten().collect()))
    }

    async fn write_chunk(
        &self,
        op: &Operation<'_>,
        options: &WriteOptions,
        side: Side,
        tuples: Vec<RelationshipTuple>,
    ) -> Result<Vec<SingleItemOutcome>, FgaError> {
        let body = match side {
            Side::Writes => WriteBody::new(&tuples, &[], options.conflict, op.model_id.as_deref()),
            Side::Deletes => WriteBody::new(&[], &tuples, options.conflict, op.model_id.as_deref()),
        };
        let call = self.request(op, "write", &body)?;

        match self.send(op, &call).await {
            Ok(_) => Ok(tuples.into_iter().map(SingleItemOutcome::succeeded).collect()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(
                    side = side.as_str(),
                    tuples = tuples.len(),
                    error = %e,
                    "write chunk failed"
                );
                Ok(tuples
                    .into_iter()
                    .map(|tuple| SingleItemOutcome::failed(tuple, e.clone()))
                    .collect())
            }
        }
    }
}
