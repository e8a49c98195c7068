//! Listing the relations a user has on an object.

use crate::client::FgaClient;
use crate::error::{FgaError, FgaResult};
use crate::model::{CheckItem, ListRelationsRequest};
use crate::options::BatchCheckOptions;
use fgakit_core::ValidationError;
use fgakit_transport::Transport;
use tracing::{debug, instrument};

impl<T: Transport> FgaClient<T> {
    /// Returns the candidate relations `request.user` has on `request.object`,
    /// in candidate order.
    ///
    /// Each candidate is checked through [`FgaClient::client_batch_check`].
    ///
    /// # Errors
    ///
    /// Returns an error if there are no candidates, if the batch fails, or
    /// with the first failed check in candidate order.
    #[instrument(skip(self, request, options), fields(user = %request.user, object = %request.object, candidates = request.relations.len()))]
    pub async fn list_relations(
        &self,
        request: ListRelationsRequest,
        options: &BatchCheckOptions,
    ) -> FgaResult<Vec<String>> {
        if request.relations.is_empty() {
            return Err(FgaError::from(ValidationError::MissingField { field: "relations" }).into());
        }

        let items = request
            .relations
            .iter()
            .map(|relation| {
                let item = CheckItem::new(&request.user, relation, &request.object)
                    .with_contextual_tuples(request.contextual_tuples.clone());
                match &request.context {
                    Some(context) => item.with_context(context.clone()),
                    None => item,
                }
            })
            .collect();

        let results = self.client_batch_check(items, options).await?;
        if let Some(error) = results.iter().find_map(|result| result.error.clone()) {
            return Err(error.into());
        }

        let relations: Vec<String> = results
            .into_iter()
            .filter(|result| result.allowed)
            .map(|result| result.request.relation)
            .collect();
        debug!(?relations, "relations resolved");
        Ok(relations)
    }
}
