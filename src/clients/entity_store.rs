use crate::framework::{CollectionClient, Resource, StoreError};
use async_trait::async_trait;
use tracing::{instrument, warn};

/// Typed CRUD access to one collection, independent of the backend.
///
/// Implemented by [`CollectionClient`] (in-process actor) and
/// [`RestStore`](super::RestStore) (json-server style HTTP API).
///
/// `list`/`fetch` report store failures explicitly. The provided
/// `get_all`/`get_by_id` degrade to an empty result and log the failure.
#[async_trait]
pub trait EntityStore<T: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, StoreError>;

    /// `Ok(None)` means the store answered and the entity does not exist.
    async fn fetch(&self, id: T::Id) -> Result<Option<T>, StoreError>;

    async fn create(&self, draft: T::Draft) -> Result<T, StoreError>;

    async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, StoreError>;

    async fn delete(&self, id: T::Id) -> Result<(), StoreError>;

    /// Every entity in the collection, or an empty list if the store failed.
    #[instrument(skip(self), fields(entity_type = T::COLLECTION))]
    async fn get_all(&self) -> Vec<T> {
        match self.list().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "List failed, returning empty");
                Vec::new()
            }
        }
    }

    /// The entity, or `None` if it is missing or the store failed.
    #[instrument(skip(self), fields(entity_type = T::COLLECTION))]
    async fn get_by_id(&self, id: T::Id) -> Option<T> {
        match self.fetch(id).await {
            Ok(item) => item,
            Err(e) => {
                warn!(%id, error = %e, "Fetch failed, returning none");
                None
            }
        }
    }
}

#[async_trait]
impl<T: Resource> EntityStore<T> for CollectionClient<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        CollectionClient::list(self).await
    }

    async fn fetch(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        self.get(id).await
    }

    async fn create(&self, draft: T::Draft) -> Result<T, StoreError> {
        CollectionClient::create(self, draft).await
    }

    async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, StoreError> {
        CollectionClient::update(self, id, patch).await
    }

    async fn delete(&self, id: T::Id) -> Result<(), StoreError> {
        CollectionClient::delete(self, id).await
    }
}
