use super::EntityStore;
use crate::framework::{EntityId, Resource, StoreError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, instrument};

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

/// Builds the HTTP client shared by the REST stores of one fleet.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, StoreError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// A collection served by a json-server style REST API.
///
/// Paths are `{base_url}/{collection}` and `{base_url}/{collection}/{id}`;
/// updates use `PATCH` with only the fields present in the patch.
pub struct RestStore<T: Resource> {
    http: reqwest::Client,
    base_url: String,
    _phantom: PhantomData<T>,
}

impl<T: Resource> RestStore<T> {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            _phantom: PhantomData,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, T::COLLECTION)
    }

    fn item_url(&self, id: T::Id) -> String {
        format!("{}/{}", self.collection_url(), id.raw())
    }

    /// Maps non-success statuses to [`StoreError::Status`] and decodes the body.
    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, StoreError> {
        let resp = Self::check(resp).await?;
        resp.json::<R>()
            .await
            .map_err(|e| StoreError::Decode(format!("{} response body: {}", T::COLLECTION, e)))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl<T: Resource> EntityStore<T> for RestStore<T> {
    #[instrument(skip(self), fields(entity_type = T::COLLECTION))]
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let resp = self.http.get(self.collection_url()).send().await?;
        Self::parse(resp).await
    }

    #[instrument(skip(self), fields(entity_type = T::COLLECTION))]
    async fn fetch(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        let resp = self.http.get(self.item_url(id)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!(%id, "Not found");
            return Ok(None);
        }
        Self::parse(resp).await.map(Some)
    }

    #[instrument(skip(self), fields(entity_type = T::COLLECTION))]
    async fn create(&self, draft: T::Draft) -> Result<T, StoreError> {
        T::validate_draft(&draft)?;
        let resp = self.http.post(self.collection_url()).json(&draft).send().await?;
        Self::parse(resp).await
    }

    #[instrument(skip(self), fields(entity_type = T::COLLECTION))]
    async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, StoreError> {
        let resp = self.http.patch(self.item_url(id)).json(&patch).send().await?;
        Self::parse(resp).await
    }

    #[instrument(skip(self), fields(entity_type = T::COLLECTION))]
    async fn delete(&self, id: T::Id) -> Result<(), StoreError> {
        let resp = self.http.delete(self.item_url(id)).send().await?;
        Self::check(resp).await.map(|_| ())
    }
}
