//! HTTP front for the fleet stores.
//!
//! Serves the same json-server style contract that [`RestStore`](crate::clients::RestStore)
//! consumes, so a [`FleetSystem`](crate::lifecycle::FleetSystem) can stand in
//! for the external REST backend:
//!
//! - `GET /{collection}`, `POST /{collection}`
//! - `GET /{collection}/{id}`, `PATCH /{collection}/{id}`, `DELETE /{collection}/{id}`

use crate::clients::{EntityStore, FleetStores};
use crate::domain::{Plastic, PrintModel, Printer};
use crate::framework::{EntityId, Resource, StoreError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

type SharedStore<T> = Arc<dyn EntityStore<T>>;

/// A store error rendered as an HTTP status with the error text as body.
#[derive(Debug)]
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        (status, self.0.to_string()).into_response()
    }
}

/// Router exposing all three collections.
pub fn router(stores: FleetStores) -> Router {
    Router::new()
        .merge(collection_routes::<Printer>(stores.printers))
        .merge(collection_routes::<Plastic>(stores.plastics))
        .merge(collection_routes::<PrintModel>(stores.models))
}

fn collection_routes<T: Resource>(store: SharedStore<T>) -> Router {
    let collection = format!("/{}", T::COLLECTION);
    let item = format!("/{}/{{id}}", T::COLLECTION);
    Router::new()
        .route(&collection, get(list::<T>).post(create::<T>))
        .route(&item, get(fetch::<T>).patch(update::<T>).delete(delete::<T>))
        .with_state(store)
}

async fn list<T: Resource>(State(store): State<SharedStore<T>>) -> Result<Json<Vec<T>>, ApiError> {
    Ok(Json(store.list().await?))
}

async fn fetch<T: Resource>(
    State(store): State<SharedStore<T>>,
    Path(id): Path<u32>,
) -> Result<Json<T>, ApiError> {
    let id = T::Id::from_raw(id);
    match store.fetch(id).await? {
        Some(item) => Ok(Json(item)),
        None => Err(StoreError::not_found::<T>(id).into()),
    }
}

async fn create<T: Resource>(
    State(store): State<SharedStore<T>>,
    Json(draft): Json<T::Draft>,
) -> Result<(StatusCode, Json<T>), ApiError> {
    let item = store.create(draft).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update<T: Resource>(
    State(store): State<SharedStore<T>>,
    Path(id): Path<u32>,
    Json(patch): Json<T::Patch>,
) -> Result<Json<T>, ApiError> {
    Ok(Json(store.update(T::Id::from_raw(id), patch).await?))
}

async fn delete<T: Resource>(
    State(store): State<SharedStore<T>>,
    Path(id): Path<u32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    store.delete(T::Id::from_raw(id)).await?;
    Ok(Json(serde_json::json!({})))
}

/// Serves `stores` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    stores: FleetStores,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Store server listening");
    axum::serve(listener, router(stores))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!(%addr, "Store server stopped");
    Ok(())
}
