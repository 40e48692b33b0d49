//! # Core Store Framework
//!
//! This module defines the generic building blocks for the in-process resource store.
//!
//! ## Key Types
//!
//! - [`Resource`]: The trait that every stored entity kind implements.
//! - [`CollectionActor`]: The actor that owns one collection and serializes access to it.
//! - [`CollectionClient`]: The cheap, cloneable handle used to talk to a collection actor.
//! - [`StoreError`]: Errors shared by every store backend (in-process and REST).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Identifier of a stored entity.
///
/// Ids are assigned by the store as increasing integers, exactly like a
/// json-server backend does, so every id type is a thin wrapper over `u32`.
pub trait EntityId:
    Copy + Ord + Eq + Hash + Display + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn from_raw(raw: u32) -> Self;
    fn raw(self) -> u32;
}

/// Trait that any entity kind must implement to live in a collection.
///
/// # Architecture Note
/// Every collection (printers, plastics, models) has the same lifecycle: it is listed,
/// fetched, created from a draft, patched and deleted. Writing that lifecycle once
/// against this trait lets [`CollectionActor`], the REST store and the HTTP server
/// share one implementation.
///
/// The associated types keep payloads apart: a `Printer` collection only accepts
/// a `NewPrinter` draft and a `PrinterPatch`, never a plastic payload.
pub trait Resource:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Collection name, used as the REST path segment (e.g. `printers`).
    const COLLECTION: &'static str;

    /// The unique identifier for this entity.
    type Id: EntityId;

    /// The entity without its id (DTO sent on create).
    type Draft: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Partial update. Absent fields are left untouched.
    type Patch: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    fn id(&self) -> Self::Id;

    /// Checks a draft before it is stored or sent.
    fn validate_draft(draft: &Self::Draft) -> Result<(), StoreError>;

    /// Construct the full entity from the id chosen by the store and a validated draft.
    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self;

    /// Applies a partial update in place.
    ///
    /// Implementations validate the patch before touching any field, so an
    /// `Err` leaves the entity unchanged.
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), StoreError>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors raised by any store backend.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StoreError {
    #[error("Store closed")]
    Closed,
    #[error("Store dropped response channel")]
    Dropped,
    #[error("{collection} item not found: {id}")]
    NotFound { collection: &'static str, id: String },
    #[error("Invalid payload: {0}")]
    Invalid(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Store responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Unexpected request: {0}")]
    Unexpected(String),
}

impl StoreError {
    pub fn not_found<T: Resource>(id: T::Id) -> Self {
        StoreError::NotFound {
            collection: T::COLLECTION,
            id: id.to_string(),
        }
    }

    /// True when the error means "no such entity" rather than "store unreachable".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::Status { status: 404, .. }
        )
    }
}

/// Type alias for the one-shot response channel used by collection actors.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// Message sent to a [`CollectionActor`].
///
/// The variants map one-to-one onto the REST verbs the store exposes:
/// `List`/`Get` are reads, `Create` is `POST`, `Update` is `PATCH`, `Delete` is `DELETE`.
#[derive(Debug)]
pub enum CollectionRequest<T: Resource> {
    List {
        respond_to: Response<Vec<T>>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Create {
        draft: T::Draft,
        respond_to: Response<T>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
}

// =============================================================================
// 3. THE COLLECTION ACTOR
// =============================================================================

/// The actor that owns a single collection.
///
/// # Architecture Note
/// This struct is the "server" half. It owns the entities and the receiver end of
/// the channel and processes requests one at a time, so every create/patch/delete
/// on a collection is serialized without a `Mutex`. Operations spanning several
/// collections are *not* serialized; see the saga in [`crate::service`].
pub struct CollectionActor<T: Resource> {
    receiver: mpsc::Receiver<CollectionRequest<T>>,
    store: BTreeMap<T::Id, T>,
    next_id: u32,
}

impl<T: Resource> CollectionActor<T> {
    pub fn new(buffer_size: usize) -> (Self, CollectionClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: BTreeMap::new(),
            next_id: 1,
        };
        (actor, CollectionClient::new(sender))
    }

    /// Preloads entities, keeping their ids. New ids continue after the highest one.
    pub fn with_entities(mut self, entities: impl IntoIterator<Item = T>) -> Self {
        for entity in entities {
            let id = entity.id();
            self.next_id = self.next_id.max(id.raw() + 1);
            self.store.insert(id, entity);
        }
        self
    }

    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self) {
        let entity_type = T::COLLECTION;
        info!(entity_type, size = self.store.len(), "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CollectionRequest::List { respond_to } => {
                    debug!(entity_type, size = self.store.len(), "List");
                    let _ = respond_to.send(Ok(self.store.values().cloned().collect()));
                }
                CollectionRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                CollectionRequest::Create { draft, respond_to } => {
                    debug!(entity_type, ?draft, "Create");
                    if let Err(e) = T::validate_draft(&draft) {
                        warn!(entity_type, error = %e, "Create rejected");
                        let _ = respond_to.send(Err(e));
                        continue;
                    }
                    let id = T::Id::from_raw(self.next_id);
                    self.next_id += 1;
                    let item = T::from_draft(id, draft);
                    self.store.insert(id, item.clone());
                    info!(entity_type, %id, size = self.store.len(), "Created");
                    let _ = respond_to.send(Ok(item));
                }
                CollectionRequest::Update { id, patch, respond_to } => {
                    debug!(entity_type, %id, ?patch, "Update");
                    let Some(item) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(StoreError::not_found::<T>(id)));
                        continue;
                    };
                    match item.apply_patch(patch) {
                        Ok(()) => {
                            info!(entity_type, %id, "Updated");
                            let _ = respond_to.send(Ok(item.clone()));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Update rejected");
                            let _ = respond_to.send(Err(e));
                        }
                    }
                }
                CollectionRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    if self.store.remove(&id).is_some() {
                        info!(entity_type, %id, size = self.store.len(), "Deleted");
                        let _ = respond_to.send(Ok(()));
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(StoreError::not_found::<T>(id)));
                    }
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}

// =============================================================================
// 4. THE COLLECTION CLIENT
// =============================================================================

/// A type-safe handle for a running [`CollectionActor`].
///
/// Holds only a sender, so cloning is cheap and clones can be shared across tasks.
/// The collection shuts down once the last clone is dropped.
#[derive(Clone)]
pub struct CollectionClient<T: Resource> {
    sender: mpsc::Sender<CollectionRequest<T>>,
}

impl<T: Resource> CollectionClient<T> {
    pub fn new(sender: mpsc::Sender<CollectionRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> CollectionRequest<T>,
    ) -> Result<R, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Dropped)?
    }

    pub async fn list(&self) -> Result<Vec<T>, StoreError> {
        self.request(|respond_to| CollectionRequest::List { respond_to })
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        self.request(|respond_to| CollectionRequest::Get { id, respond_to })
            .await
    }

    pub async fn create(&self, draft: T::Draft) -> Result<T, StoreError> {
        self.request(|respond_to| CollectionRequest::Create { draft, respond_to })
            .await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, StoreError> {
        self.request(|respond_to| CollectionRequest::Update {
            id,
            patch,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), StoreError> {
        self.request(|respond_to| CollectionRequest::Delete { id, respond_to })
            .await
    }
}
