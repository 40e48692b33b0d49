//! Generic in-process resource store.
//!
//! # Main Components
//!
//! - [`Resource`] - Trait that entity kinds implement to be stored
//! - [`CollectionActor`] - Actor that owns one collection
//! - [`CollectionClient`] - Cloneable handle used to talk to a collection actor
//! - [`StoreError`] - Errors shared by every store backend
//!
//! # Testing
//!
//! See the [`mock`] module for scripted collections that record every request.

pub mod core;
pub mod mock;

pub use self::core::*;
