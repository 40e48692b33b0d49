//! # Printer Fleet
//!
//! > **Orchestration for a small fleet of 3D printers.**
//!
//! The crate tracks printers, filament ("plastic") spools and print models, and
//! owns the state transitions between them: loading and unloading filament,
//! queueing models, advancing print progress, injecting random faults and
//! resetting failed printers.
//!
//! ## 🏗️ Design
//!
//! ### One lifecycle for every collection
//! Printers, plastics and models are all listed, fetched, created from a draft,
//! patched and deleted. [`framework::Resource`] captures that once, and three
//! pieces are written against it generically:
//! - [`framework::CollectionActor`]: an in-process store, one tokio task per collection.
//! - [`clients::RestStore`]: the same collection behind a json-server style HTTP API.
//! - [`server`]: an axum front that serves the in-process stores over that API.
//!
//! ### Backend-independent service
//! [`service::PrinterService`] only sees [`clients::EntityStore`] trait objects, so it
//! runs unchanged against the actors, the REST API, or a
//! [`MockCollection`](framework::mock::MockCollection) in tests.
//!
//! ### Multi-entity writes
//! Installing a spool touches a printer and a plastic; finishing a job touches
//! the model, the spool, the printer and possibly queued models. Each write is
//! paired with an undo patch, and a failed write rolls back the earlier ones.
//!
//! ## 🗺️ Module Tour
//!
//! - [`framework`]: `Resource`, the collection actor/client pair, `StoreError`, mocks.
//! - [`domain`]: `Printer`, `Plastic`, `PrintModel`, their ids, drafts and patches.
//! - [`clients`]: `EntityStore`, `RestStore`, `FleetStores`.
//! - [`service`]: `PrinterService`, fault generation, the print simulator.
//! - [`lifecycle`]: `FleetSystem` (spawn/shutdown) and tracing setup.
//! - [`config`]: `FleetConfig` from defaults, environment and CLI flags.
//! - [`server`]: the HTTP store server.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Self-contained run against in-process stores
//! RUST_LOG=info cargo run -- demo
//!
//! # Serve the stores, then drive them from another shell
//! cargo run -- serve --listen 127.0.0.1:3000
//! cargo run -- install 1 2
//! cargo run -- simulate 1
//! ```

pub mod clients;
pub mod config;
pub mod domain;
pub mod framework;
pub mod lifecycle;
pub mod server;
pub mod service;
