//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter filtered
//! by `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Collection lifecycle**: startup, shutdown and final size, tagged with `entity_type`
//! - **Store operations**: list, get, create, update, delete (payloads at `debug`)
//! - **Orchestration**: one span per service call with the printer/plastic/model ids
//! - **Refusals and rollbacks**: `warn` with the reason, `error` when a rollback fails
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info printer-fleet demo
//! RUST_LOG=debug printer-fleet simulate 1
//! RUST_LOG=printer_fleet::service=debug printer-fleet serve
//! ```
//!
//! With `RUST_LOG=info` a queued job that later finishes looks like:
//!
//! ```text
//! INFO try_add_model_to_printer: Updated entity_type="models" id=model_2
//! INFO try_add_model_to_printer: Model queued printer_id=printer_1 model_id=model_2
//! INFO advance_progress: Print finished printer_id=printer_1 model_id=model_1 remaining=35.0 next=Some(ModelId(2))
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type identifies the collection
        .compact()
        .init();
}
