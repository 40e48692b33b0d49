//! Backend-independent access to the printer, plastic and model collections.

pub mod entity_store;
pub mod rest_store;

pub use entity_store::*;
pub use rest_store::*;

use crate::config::FleetConfig;
use crate::domain::{Plastic, PrintModel, Printer};
use crate::framework::{CollectionClient, StoreError};
use std::sync::Arc;

/// The three collections the orchestration service works on.
#[derive(Clone)]
pub struct FleetStores {
    pub printers: Arc<dyn EntityStore<Printer>>,
    pub plastics: Arc<dyn EntityStore<Plastic>>,
    pub models: Arc<dyn EntityStore<PrintModel>>,
}

impl FleetStores {
    /// Stores backed by in-process collection actors.
    pub fn in_process(
        printers: CollectionClient<Printer>,
        plastics: CollectionClient<Plastic>,
        models: CollectionClient<PrintModel>,
    ) -> Self {
        Self {
            printers: Arc::new(printers),
            plastics: Arc::new(plastics),
            models: Arc::new(models),
        }
    }

    /// Stores backed by the REST API at `config.api_url()`.
    pub fn rest(config: &FleetConfig) -> Result<Self, StoreError> {
        let http = http_client(config.request_timeout())?;
        let base_url = config.api_url();
        Ok(Self {
            printers: Arc::new(RestStore::<Printer>::new(http.clone(), base_url)),
            plastics: Arc::new(RestStore::<Plastic>::new(http.clone(), base_url)),
            models: Arc::new(RestStore::<PrintModel>::new(http, base_url)),
        })
    }
}
