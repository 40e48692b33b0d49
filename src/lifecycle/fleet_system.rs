use crate::clients::FleetStores;
use crate::config::FleetConfig;
use crate::domain::{Plastic, PrintModel, Printer};
use crate::framework::{CollectionActor, CollectionClient};
use crate::service::PrinterService;
use tracing::{error, info};

/// The in-process fleet: one collection actor per entity kind plus the
/// service wired to them.
///
/// # Example
///
/// ```ignore
/// let system = FleetSystem::new(&FleetConfig::default());
///
/// let printer = system.printers.create(NewPrinter::new("Prusa", "MK4", 120)).await?;
/// system.service.install_plastic(printer.id, spool.id).await;
///
/// system.shutdown().await?;
/// ```
pub struct FleetSystem {
    pub printers: CollectionClient<Printer>,
    pub plastics: CollectionClient<Plastic>,
    pub models: CollectionClient<PrintModel>,
    pub service: PrinterService,

    /// Task handles for the collection actors (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl FleetSystem {
    /// Spawns empty collections. Must be called inside a tokio runtime.
    pub fn new(config: &FleetConfig) -> Self {
        Self::with_entities(config, Vec::new(), Vec::new(), Vec::new())
    }

    /// Spawns collections preloaded with existing entities.
    pub fn with_entities(
        config: &FleetConfig,
        printers: Vec<Printer>,
        plastics: Vec<Plastic>,
        models: Vec<PrintModel>,
    ) -> Self {
        let capacity = config.channel_capacity();
        let (printer_actor, printer_client) = CollectionActor::<Printer>::new(capacity);
        let (plastic_actor, plastic_client) = CollectionActor::<Plastic>::new(capacity);
        let (model_actor, model_client) = CollectionActor::<PrintModel>::new(capacity);

        let handles = vec![
            tokio::spawn(printer_actor.with_entities(printers).run()),
            tokio::spawn(plastic_actor.with_entities(plastics).run()),
            tokio::spawn(model_actor.with_entities(models).run()),
        ];

        let stores = FleetStores::in_process(
            printer_client.clone(),
            plastic_client.clone(),
            model_client.clone(),
        );
        let service = PrinterService::new(stores).with_fault_probability(config.fault_probability());

        Self {
            printers: printer_client,
            plastics: plastic_client,
            models: model_client,
            service,
            handles,
        }
    }

    pub fn stores(&self) -> FleetStores {
        self.service.stores().clone()
    }

    /// Drops every client and waits for the collection actors to exit.
    ///
    /// Clones handed out earlier (for example to a running server) keep their
    /// collection alive, so release those first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down fleet...");

        drop(self.printers);
        drop(self.plastics);
        drop(self.models);
        drop(self.service);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Collection task failed: {:?}", e);
                return Err(format!("Collection task failed: {:?}", e));
            }
        }

        info!("Fleet shutdown complete.");
        Ok(())
    }
}
