use printer_fleet::clients::{EntityStore, FleetStores};
use printer_fleet::config::FleetConfig;
use printer_fleet::domain::{
    NewPlastic, NewPrinter, PlasticId, PlasticPatch, PrinterId, PrinterPatch, PrinterStatus,
};
use printer_fleet::framework::StoreError;
use printer_fleet::lifecycle::FleetSystem;
use printer_fleet::server;
use printer_fleet::service::PrinterService;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// In-process fleet served over HTTP on an ephemeral port.
struct Served {
    system: FleetSystem,
    stores: FleetStores,
    stop: oneshot::Sender<()>,
    server: JoinHandle<std::io::Result<()>>,
}

async fn serve() -> Served {
    let system = FleetSystem::new(&FleetConfig::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(listener, system.stores(), async {
        let _ = stopped.await;
    }));

    let config = FleetConfig::new().with_api_url(format!("http://{addr}"));
    let stores = FleetStores::rest(&config).unwrap();
    Served {
        system,
        stores,
        stop,
        server,
    }
}

impl Served {
    async fn shutdown(self) {
        drop(self.stores);
        let _ = self.stop.send(());
        self.server.await.unwrap().unwrap();
        self.system.shutdown().await.unwrap();
    }
}

#[tokio::test]
async fn test_rest_crud_round_trip() {
    let served = serve().await;
    let printers = &served.stores.printers;

    let created = printers
        .create(NewPrinter::new("Creality", "Ender 3", 80))
        .await
        .unwrap();
    assert_eq!(created.id, PrinterId(1));
    assert_eq!(created.status, PrinterStatus::Idle);

    let fetched = printers.fetch(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(printers.get_all().await.len(), 1);

    // Missing entities read as None, not as an error
    assert_eq!(printers.fetch(PrinterId(99)).await, Ok(None));
    assert!(printers.get_by_id(PrinterId(99)).await.is_none());

    printers.delete(created.id).await.unwrap();
    let err = printers.delete(created.id).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");

    served.shutdown().await;
}

#[tokio::test]
async fn test_patch_nulls_clear_fields() {
    let served = serve().await;
    let plastics = &served.stores.plastics;

    let spool = plastics.create(NewPlastic::new("ABS", "Black", 40.0)).await.unwrap();
    let installed = plastics
        .update(spool.id, PlasticPatch::installed_in(PrinterId(3)))
        .await
        .unwrap();
    assert!(installed.is_installed);
    assert_eq!(installed.printer_id, Some(PrinterId(3)));

    let released = plastics.update(spool.id, PlasticPatch::released()).await.unwrap();
    assert!(!released.is_installed);
    assert_eq!(released.printer_id, None);

    // The change is visible through the in-process client as well
    let stored = served.system.plastics.get(spool.id).await.unwrap().unwrap();
    assert_eq!(stored.printer_id, None);

    served.shutdown().await;
}

#[tokio::test]
async fn test_server_maps_errors_to_statuses() {
    let served = serve().await;

    let err = served
        .stores
        .plastics
        .update(
            PlasticId(5),
            PlasticPatch {
                length: Some(1.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Status { status: 404, .. }), "{err}");

    let printer = served
        .stores
        .printers
        .create(NewPrinter::new("Bambu", "X1C", 250))
        .await
        .unwrap();
    let err = served
        .stores
        .printers
        .update(
            printer.id,
            PrinterPatch {
                printing_progress: Some(Some(150)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    let StoreError::Status { status, body } = err else {
        panic!("expected a status error");
    };
    assert_eq!(status, 400);
    assert!(body.contains("printingProgress"), "{body}");

    served.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_store_degrades_reads() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = FleetConfig::new()
        .with_api_url(format!("http://{addr}"))
        .with_request_timeout_secs(2);
    let stores = FleetStores::rest(&config).unwrap();

    assert!(stores.printers.get_all().await.is_empty());
    assert!(stores.printers.get_by_id(PrinterId(1)).await.is_none());
    assert!(matches!(
        stores.printers.fetch(PrinterId(1)).await,
        Err(StoreError::Transport(_))
    ));

    let service = PrinterService::new(stores);
    assert!(!service.install_plastic(PrinterId(1), PlasticId(1)).await);
}

#[tokio::test]
async fn test_service_over_rest() {
    let served = serve().await;
    let service = PrinterService::new(served.stores.clone());

    let printer = served
        .stores
        .printers
        .create(NewPrinter::new("Prusa", "MINI+", 90))
        .await
        .unwrap();
    let spool = served
        .stores
        .plastics
        .create(NewPlastic::new("PLA", "White", 25.0))
        .await
        .unwrap();

    assert!(service.install_plastic(printer.id, spool.id).await);
    let loaded = served.stores.printers.fetch(printer.id).await.unwrap().unwrap();
    assert_eq!(loaded.plastic_id, Some(spool.id));

    assert_eq!(service.try_remove_plastic(printer.id).await, Ok(spool.id));
    let unloaded = served.stores.printers.fetch(printer.id).await.unwrap().unwrap();
    assert_eq!(unloaded.plastic_id, None);

    drop(service);
    served.shutdown().await;
}
