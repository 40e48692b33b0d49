use printer_fleet::clients::FleetStores;
use printer_fleet::domain::{
    ModelId, ModelPatch, ModelStatus, NewPlastic, NewPrintModel, NewPrinter, Plastic, PlasticId,
    PlasticPatch, PrintModel, Printer, PrinterId, PrinterPatch, PrinterStatus,
};
use printer_fleet::framework::mock::MockCollection;
use printer_fleet::framework::{Resource, StoreError};
use printer_fleet::service::{FaultKind, OrchestrationError, Placement, PrinterService};
use rand::rngs::mock::StepRng;

/// One scripted collection per entity kind, wired into a real service.
///
/// Pattern: Service + Mocks
/// - Real `PrinterService` (tests the orchestration rules)
/// - Mocked collections (scripted reads, recorded writes)
struct Fleet {
    printers: MockCollection<Printer>,
    plastics: MockCollection<Plastic>,
    models: MockCollection<PrintModel>,
}

impl Fleet {
    fn new() -> Self {
        Self {
            printers: MockCollection::new(),
            plastics: MockCollection::new(),
            models: MockCollection::new(),
        }
    }

    fn service(&self) -> PrinterService {
        PrinterService::new(FleetStores::in_process(
            self.printers.client(),
            self.plastics.client(),
            self.models.client(),
        ))
    }

    fn write_count(&self) -> usize {
        self.printers.updates().len() + self.plastics.updates().len() + self.models.updates().len()
    }

    fn verify(&self) {
        self.printers.verify();
        self.plastics.verify();
        self.models.verify();
    }
}

fn printer(id: u32) -> Printer {
    Printer::from_draft(PrinterId(id), NewPrinter::new("Prusa", "i3 MK3S+", 100))
}

fn printing_printer(id: u32, plastic: u32, model: u32) -> Printer {
    let mut p = printer(id);
    p.status = PrinterStatus::Printing;
    p.plastic_id = Some(PlasticId(plastic));
    p.current_model_id = Some(ModelId(model));
    p.printing_progress = Some(40);
    p
}

fn spool(id: u32, length: f64) -> Plastic {
    Plastic::from_draft(PlasticId(id), NewPlastic::new("PLA", "Red", length))
}

fn installed_spool(id: u32, length: f64, printer: u32) -> Plastic {
    let mut s = spool(id, length);
    s.is_installed = true;
    s.printer_id = Some(PrinterId(printer));
    s
}

fn model(id: u32, perimeter: f64) -> PrintModel {
    PrintModel::from_draft(ModelId(id), NewPrintModel::new("Benchy", perimeter))
}

// =============================================================================
// installPlastic / removePlastic
// =============================================================================

#[tokio::test]
async fn test_printing_printer_refuses_spool_changes_without_writes() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(printing_printer(1, 2, 5)));
    fleet.plastics.expect_get(PlasticId(3)).return_ok(Some(spool(3, 100.0)));
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(printing_printer(1, 2, 5)));

    let service = fleet.service();
    assert!(!service.install_plastic(PrinterId(1), PlasticId(3)).await);
    assert!(!service.remove_plastic(PrinterId(1)).await);

    assert_eq!(fleet.write_count(), 0);
    fleet.verify();
}

#[tokio::test]
async fn test_install_issues_exactly_two_updates() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(printer(1)));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(spool(2, 100.0)));
    fleet.printers.expect_update(PrinterId(1)).return_ok(printer(1));
    fleet.plastics.expect_update(PlasticId(2)).return_ok(installed_spool(2, 100.0, 1));

    assert!(fleet.service().install_plastic(PrinterId(1), PlasticId(2)).await);

    assert_eq!(
        fleet.printers.updates(),
        vec![(
            PrinterId(1),
            PrinterPatch {
                plastic_id: Some(Some(PlasticId(2))),
                status: Some(PrinterStatus::Idle),
                ..Default::default()
            }
        )]
    );
    assert_eq!(
        fleet.plastics.updates(),
        vec![(
            PlasticId(2),
            PlasticPatch {
                is_installed: Some(true),
                printer_id: Some(Some(PrinterId(1))),
                ..Default::default()
            }
        )]
    );
    fleet.verify();
}

#[tokio::test]
async fn test_reinstalling_the_same_spool_is_allowed() {
    let mut fleet = Fleet::new();
    let mut holder = printer(1);
    holder.plastic_id = Some(PlasticId(2));
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(holder.clone()));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(installed_spool(2, 50.0, 1)));
    fleet.printers.expect_update(PrinterId(1)).return_ok(holder);
    fleet.plastics.expect_update(PlasticId(2)).return_ok(installed_spool(2, 50.0, 1));

    assert!(fleet.service().install_plastic(PrinterId(1), PlasticId(2)).await);
    assert_eq!(fleet.write_count(), 2);
    fleet.verify();
}

#[tokio::test]
async fn test_swapping_spools_releases_the_previous_one() {
    let mut fleet = Fleet::new();
    let mut holder = printer(1);
    holder.plastic_id = Some(PlasticId(7));
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(holder.clone()));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(spool(2, 100.0)));
    fleet.plastics.expect_get(PlasticId(7)).return_ok(Some(installed_spool(7, 5.0, 1)));
    fleet.printers.expect_update(PrinterId(1)).return_ok(holder);
    fleet.plastics.expect_update(PlasticId(2)).return_ok(installed_spool(2, 100.0, 1));
    fleet.plastics.expect_update(PlasticId(7)).return_ok(spool(7, 5.0));

    assert!(fleet.service().install_plastic(PrinterId(1), PlasticId(2)).await);

    let updates = fleet.plastics.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1], (PlasticId(7), PlasticPatch::released()));
    fleet.verify();
}

#[tokio::test]
async fn test_spool_in_another_printer_is_refused() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(printer(1)));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(installed_spool(2, 100.0, 9)));

    let result = fleet.service().try_install_plastic(PrinterId(1), PlasticId(2)).await;
    assert_eq!(
        result,
        Err(OrchestrationError::PlasticInUse {
            plastic: PlasticId(2),
            holder: Some(PrinterId(9)),
        })
    );
    assert_eq!(fleet.write_count(), 0);
    fleet.verify();
}

#[tokio::test]
async fn test_missing_entities_are_reported() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(4)).return_ok(None);
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(printer(1)));
    fleet.plastics.expect_get(PlasticId(8)).return_ok(None);

    let service = fleet.service();
    assert_eq!(
        service.try_install_plastic(PrinterId(4), PlasticId(8)).await,
        Err(OrchestrationError::PrinterNotFound(PrinterId(4)))
    );
    assert_eq!(
        service.try_install_plastic(PrinterId(1), PlasticId(8)).await,
        Err(OrchestrationError::PlasticNotFound(PlasticId(8)))
    );
    fleet.verify();
}

#[tokio::test]
async fn test_store_failure_is_distinct_from_not_found() {
    let mut fleet = Fleet::new();
    fleet.printers
        .expect_get(PrinterId(1))
        .return_err(StoreError::Transport("connection refused".into()));

    let result = fleet.service().try_remove_plastic(PrinterId(1)).await;
    assert!(matches!(result, Err(OrchestrationError::Store(StoreError::Transport(_)))));
    fleet.verify();
}

#[tokio::test]
async fn test_remove_without_spool_is_refused() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(printer(1)));

    let service = fleet.service();
    assert_eq!(
        service.try_remove_plastic(PrinterId(1)).await,
        Err(OrchestrationError::NoPlasticInstalled(PrinterId(1)))
    );
    assert_eq!(fleet.write_count(), 0);
    fleet.verify();
}

#[tokio::test]
async fn test_remove_clears_both_references() {
    let mut fleet = Fleet::new();
    let mut holder = printer(1);
    holder.plastic_id = Some(PlasticId(2));
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(holder.clone()));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(installed_spool(2, 30.0, 1)));
    fleet.printers.expect_update(PrinterId(1)).return_ok(printer(1));
    fleet.plastics.expect_update(PlasticId(2)).return_ok(spool(2, 30.0));

    assert_eq!(fleet.service().try_remove_plastic(PrinterId(1)).await, Ok(PlasticId(2)));

    assert_eq!(
        fleet.printers.updates(),
        vec![(
            PrinterId(1),
            PrinterPatch {
                plastic_id: Some(None),
                status: Some(PrinterStatus::Idle),
                ..Default::default()
            }
        )]
    );
    assert_eq!(fleet.plastics.updates(), vec![(PlasticId(2), PlasticPatch::released())]);
    fleet.verify();
}

// =============================================================================
// addModelToPrinter
// =============================================================================

fn loaded_printer(id: u32, plastic: u32) -> Printer {
    let mut p = printer(id);
    p.plastic_id = Some(PlasticId(plastic));
    p
}

#[tokio::test]
async fn test_short_spool_refuses_model_without_writes() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(loaded_printer(1, 2)));
    fleet.models.expect_get(ModelId(3)).return_ok(Some(model(3, 15.0)));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(installed_spool(2, 10.0, 1)));

    let service = fleet.service();
    assert_eq!(
        service.try_add_model_to_printer(PrinterId(1), ModelId(3)).await,
        Err(OrchestrationError::InsufficientPlastic {
            required: 15.0,
            available: 10.0
        })
    );
    assert_eq!(fleet.write_count(), 0);
    fleet.verify();
}

#[tokio::test]
async fn test_idle_printer_starts_the_model() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(loaded_printer(1, 2)));
    fleet.models.expect_get(ModelId(3)).return_ok(Some(model(3, 5.0)));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(installed_spool(2, 10.0, 1)));
    fleet.models.expect_update(ModelId(3)).return_ok(model(3, 5.0));
    fleet.printers.expect_update(PrinterId(1)).return_ok(printing_printer(1, 2, 3));

    assert!(fleet.service().add_model_to_printer(PrinterId(1), ModelId(3)).await);

    let model_updates = fleet.models.updates();
    assert_eq!(model_updates.len(), 1);
    let (id, patch) = &model_updates[0];
    assert_eq!(*id, ModelId(3));
    assert_eq!(patch.status, Some(ModelStatus::Printing));
    assert_eq!(patch.printer_id, Some(Some(PrinterId(1))));
    assert!(matches!(patch.queued_at, Some(Some(_))));

    assert_eq!(
        fleet.printers.updates(),
        vec![(
            PrinterId(1),
            PrinterPatch {
                current_model_id: Some(Some(ModelId(3))),
                status: Some(PrinterStatus::Printing),
                printing_progress: Some(Some(0)),
                ..Default::default()
            }
        )]
    );
    fleet.verify();
}

#[tokio::test]
async fn test_busy_printer_queues_the_model() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(printing_printer(1, 2, 5)));
    fleet.models.expect_get(ModelId(3)).return_ok(Some(model(3, 5.0)));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(installed_spool(2, 10.0, 1)));
    fleet.models.expect_update(ModelId(3)).return_ok(model(3, 5.0));

    let placement = fleet
        .service()
        .try_add_model_to_printer(PrinterId(1), ModelId(3))
        .await;
    assert_eq!(placement, Ok(Placement::Queued));
    assert!(fleet.printers.updates().is_empty());
    assert_eq!(fleet.models.updates().len(), 1);
    fleet.verify();
}

#[tokio::test]
async fn test_model_already_printing_is_refused() {
    let mut fleet = Fleet::new();
    let mut busy = model(3, 5.0);
    busy.status = ModelStatus::Printing;
    busy.printer_id = Some(PrinterId(2));
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(loaded_printer(1, 2)));
    fleet.models.expect_get(ModelId(3)).return_ok(Some(busy));

    assert!(!fleet.service().add_model_to_printer(PrinterId(1), ModelId(3)).await);
    assert_eq!(fleet.write_count(), 0);
    fleet.verify();
}

#[tokio::test]
async fn test_printer_without_spool_cannot_take_models() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(printer(1)));
    fleet.models.expect_get(ModelId(3)).return_ok(Some(model(3, 5.0)));

    assert_eq!(
        fleet.service().try_add_model_to_printer(PrinterId(1), ModelId(3)).await,
        Err(OrchestrationError::NoPlasticInstalled(PrinterId(1)))
    );
    fleet.verify();
}

// =============================================================================
// Rollback
// =============================================================================

#[tokio::test]
async fn test_failed_second_write_rolls_back_the_first() {
    let mut fleet = Fleet::new();
    let before = printer(1);
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(before.clone()));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(spool(2, 100.0)));
    fleet.printers.expect_update(PrinterId(1)).return_ok(loaded_printer(1, 2));
    fleet.plastics.expect_update(PlasticId(2)).return_err(StoreError::Status {
        status: 500,
        body: "disk full".into(),
    });
    // Compensating write
    fleet.printers.expect_update(PrinterId(1)).return_ok(before.clone());

    let result = fleet.service().try_install_plastic(PrinterId(1), PlasticId(2)).await;
    assert!(matches!(
        result,
        Err(OrchestrationError::Store(StoreError::Status { status: 500, .. }))
    ));

    let printer_updates = fleet.printers.updates();
    assert_eq!(printer_updates.len(), 2);
    assert_eq!(printer_updates[1], (PrinterId(1), PrinterPatch::restoring(&before)));
    assert_eq!(printer_updates[1].1.plastic_id, Some(None));
    fleet.verify();
}

#[tokio::test]
async fn test_failed_rollback_reports_inconsistency() {
    let mut fleet = Fleet::new();
    fleet.printers.expect_get(PrinterId(1)).return_ok(Some(loaded_printer(1, 2)));
    fleet.models.expect_get(ModelId(3)).return_ok(Some(model(3, 5.0)));
    fleet.plastics.expect_get(PlasticId(2)).return_ok(Some(installed_spool(2, 10.0, 1)));
    fleet.models.expect_update(ModelId(3)).return_ok(model(3, 5.0));
    fleet.printers.expect_update(PrinterId(1)).return_err(StoreError::Closed);
    fleet.models.expect_update(ModelId(3)).return_err(StoreError::Closed);

    let service = fleet.service();
    let result = service.try_add_model_to_printer(PrinterId(1), ModelId(3)).await;
    assert_eq!(
        result,
        Err(OrchestrationError::Inconsistent {
            operation: "add_model_to_printer",
            cause: StoreError::Closed,
        })
    );

    // The attempted undo restored the model's previous assignment
    let model_updates = fleet.models.updates();
    assert_eq!(model_updates[1], (ModelId(3), ModelPatch::restoring(&model(3, 5.0))));
    fleet.verify();
}

// =============================================================================
// generateRandomError
// =============================================================================

#[tokio::test]
async fn test_random_error_follows_the_draw() {
    let fleet = Fleet::new();
    let service = fleet.service();

    let mut low = StepRng::new(0, 0);
    let fault = service.generate_random_error(ModelId(12), &mut low).unwrap();
    assert_eq!(fault.model_id, ModelId(12));
    assert!(FaultKind::ALL.contains(&fault.kind));

    let mut high = StepRng::new(u64::MAX, 0);
    assert!(service.generate_random_error(ModelId(12), &mut high).is_none());

    // Pure: nothing was read or written
    assert!(fleet.printers.calls().is_empty());
    assert!(fleet.plastics.calls().is_empty());
    assert!(fleet.models.calls().is_empty());
}
