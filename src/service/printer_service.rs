//! # Printer Service
//!
//! Cross-entity operations on printers, plastic spools and models.
//!
//! The service holds no state of its own: every call re-reads the entities it
//! needs, validates, then writes through a [`Saga`] so a failed write undoes
//! the ones before it.
//!
//! The spool/printer operations come in two forms. `install_plastic` and
//! friends answer `true`/`false` and log the reason for a refusal;
//! `try_install_plastic` and friends return the reason as an
//! [`OrchestrationError`].

use super::faults::{FaultGenerator, PrinterFault};
use super::saga::Saga;
use super::OrchestrationError;
use crate::clients::FleetStores;
use crate::domain::{
    ModelId, ModelPatch, ModelStatus, Plastic, PlasticId, PlasticPatch, PrintModel, Printer,
    PrinterId, PrinterPatch, PrinterStatus,
};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};

/// Where an accepted model ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// The printer was free and started the model.
    Started,
    /// The printer is busy; the model waits in its queue.
    Queued,
}

/// A printer's active job and the models waiting behind it, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintQueue {
    pub printer_id: PrinterId,
    pub active: Option<ModelId>,
    pub pending: Vec<PrintModel>,
}

impl PrintQueue {
    pub fn pending_ids(&self) -> Vec<ModelId> {
        self.pending.iter().map(|m| m.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrintProgress {
    Running(u8),
    /// The active job completed; `next` is the model promoted from the queue.
    Finished {
        model: PrintModel,
        next: Option<ModelId>,
    },
}

#[derive(Clone)]
pub struct PrinterService {
    stores: FleetStores,
    faults: FaultGenerator,
}

impl PrinterService {
    pub fn new(stores: FleetStores) -> Self {
        Self {
            stores,
            faults: FaultGenerator::default(),
        }
    }

    pub fn with_fault_probability(mut self, probability: f64) -> Self {
        self.faults = FaultGenerator::new(probability);
        self
    }

    pub fn stores(&self) -> &FleetStores {
        &self.stores
    }

    // =========================================================================
    // Fail-soft operations
    // =========================================================================

    /// Loads `plastic_id` into `printer_id`. `false` when refused or on store failure.
    pub async fn install_plastic(&self, printer_id: PrinterId, plastic_id: PlasticId) -> bool {
        soft(
            "install_plastic",
            self.try_install_plastic(printer_id, plastic_id).await,
        )
        .is_some()
    }

    /// Unloads whatever spool `printer_id` holds.
    pub async fn remove_plastic(&self, printer_id: PrinterId) -> bool {
        soft("remove_plastic", self.try_remove_plastic(printer_id).await).is_some()
    }

    /// Starts `model_id` on `printer_id`, or queues it if the printer is busy.
    pub async fn add_model_to_printer(&self, printer_id: PrinterId, model_id: ModelId) -> bool {
        soft(
            "add_model_to_printer",
            self.try_add_model_to_printer(printer_id, model_id).await,
        )
        .is_some()
    }

    /// Draws a random fault for `model_id`. Reads and writes nothing.
    pub fn generate_random_error<R: Rng + ?Sized>(
        &self,
        model_id: ModelId,
        rng: &mut R,
    ) -> Option<PrinterFault> {
        let fault = self.faults.draw(model_id, rng);
        if let Some(fault) = &fault {
            debug!(%model_id, kind = ?fault.kind, "Fault drawn");
        }
        fault
    }

    // =========================================================================
    // Spool operations
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn try_install_plastic(
        &self,
        printer_id: PrinterId,
        plastic_id: PlasticId,
    ) -> Result<(), OrchestrationError> {
        let printer = self.printer(printer_id).await?;
        let plastic = self.plastic(plastic_id).await?;

        if printer.is_printing() {
            return Err(OrchestrationError::PrinterBusy(printer_id));
        }
        if plastic.is_installed_elsewhere(printer_id) {
            return Err(OrchestrationError::PlasticInUse {
                plastic: plastic_id,
                holder: plastic.printer_id,
            });
        }

        // A different spool still loaded in this printer has to be released.
        let previous = match printer.plastic_id {
            Some(previous_id) if previous_id != plastic_id => {
                let previous = self.stores.plastics.fetch(previous_id).await?;
                if previous.is_none() {
                    warn!(%printer_id, plastic_id = %previous_id, "Previous spool no longer exists");
                }
                previous
            }
            _ => None,
        };
        let stranded = self.stranded_models(&printer).await?;

        let mut saga = Saga::new(&self.stores, "install_plastic");
        saga.update_printer(
            &printer,
            recovered(
                &printer,
                PrinterPatch {
                    plastic_id: Some(Some(plastic_id)),
                    status: Some(PrinterStatus::Idle),
                    ..Default::default()
                },
            ),
        )
        .await?;
        saga.update_plastic(&plastic, PlasticPatch::installed_in(printer_id))
            .await?;
        if let Some(previous) = previous {
            saga.update_plastic(&previous, PlasticPatch::released()).await?;
        }
        release_all(&mut saga, &stranded).await?;

        info!(%printer_id, %plastic_id, "Plastic installed");
        Ok(())
    }

    /// Returns the id of the spool that was unloaded.
    #[instrument(skip(self))]
    pub async fn try_remove_plastic(
        &self,
        printer_id: PrinterId,
    ) -> Result<PlasticId, OrchestrationError> {
        let printer = self.printer(printer_id).await?;
        let plastic_id = printer
            .plastic_id
            .ok_or(OrchestrationError::NoPlasticInstalled(printer_id))?;
        if printer.is_printing() {
            return Err(OrchestrationError::PrinterBusy(printer_id));
        }

        let plastic = self.stores.plastics.fetch(plastic_id).await?;
        let stranded = self.stranded_models(&printer).await?;

        let mut saga = Saga::new(&self.stores, "remove_plastic");
        saga.update_printer(
            &printer,
            recovered(
                &printer,
                PrinterPatch {
                    plastic_id: Some(None),
                    status: Some(PrinterStatus::Idle),
                    ..Default::default()
                },
            ),
        )
        .await?;
        match plastic {
            Some(plastic) => {
                saga.update_plastic(&plastic, PlasticPatch::released()).await?;
            }
            None => warn!(%printer_id, %plastic_id, "Dropped reference to a missing spool"),
        }
        release_all(&mut saga, &stranded).await?;

        info!(%printer_id, %plastic_id, "Plastic removed");
        Ok(plastic_id)
    }

    // =========================================================================
    // Job operations
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn try_add_model_to_printer(
        &self,
        printer_id: PrinterId,
        model_id: ModelId,
    ) -> Result<Placement, OrchestrationError> {
        let printer = self.printer(printer_id).await?;
        let model = self.model(model_id).await?;
        if model.status == ModelStatus::Printing {
            return Err(OrchestrationError::ModelAlreadyPrinting(model_id));
        }

        let plastic_id = printer
            .plastic_id
            .ok_or(OrchestrationError::NoPlasticInstalled(printer_id))?;
        let plastic = self.plastic(plastic_id).await?;
        if plastic.length < model.perimeter_length {
            return Err(OrchestrationError::InsufficientPlastic {
                required: model.perimeter_length,
                available: plastic.length,
            });
        }

        let mut saga = Saga::new(&self.stores, "add_model_to_printer");
        saga.update_model(
            &model,
            ModelPatch {
                status: Some(ModelStatus::Printing),
                printer_id: Some(Some(printer_id)),
                queued_at: Some(Some(Utc::now())),
                ..Default::default()
            },
        )
        .await?;

        if printer.is_printing() {
            info!(%printer_id, %model_id, "Model queued");
            return Ok(Placement::Queued);
        }

        saga.update_printer(
            &printer,
            PrinterPatch {
                current_model_id: Some(Some(model_id)),
                status: Some(PrinterStatus::Printing),
                printing_progress: Some(Some(0)),
                ..Default::default()
            },
        )
        .await?;
        info!(%printer_id, %model_id, "Print started");
        Ok(Placement::Started)
    }

    #[instrument(skip(self))]
    pub async fn print_queue(&self, printer_id: PrinterId) -> Result<PrintQueue, OrchestrationError> {
        let printer = self.printer(printer_id).await?;
        let pending = self.pending_models(&printer).await?;
        Ok(PrintQueue {
            printer_id,
            active: printer.current_model_id,
            pending,
        })
    }

    /// Moves the active job forward by `step` percent, completing it at 100.
    #[instrument(skip(self))]
    pub async fn advance_progress(
        &self,
        printer_id: PrinterId,
        step: u8,
    ) -> Result<PrintProgress, OrchestrationError> {
        let printer = self.printer(printer_id).await?;
        if !printer.is_printing() {
            return Err(OrchestrationError::NotPrinting(printer_id));
        }
        let model_id = printer
            .current_model_id
            .ok_or(OrchestrationError::NoActiveJob(printer_id))?;

        let progress = printer
            .printing_progress
            .unwrap_or(0)
            .saturating_add(step)
            .min(100);
        if progress < 100 {
            self.stores
                .printers
                .update(
                    printer_id,
                    PrinterPatch {
                        printing_progress: Some(Some(progress)),
                        ..Default::default()
                    },
                )
                .await?;
            debug!(%printer_id, progress, "Progress");
            return Ok(PrintProgress::Running(progress));
        }

        self.complete_job(printer, model_id).await
    }

    /// Finishes the active job: stamps the model, spends filament and promotes
    /// the next queued model that still fits on the spool.
    async fn complete_job(
        &self,
        printer: Printer,
        model_id: ModelId,
    ) -> Result<PrintProgress, OrchestrationError> {
        let printer_id = printer.id;
        let model = self.model(model_id).await?;
        let plastic_id = printer
            .plastic_id
            .ok_or(OrchestrationError::NoPlasticInstalled(printer_id))?;
        let plastic = self.plastic(plastic_id).await?;
        let remaining = (plastic.length - model.perimeter_length).max(0.0);

        let (fits, too_long): (Vec<_>, Vec<_>) = self
            .pending_models(&printer)
            .await?
            .into_iter()
            .partition(|m| m.perimeter_length <= remaining);
        let next = fits.first().map(|m| m.id);

        let mut saga = Saga::new(&self.stores, "complete_job");
        let completed = saga
            .update_model(
                &model,
                ModelPatch {
                    status: Some(ModelStatus::Completed),
                    plastic_color: Some(Some(plastic.color.clone())),
                    ..Default::default()
                },
            )
            .await?;
        saga.update_plastic(
            &plastic,
            PlasticPatch {
                length: Some(remaining),
                ..Default::default()
            },
        )
        .await?;
        for waiting in &too_long {
            warn!(%printer_id, model_id = %waiting.id, remaining, "Not enough plastic left, releasing model");
            saga.update_model(waiting, ModelPatch::released()).await?;
        }

        let printer_patch = match next {
            Some(next_id) => PrinterPatch {
                current_model_id: Some(Some(next_id)),
                printing_progress: Some(Some(0)),
                ..Default::default()
            },
            None => PrinterPatch {
                status: Some(PrinterStatus::Idle),
                current_model_id: Some(None),
                printing_progress: Some(None),
                ..Default::default()
            },
        };
        saga.update_printer(&printer, printer_patch).await?;

        info!(%printer_id, %model_id, remaining, next = ?next, "Print finished");
        Ok(PrintProgress::Finished {
            model: completed,
            next,
        })
    }

    /// Puts a printing printer into the error state with the fault's message.
    #[instrument(skip(self))]
    pub async fn apply_fault(
        &self,
        printer_id: PrinterId,
        fault: &PrinterFault,
    ) -> Result<Printer, OrchestrationError> {
        let printer = self.printer(printer_id).await?;
        if !printer.is_printing() {
            return Err(OrchestrationError::NotPrinting(printer_id));
        }
        let printer = self
            .stores
            .printers
            .update(
                printer_id,
                PrinterPatch {
                    status: Some(PrinterStatus::Error),
                    error_message: Some(Some(fault.message.clone())),
                    ..Default::default()
                },
            )
            .await?;
        warn!(%printer_id, model_id = %fault.model_id, kind = ?fault.kind, "Printer fault");
        Ok(printer)
    }

    /// Clears an error and returns every model on the printer to `created`.
    #[instrument(skip(self))]
    pub async fn reset_printer(&self, printer_id: PrinterId) -> Result<Printer, OrchestrationError> {
        let printer = self.printer(printer_id).await?;
        if printer.status != PrinterStatus::Error {
            return Err(OrchestrationError::NotInError(printer_id));
        }
        let assigned = self.stranded_models(&printer).await?;

        let mut saga = Saga::new(&self.stores, "reset_printer");
        let reset = saga
            .update_printer(
                &printer,
                recovered(
                    &printer,
                    PrinterPatch {
                        status: Some(PrinterStatus::Idle),
                        ..Default::default()
                    },
                ),
            )
            .await?;
        release_all(&mut saga, &assigned).await?;

        info!(%printer_id, released = assigned.len(), "Printer reset");
        Ok(reset)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    async fn printer(&self, id: PrinterId) -> Result<Printer, OrchestrationError> {
        self.stores
            .printers
            .fetch(id)
            .await?
            .ok_or(OrchestrationError::PrinterNotFound(id))
    }

    async fn plastic(&self, id: PlasticId) -> Result<Plastic, OrchestrationError> {
        self.stores
            .plastics
            .fetch(id)
            .await?
            .ok_or(OrchestrationError::PlasticNotFound(id))
    }

    async fn model(&self, id: ModelId) -> Result<PrintModel, OrchestrationError> {
        self.stores
            .models
            .fetch(id)
            .await?
            .ok_or(OrchestrationError::ModelNotFound(id))
    }

    /// Models still printing on a faulted printer. Empty unless it is in error.
    async fn stranded_models(&self, printer: &Printer) -> Result<Vec<PrintModel>, OrchestrationError> {
        if printer.status != PrinterStatus::Error {
            return Ok(Vec::new());
        }
        Ok(self
            .stores
            .models
            .list()
            .await?
            .into_iter()
            .filter(|m| m.is_assigned_to(printer.id))
            .collect())
    }

    /// Models waiting on `printer`, ordered by queue time then id.
    async fn pending_models(&self, printer: &Printer) -> Result<Vec<PrintModel>, OrchestrationError> {
        let mut pending: Vec<PrintModel> = self
            .stores
            .models
            .list()
            .await?
            .into_iter()
            .filter(|m| m.is_assigned_to(printer.id) && Some(m.id) != printer.current_model_id)
            .collect();
        pending.sort_by(by_queue_position);
        Ok(pending)
    }
}

/// Adds the error cleanup to `patch` when `printer` is faulted, so a printer
/// leaving the error state never keeps the fault or the abandoned job.
fn recovered(printer: &Printer, mut patch: PrinterPatch) -> PrinterPatch {
    if printer.status == PrinterStatus::Error {
        patch.error_message = Some(None);
        patch.current_model_id = Some(None);
        patch.printing_progress = Some(Some(0));
    }
    patch
}

async fn release_all(saga: &mut Saga<'_>, models: &[PrintModel]) -> Result<(), OrchestrationError> {
    for model in models {
        saga.update_model(model, ModelPatch::released()).await?;
    }
    Ok(())
}

/// Unstamped models (written before queue times existed) sort first.
fn by_queue_position(a: &PrintModel, b: &PrintModel) -> Ordering {
    a.queued_at.cmp(&b.queued_at).then(a.id.cmp(&b.id))
}

/// Logs a refusal and drops the reason.
fn soft<T>(operation: &'static str, result: Result<T, OrchestrationError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation, error = %e, "Operation refused");
            None
        }
    }
}
