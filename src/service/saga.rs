//! Compensating writes for multi-entity operations.
//!
//! Each successful write records a patch restoring the entity's previous
//! orchestration fields. When a later write fails the recorded patches are
//! applied newest first.

use super::OrchestrationError;
use crate::clients::FleetStores;
use crate::domain::{
    ModelId, ModelPatch, PlasticId, PlasticPatch, PrintModel, Plastic, Printer, PrinterId,
    PrinterPatch,
};
use crate::framework::StoreError;
use tracing::{error, warn};

enum Undo {
    Printer(PrinterId, PrinterPatch),
    Plastic(PlasticId, PlasticPatch),
    Model(ModelId, ModelPatch),
}

impl Undo {
    async fn apply(self, stores: &FleetStores) -> Result<(), StoreError> {
        match self {
            Undo::Printer(id, patch) => stores.printers.update(id, patch).await.map(|_| ()),
            Undo::Plastic(id, patch) => stores.plastics.update(id, patch).await.map(|_| ()),
            Undo::Model(id, patch) => stores.models.update(id, patch).await.map(|_| ()),
        }
    }
}

pub(crate) struct Saga<'a> {
    stores: &'a FleetStores,
    operation: &'static str,
    undo: Vec<Undo>,
}

impl<'a> Saga<'a> {
    pub(crate) fn new(stores: &'a FleetStores, operation: &'static str) -> Self {
        Self {
            stores,
            operation,
            undo: Vec::new(),
        }
    }

    pub(crate) async fn update_printer(
        &mut self,
        before: &Printer,
        patch: PrinterPatch,
    ) -> Result<Printer, OrchestrationError> {
        match self.stores.printers.update(before.id, patch).await {
            Ok(printer) => {
                self.undo
                    .push(Undo::Printer(before.id, PrinterPatch::restoring(before)));
                Ok(printer)
            }
            Err(e) => Err(self.abort(e).await),
        }
    }

    pub(crate) async fn update_plastic(
        &mut self,
        before: &Plastic,
        patch: PlasticPatch,
    ) -> Result<Plastic, OrchestrationError> {
        match self.stores.plastics.update(before.id, patch).await {
            Ok(plastic) => {
                self.undo
                    .push(Undo::Plastic(before.id, PlasticPatch::restoring(before)));
                Ok(plastic)
            }
            Err(e) => Err(self.abort(e).await),
        }
    }

    pub(crate) async fn update_model(
        &mut self,
        before: &PrintModel,
        patch: ModelPatch,
    ) -> Result<PrintModel, OrchestrationError> {
        match self.stores.models.update(before.id, patch).await {
            Ok(model) => {
                self.undo.push(Undo::Model(before.id, ModelPatch::restoring(before)));
                Ok(model)
            }
            Err(e) => Err(self.abort(e).await),
        }
    }

    /// Undoes every recorded write. All undo patches are attempted even if one fails.
    async fn abort(&mut self, cause: StoreError) -> OrchestrationError {
        let operation = self.operation;
        warn!(operation, error = %cause, steps = self.undo.len(), "Write failed, rolling back");

        let mut failed = None;
        while let Some(undo) = self.undo.pop() {
            if let Err(e) = undo.apply(self.stores).await {
                error!(operation, error = %e, "Rollback write failed");
                failed.get_or_insert(e);
            }
        }

        match failed {
            Some(e) => OrchestrationError::Inconsistent { operation, cause: e },
            None => OrchestrationError::Store(cause),
        }
    }
}
