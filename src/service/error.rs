//! Error types for the orchestration service.

use crate::domain::{ModelId, PlasticId, PrinterId};
use crate::framework::StoreError;
use thiserror::Error;

/// Why an orchestration operation was refused or failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrchestrationError {
    #[error("Printer not found: {0}")]
    PrinterNotFound(PrinterId),

    #[error("Plastic not found: {0}")]
    PlasticNotFound(PlasticId),

    #[error("Model not found: {0}")]
    ModelNotFound(ModelId),

    /// Filament cannot be changed while a job runs.
    #[error("{0} is printing")]
    PrinterBusy(PrinterId),

    /// The spool is loaded into another printer (or flagged installed without one).
    #[error("{plastic} is installed in {}", holder.map_or("an unknown printer".to_string(), |p| p.to_string()))]
    PlasticInUse {
        plastic: PlasticId,
        holder: Option<PrinterId>,
    },

    #[error("{0} has no plastic installed")]
    NoPlasticInstalled(PrinterId),

    #[error("Insufficient plastic: model needs {required}, spool has {available}")]
    InsufficientPlastic { required: f64, available: f64 },

    #[error("{0} is already printing")]
    ModelAlreadyPrinting(ModelId),

    #[error("{0} is not printing")]
    NotPrinting(PrinterId),

    #[error("{0} is not in error")]
    NotInError(PrinterId),

    #[error("{0} has no active job")]
    NoActiveJob(PrinterId),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A write failed and undoing the earlier writes failed too.
    #[error("{operation} left the store inconsistent: rollback failed: {cause}")]
    Inconsistent {
        operation: &'static str,
        cause: StoreError,
    },
}
