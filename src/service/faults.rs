//! Random printer faults.
//!
//! The generator only decides *whether* and *which* fault happens; applying it
//! to a printer is [`PrinterService::apply_fault`](super::PrinterService::apply_fault).

use crate::config::DEFAULT_FAULT_PROBABILITY;
use crate::domain::ModelId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    PlasticBreak,
    Overheat,
    ModelDetached,
}

impl FaultKind {
    pub const ALL: [FaultKind; 3] = [
        FaultKind::PlasticBreak,
        FaultKind::Overheat,
        FaultKind::ModelDetached,
    ];
}

impl Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FaultKind::PlasticBreak => "Filament break",
            FaultKind::Overheat => "Printer overheated",
            FaultKind::ModelDetached => "Model detached from the bed",
        };
        f.write_str(label)
    }
}

/// A fault raised while printing a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterFault {
    #[serde(rename = "type")]
    pub kind: FaultKind,
    pub message: String,
    pub model_id: ModelId,
    /// Filament left on the spool when the fault happened, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_length: Option<f64>,
}

impl PrinterFault {
    pub fn new(kind: FaultKind, model_id: ModelId) -> Self {
        Self {
            kind,
            message: kind.to_string(),
            model_id,
            remaining_length: None,
        }
    }

    pub fn with_remaining_length(mut self, length: f64) -> Self {
        self.remaining_length = Some(length);
        self
    }
}

/// Draws faults with a fixed probability from a caller-supplied RNG.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultGenerator {
    probability: f64,
}

impl FaultGenerator {
    /// `probability` is clamped to `[0, 1]`.
    pub fn new(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { probability }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// A uniform draw above the probability yields no fault; otherwise one of
    /// [`FaultKind::ALL`] is picked uniformly. A zero probability never faults.
    pub fn draw<R: Rng + ?Sized>(&self, model_id: ModelId, rng: &mut R) -> Option<PrinterFault> {
        if self.probability == 0.0 {
            return None;
        }
        let draw: f64 = rng.gen();
        if draw > self.probability {
            return None;
        }
        let kind = FaultKind::ALL[rng.gen_range(0..FaultKind::ALL.len())];
        Some(PrinterFault::new(kind, model_id))
    }
}

impl Default for FaultGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_FAULT_PROBABILITY)
    }
}
