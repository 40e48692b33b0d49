//! Interval-driven print simulation for a single printer.

use super::faults::{FaultKind, PrinterFault};
use super::printer_service::{PrintProgress, PrinterService};
use super::OrchestrationError;
use crate::config::FleetConfig;
use crate::domain::{ModelId, PrinterId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// What one simulator tick did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum TickOutcome {
    /// The printer is not printing; nothing to do.
    Idle,
    Faulted { fault: PrinterFault },
    Progressed { progress: u8 },
    Finished { model: ModelId, next: Option<ModelId> },
}

pub struct PrintSimulator {
    service: PrinterService,
    interval: Duration,
    seed: Option<u64>,
}

impl PrintSimulator {
    pub fn new(service: PrinterService, config: &FleetConfig) -> Self {
        Self {
            service,
            interval: config.tick_interval(),
            seed: config.rng_seed(),
        }
    }

    /// Progress gained per tick for a printer rated at `print_speed`.
    pub fn step_for(print_speed: u32) -> u8 {
        (print_speed / 20).clamp(1, 25) as u8
    }

    /// Runs one tick: maybe a fault, otherwise progress on the active job.
    #[instrument(skip(self, rng))]
    pub async fn tick<R: Rng + Send + ?Sized>(
        &self,
        printer_id: PrinterId,
        rng: &mut R,
    ) -> Result<TickOutcome, OrchestrationError> {
        let stores = self.service.stores();
        let printer = stores
            .printers
            .fetch(printer_id)
            .await?
            .ok_or(OrchestrationError::PrinterNotFound(printer_id))?;
        let Some(model_id) = printer.current_model_id.filter(|_| printer.is_printing()) else {
            return Ok(TickOutcome::Idle);
        };

        if let Some(mut fault) = self.service.generate_random_error(model_id, rng) {
            if fault.kind == FaultKind::PlasticBreak {
                if let Some(plastic_id) = printer.plastic_id {
                    if let Some(plastic) = stores.plastics.get_by_id(plastic_id).await {
                        fault = fault.with_remaining_length(plastic.length);
                    }
                }
            }
            self.service.apply_fault(printer_id, &fault).await?;
            return Ok(TickOutcome::Faulted { fault });
        }

        let step = Self::step_for(printer.print_speed);
        match self.service.advance_progress(printer_id, step).await? {
            PrintProgress::Running(progress) => Ok(TickOutcome::Progressed { progress }),
            PrintProgress::Finished { model, next } => Ok(TickOutcome::Finished {
                model: model.id,
                next,
            }),
        }
    }

    /// Ticks `printer_id` on the configured interval until a tick reports
    /// anything other than progress.
    #[instrument(skip(self))]
    pub async fn run(&self, printer_id: PrinterId) -> Result<TickOutcome, OrchestrationError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut ticker = tokio::time::interval(self.interval);
        info!(%printer_id, interval_ms = self.interval.as_millis() as u64, "Simulation started");

        loop {
            ticker.tick().await;
            match self.tick(printer_id, &mut rng).await? {
                TickOutcome::Progressed { progress } => debug!(%printer_id, progress, "Tick"),
                outcome => {
                    info!(%printer_id, ?outcome, "Simulation stopped");
                    return Ok(outcome);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_scales_with_speed() {
        assert_eq!(PrintSimulator::step_for(0), 1);
        assert_eq!(PrintSimulator::step_for(19), 1);
        assert_eq!(PrintSimulator::step_for(100), 5);
        assert_eq!(PrintSimulator::step_for(300), 15);
        assert_eq!(PrintSimulator::step_for(10_000), 25);
    }
}
