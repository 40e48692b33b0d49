//! Printer orchestration: spool changes, job placement, progress, faults and resets.

pub mod error;
pub mod faults;
pub mod printer_service;
mod saga;
pub mod simulation;

pub use error::*;
pub use faults::*;
pub use printer_service::*;
pub use simulation::*;
