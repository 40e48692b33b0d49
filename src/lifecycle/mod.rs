//! Starting and stopping the in-process fleet, and log setup.

pub mod fleet_system;
pub mod tracing;

pub use fleet_system::FleetSystem;
pub use self::tracing::setup_tracing;
