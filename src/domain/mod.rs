//! Entities stored by the fleet: printers, plastic spools and print models.
//!
//! Each entity implements [`Resource`](crate::framework::Resource) together with
//! its creation draft and its partial-update patch.

pub mod ids;
pub mod patch;
pub mod plastic;
pub mod print_model;
pub mod printer;

pub use ids::*;
pub use plastic::*;
pub use print_model::*;
pub use printer::*;
