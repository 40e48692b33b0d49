//! Typed identifiers.
//!
//! Each collection gets its own id newtype so a `PlasticId` can never be passed
//! where a `PrinterId` is expected. On the wire they are bare integers.

use crate::framework::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl EntityId for $name {
            fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

entity_id!(
    /// Type-safe identifier for Printers.
    PrinterId,
    "printer"
);
entity_id!(
    /// Type-safe identifier for Plastic spools.
    PlasticId,
    "plastic"
);
entity_id!(
    /// Type-safe identifier for print Models.
    ModelId,
    "model"
);
