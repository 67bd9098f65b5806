//! Type-safe identifier wrappers around dense `u32` indices.
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. IDs are assigned
//! sequentially by the registry that owns the entity, so an ID doubles as
//! the entity's position in that registry's arena.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u32` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from its raw value.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the inner raw value.
            pub const fn into_inner(self) -> u32 {
                self.0
            }

            /// Position of the entity in its owning arena.
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Build an identifier from an arena position.
            ///
            /// Returns `None` if the position does not fit in a `u32`.
            pub fn from_index(index: usize) -> Option<Self> {
                u32::try_from(index).ok().map(Self)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a human agent. Doubles as the roster index.
    AgentId
}

define_id! {
    /// Unique identifier for a building (residential, workplace, or civic).
    BuildingId
}

define_id! {
    /// Unique identifier for a city.
    CityId
}

define_id! {
    /// Unique identifier for a job (the set of vacancies at one workplace).
    JobId
}

define_id! {
    /// Identifier of a vacancy, unique across all jobs.
    VacancyId
}

define_id! {
    /// Index of an action template in the goal catalog.
    ActionId
}

define_id! {
    /// Index of a local target template in the goal catalog.
    LocalTargetId
}

define_id! {
    /// Index of a global target template in the goal catalog.
    GlobalTargetId
}
