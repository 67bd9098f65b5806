//! Error types for the `humanity-world` crate.
//!
//! Errors only arise while a world is being assembled. Once built, every
//! registry operation is total and reports refusal with `false`.

use humanity_types::{BuildingId, CityId};

/// Errors that can occur while building cities.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A city id does not exist.
    #[error("city not found: {0}")]
    CityNotFound(CityId),

    /// A building id does not exist.
    #[error("building not found: {0}")]
    BuildingNotFound(BuildingId),

    /// A job was attached to a building that is not a workplace.
    #[error("building {0} is not a workplace")]
    NotAWorkplace(BuildingId),

    /// More entities than the id type can address.
    #[error("too many {entity} to assign ids")]
    IdSpaceExhausted {
        /// Kind of entity that overflowed.
        entity: &'static str,
    },

    /// A city template is inconsistent.
    #[error("invalid template for city {city}: {reason}")]
    InvalidTemplate {
        /// Name of the offending city.
        city: String,
        /// What is wrong with it.
        reason: String,
    },
}
