//! Shared type definitions for the Humanity simulation.
//!
//! This crate is the single source of truth for identifiers and small
//! value types used across the workspace.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe dense-index wrappers for all entity identifiers
//! - [`enums`] -- Gender, marital status, and building kinds
//! - [`tags`] -- Tag interning and bitset tag sets

pub mod enums;
pub mod ids;
pub mod tags;

// Re-export all public types at crate root for convenience.
pub use enums::{BuildingType, Gender, MaritalStatus};
pub use ids::{
    ActionId, AgentId, BuildingId, CityId, GlobalTargetId, JobId, LocalTargetId, VacancyId,
};
pub use tags::{TagId, TagInterner, TagSet};
