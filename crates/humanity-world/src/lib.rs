//! Cities, buildings, and jobs for the Humanity simulation.
//!
//! This crate owns the shared, capacity-bounded resources that agents
//! contend for every hour: apartments in residential buildings and slots
//! in job vacancies.
//!
//! # Architecture
//!
//! - [`building`] -- [`Building`]: resident set behind a per-building lock.
//! - [`job`] -- [`Job`] and [`Vacancy`]: slot counters behind a per-job lock.
//! - [`registry`] -- [`World`]: immutable registry plus [`WorldBuilder`].
//! - [`starting_cities`] -- Default city templates and world construction.
//! - [`error`] -- [`WorldError`] for construction failures.
//!
//! # Locking discipline
//!
//! Every mutating operation takes the exclusive lock of the entity it
//! touches; probes take the shared lock. Operations spanning two entities
//! (a resident moving between buildings, a worker switching jobs) lock both
//! in ascending id order. No lock outlives a single set or map mutation.

pub mod building;
pub mod error;
pub mod job;
pub mod registry;
pub mod starting_cities;

pub use building::{Building, Coordinates};
pub use error::WorldError;
pub use job::{Job, Vacancy};
pub use registry::{City, VacancySpec, World, WorldBuilder};
pub use starting_cities::{Band, BuildingTemplate, CityTemplate, build_world, default_templates};
