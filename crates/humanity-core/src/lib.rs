//! Hour clock, scheduler, and population manager for the Humanity
//! simulation.
//!
//! This crate owns the hourly cycle: a parallel phase in which every living
//! agent runs its lifecycle, a barrier, and a serialized phase in which
//! agents are linked to each other.
//!
//! # Modules
//!
//! - [`clock`] -- Hour counter with day, month, workday, work and rest
//!   windows derived from the calendar.
//! - [`config`] -- YAML configuration loaded into strongly-typed structs.
//! - [`population`] -- The serialized phase: friendship, marriage,
//!   acquaintances, births, layoffs.
//! - [`scheduler`] -- [`Simulation`] and the hourly cycle on a rayon pool.
//! - [`runner`] -- Bounded loop with a per-hour callback.
//! - [`stats`] -- [`PopulationStats`] computed from the roster.
//!
//! [`Simulation`]: scheduler::Simulation
//! [`PopulationStats`]: stats::PopulationStats

pub mod clock;
pub mod config;
pub mod population;
pub mod runner;
pub mod scheduler;
pub mod stats;

pub use clock::{ClockError, HourClock};
pub use config::{CalendarConfig, ConfigError, PopulationConfig, RunConfig, SimulationConfig};
pub use population::{PopulationManager, PopulationReport};
pub use runner::{EndReason, HourCallback, NoOpCallback, RunnerError, SimulationResult, log_simulation_end, run};
pub use scheduler::{HourSummary, SchedulerError, Simulation};
pub use stats::PopulationStats;
