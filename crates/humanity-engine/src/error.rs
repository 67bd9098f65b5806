//! Error types for the simulation binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode during startup and the run itself.

use std::path::PathBuf;

use crate::templates::TemplateError;

/// Top-level error for the simulation binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: humanity_core::ConfigError,
    },

    /// Hour clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: humanity_core::ClockError,
    },

    /// City construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: humanity_world::WorldError,
    },

    /// A template file could not be read or parsed.
    #[error("template error: {source}")]
    Template {
        /// The underlying template error.
        #[from]
        source: TemplateError,
    },

    /// Templates parsed but do not form a valid catalog.
    #[error("catalog error in {}: {source}", dir.display())]
    Catalog {
        /// Template directory.
        dir: PathBuf,
        /// The underlying catalog error.
        source: humanity_agents::CatalogError,
    },

    /// The initial population could not be created.
    #[error("spawner error: {source}")]
    Spawner {
        /// The underlying agent error.
        #[from]
        source: humanity_agents::AgentError,
    },

    /// The worker pool could not be built.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: humanity_core::SchedulerError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: humanity_core::RunnerError,
    },

    /// The CSV log could not be created.
    #[error("failed to open CSV log {}: {source}", path.display())]
    Csv {
        /// Path of the log.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The final report could not be written.
    #[error("failed to write report: {source}")]
    Report {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
