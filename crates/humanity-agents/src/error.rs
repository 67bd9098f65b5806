//! Errors raised while building goal catalogs and rosters.
//!
//! Nothing in the hourly update returns an error: failed hires, purchases,
//! and marriages are plain `false` outcomes. These errors belong to
//! startup, before the first hour runs.

use thiserror::Error;

/// Why a rule expression like `cash>=1000` could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// No comparison operator, or an operand on one side is missing.
    #[error("malformed comparison `{0}`")]
    Malformed(String),

    /// An operand is neither a natural number nor a known metric.
    #[error("unknown operand `{0}` (expected a natural number, `cash`, or `job_time`)")]
    UnknownOperand(String),
}

/// Invalid goal or action templates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    /// Two templates of the same kind share a name.
    #[error("duplicate {kind} `{name}`")]
    DuplicateName {
        /// Template kind ("action", "local target", "global target").
        kind: &'static str,
        /// The repeated name.
        name: String,
    },

    /// A template lists no tags, so it could never cover anything.
    #[error("{kind} `{name}` has no tags")]
    EmptyTags {
        /// Template kind.
        kind: &'static str,
        /// Template name.
        name: String,
    },

    /// A global target power is negative or not finite.
    #[error("global target `{name}` has invalid power {power}")]
    InvalidPower {
        /// Template name.
        name: String,
        /// The rejected power.
        power: f64,
    },

    /// An action has a negative price or a zero duration.
    #[error("action `{name}`: {reason}")]
    InvalidAction {
        /// Action name.
        name: String,
        /// What is wrong.
        reason: &'static str,
    },

    /// An action rule failed to parse.
    #[error("action `{action}`: {source}")]
    InvalidRule {
        /// Action name.
        action: String,
        /// Parse failure.
        #[source]
        source: RuleError,
    },

    /// More distinct tags or templates than the id types can address.
    #[error("too many {entity} in the catalog")]
    Overflow {
        /// What overflowed.
        entity: &'static str,
    },
}

/// Errors raised while populating a roster.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Agent ids are exhausted.
    #[error("roster is full")]
    RosterFull,

    /// A goal name given to a new agent is not in the catalog.
    #[error("unknown global target `{0}`")]
    UnknownGoal(String),

    /// Catalog failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
