//! Human state, hourly lifecycle, and goal planning for the Humanity
//! simulation.
//!
//! This crate is the logic layer for agents. It operates on a [`Human`]
//! plus the shared registries and ledger, and never does I/O. The
//! scheduler in `humanity-core` drives it: [`iterate_hour`] in the parallel
//! phase, the [`family`] and [`layoff`] operations in the serialized one.
//!
//! # Modules
//!
//! - [`config`] -- Behaviour parameters ([`AgentRules`])
//! - [`death`] -- Death by old age and estate settlement ([`Estate`])
//! - [`error`] -- Error types ([`AgentError`], [`CatalogError`])
//! - [`family`] -- Marriage, divorce, pregnancy, birth, family support
//! - [`goals`] -- Global targets, local targets, actions, and the planner
//! - [`human`] -- The per-agent state ([`Human`])
//! - [`job_market`] -- Job search and better-offer switching
//! - [`layoff`] -- Additive firing probabilities ([`LayoffCause`])
//! - [`lifecycle`] -- The fixed-order hourly update ([`iterate_hour`])
//! - [`roster`] -- The agent arena and its hourly snapshot ([`Roster`])
//! - [`splash`] -- Transient tagged needs ([`Splash`])

pub mod config;
pub mod death;
pub mod error;
pub mod family;
pub mod goals;
pub mod human;
pub mod job_market;
pub mod layoff;
pub mod lifecycle;
pub mod roster;
pub mod splash;

// Re-export primary types at crate root for convenience.
pub use config::{
    AgentRules, EconomyRules, FamilyCoefficientWeights, FamilyRules, JobMarketRules, LayoffRules,
    LifecycleRules, SocialRules,
};
pub use death::Estate;
pub use error::{AgentError, CatalogError, RuleError};
pub use family::Newborn;
pub use goals::{ActionSpec, Catalog, Completion, GlobalTargetSpec, GoalProgress, LocalTargetSpec};
pub use human::{Employment, Human, Relations};
pub use job_market::JobChange;
pub use layoff::LayoffCause;
pub use lifecycle::{HourContext, HourOutcome, Moment, iterate_hour};
pub use roster::{AgentSnapshot, Roster, RosterView};
pub use splash::{Splash, SplashKind};
