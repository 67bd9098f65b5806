//! The three-level goal hierarchy and its planner.
//!
//! - [`action`] -- [`Action`] templates, eligibility rules, item effects.
//! - [`catalog`] -- [`Catalog`]: shared immutable templates and tags.
//! - [`progress`] -- [`GoalProgress`]: per-agent executed sets.
//! - [`planner`] -- greedy selection with uniform tie-breaks.

pub mod action;
pub mod catalog;
pub mod planner;
pub mod progress;

pub use action::{Action, ActionEffect, Comparison, Eligibility, Metric, Operand, Rule};
pub use catalog::{ActionSpec, Catalog, GlobalTarget, GlobalTargetSpec, LocalTarget, LocalTargetSpec};
pub use planner::{Plan, commit, pick_uniform_max, plan, score};
pub use progress::{Completion, GoalProgress};
