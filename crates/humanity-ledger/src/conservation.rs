//! Money conservation check for one simulated hour.
//!
//! Internal flows (family support, inheritance) move money between accounts
//! and cannot change the total. Everything else is a source or a sink, so
//! for every hour:
//!
//! ```text
//! total_after == total_before + sources - sinks
//! ```
//!
//! A mismatch means some balance changed without being recorded, which is
//! a bookkeeping defect, not a simulation outcome.

use crate::ledger::FlowTotals;

/// A money-supply mismatch detected for one hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// The hour in which the mismatch was detected.
    pub hour: u64,
    /// Total the flows predict.
    pub expected: i64,
    /// Total actually held by the accounts.
    pub actual: i64,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "LEDGER_ANOMALY at hour {}: expected money supply {}, found {}",
            self.hour, self.expected, self.actual
        )
    }
}

/// The result of a conservation check for a single hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// The money supply moved exactly as the recorded flows say.
    Balanced,
    /// The money supply moved by an unrecorded amount.
    Anomaly(LedgerAnomaly),
}

/// Compare the money supply before and after an hour against its flows.
pub fn verify_conservation(
    hour: u64,
    total_before: i64,
    total_after: i64,
    flows: &FlowTotals,
) -> ConservationResult {
    let expected = total_before
        .saturating_add(flows.sources())
        .saturating_sub(flows.sinks());
    if expected == total_after {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(LedgerAnomaly {
            hour,
            expected,
            actual: total_after,
        })
    }
}
