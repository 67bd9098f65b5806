//! The money ledger: one signed account per agent.
//!
//! Accounts are atomic so that the parallel per-agent phase can move money
//! between relatives without locking the roster. Every balance change is
//! tagged with a [`Flow`] and accumulated into per-flow totals, which the
//! scheduler drains once per hour for the conservation check.
//!
//! # Design
//!
//! - **Signed**: balances may go negative (debt).
//! - **Total**: no operation fails; unknown accounts are ignored.
//! - **Capped transfers**: a pull never takes more than the donor holds.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::Serialize;

use humanity_types::AgentId;

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Number of distinct [`Flow`] kinds.
const FLOW_KINDS: usize = 10;

/// Whether a flow creates, destroys, or moves money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    /// Money enters the population.
    Source,
    /// Money leaves the population.
    Sink,
    /// Money moves between two accounts.
    Internal,
}

/// Category of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Monthly salary from an employer.
    Salary,
    /// Daily living expense, including the per-child surcharge.
    LivingExpense,
    /// Price paid to perform an action.
    ActionPrice,
    /// Bonus paid out by an action.
    ActionBonus,
    /// Apartment bought from the city.
    ApartmentPurchase,
    /// Apartment sold back to the city.
    ApartmentSale,
    /// Relative covering another relative's debt.
    FamilySupport,
    /// Share of an estate paid to an heir.
    Inheritance,
    /// Positive balance left on a closed account.
    EstateRemainder,
    /// Negative balance forgiven when an account is closed.
    DebtWriteOff,
}

impl Flow {
    /// Every flow kind, in declaration order.
    pub const ALL: [Self; FLOW_KINDS] = [
        Self::Salary,
        Self::LivingExpense,
        Self::ActionPrice,
        Self::ActionBonus,
        Self::ApartmentPurchase,
        Self::ApartmentSale,
        Self::FamilySupport,
        Self::Inheritance,
        Self::EstateRemainder,
        Self::DebtWriteOff,
    ];

    /// How the flow affects the population-wide money supply.
    pub const fn direction(self) -> FlowDirection {
        match self {
            Self::Salary | Self::ActionBonus | Self::ApartmentSale | Self::DebtWriteOff => {
                FlowDirection::Source
            }
            Self::LivingExpense
            | Self::ActionPrice
            | Self::ApartmentPurchase
            | Self::EstateRemainder => FlowDirection::Sink,
            Self::FamilySupport | Self::Inheritance => FlowDirection::Internal,
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Accumulated amounts per flow kind over some interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowTotals {
    /// Amount per flow, indexed in [`Flow::ALL`] order.
    amounts: [i64; FLOW_KINDS],
}

impl FlowTotals {
    /// Amount recorded for one flow.
    pub fn get(&self, flow: Flow) -> i64 {
        self.amounts.get(flow.slot()).copied().unwrap_or(0)
    }

    /// Sum of all source flows.
    pub fn sources(&self) -> i64 {
        self.sum_where(FlowDirection::Source)
    }

    /// Sum of all sink flows.
    pub fn sinks(&self) -> i64 {
        self.sum_where(FlowDirection::Sink)
    }

    /// Add another interval's totals into this one.
    pub fn absorb(&mut self, other: &Self) {
        for (mine, theirs) in self.amounts.iter_mut().zip(other.amounts) {
            *mine = mine.saturating_add(theirs);
        }
    }

    fn sum_where(&self, direction: FlowDirection) -> i64 {
        Flow::ALL
            .iter()
            .filter(|flow| flow.direction() == direction)
            .map(|flow| self.get(*flow))
            .fold(0, i64::saturating_add)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Money accounts for every agent in the roster, indexed by [`AgentId`].
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: Vec<AtomicI64>,
    flows: [AtomicI64; FLOW_KINDS],
}

impl Ledger {
    /// Create a ledger with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the next account with an opening balance and return its id.
    ///
    /// Opening balances are genesis money and are not recorded as a flow.
    /// Returns `None` once the id space is exhausted.
    pub fn open_account(&mut self, opening: i64) -> Option<AgentId> {
        let id = AgentId::from_index(self.accounts.len())?;
        self.accounts.push(AtomicI64::new(opening));
        Some(id)
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the ledger has no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Current balance, or 0 for an unknown account.
    pub fn balance(&self, id: AgentId) -> i64 {
        self.account(id).map_or(0, |a| a.load(Ordering::Relaxed))
    }

    /// Add money to an account.
    pub fn credit(&self, id: AgentId, amount: i64, flow: Flow) {
        if let Some(account) = self.account(id) {
            account.fetch_add(amount, Ordering::Relaxed);
            self.record(flow, amount);
        }
    }

    /// Remove money from an account. The balance may go negative.
    pub fn debit(&self, id: AgentId, amount: i64, flow: Flow) {
        if let Some(account) = self.account(id) {
            account.fetch_sub(amount, Ordering::Relaxed);
            self.record(flow, amount);
        }
    }

    /// Move up to `cap` from `from` to `to`, never taking more than `from`
    /// holds. Returns the amount moved (0 if the donor is not positive).
    pub fn transfer_up_to(&self, from: AgentId, to: AgentId, cap: i64, flow: Flow) -> i64 {
        if cap <= 0 || from == to {
            return 0;
        }
        let (Some(donor), Some(recipient)) = (self.account(from), self.account(to)) else {
            return 0;
        };
        let taken = donor.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |balance| {
            (balance > 0).then(|| balance.saturating_sub(cap.min(balance)))
        });
        let Ok(previous) = taken else {
            return 0;
        };
        let moved = cap.min(previous);
        recipient.fetch_add(moved, Ordering::Relaxed);
        self.record(flow, moved);
        moved
    }

    /// Zero an account and return what it held.
    ///
    /// A positive remainder is recorded as [`Flow::EstateRemainder`], a
    /// negative one as [`Flow::DebtWriteOff`].
    pub fn close_account(&self, id: AgentId) -> i64 {
        let Some(account) = self.account(id) else {
            return 0;
        };
        let remainder = account.swap(0, Ordering::Relaxed);
        if remainder > 0 {
            self.record(Flow::EstateRemainder, remainder);
        } else if remainder < 0 {
            self.record(Flow::DebtWriteOff, remainder.saturating_neg());
        }
        remainder
    }

    /// Sum of all balances.
    pub fn total(&self) -> i64 {
        self.accounts
            .iter()
            .map(|a| a.load(Ordering::Relaxed))
            .fold(0, i64::saturating_add)
    }

    /// Return the flow totals accumulated since the last drain and reset
    /// them to zero.
    pub fn drain_flows(&self) -> FlowTotals {
        let mut totals = FlowTotals::default();
        for (slot, counter) in totals.amounts.iter_mut().zip(&self.flows) {
            *slot = counter.swap(0, Ordering::Relaxed);
        }
        totals
    }

    fn account(&self, id: AgentId) -> Option<&AtomicI64> {
        self.accounts.get(id.index())
    }

    fn record(&self, flow: Flow, amount: i64) {
        if let Some(counter) = self.flows.get(flow.slot()) {
            counter.fetch_add(amount, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use rayon::prelude::*;

    use super::*;

    fn ledger_with(balances: &[i64]) -> (Ledger, Vec<AgentId>) {
        let mut ledger = Ledger::new();
        let ids = balances
            .iter()
            .filter_map(|b| ledger.open_account(*b))
            .collect();
        (ledger, ids)
    }

    #[test]
    fn accounts_get_sequential_ids() {
        let (ledger, ids) = ledger_with(&[10, 20, 30]);
        assert_eq!(ids, vec![AgentId::new(0), AgentId::new(1), AgentId::new(2)]);
        assert_eq!(ledger.total(), 60);
    }

    #[test]
    fn debit_may_go_negative() {
        let (ledger, ids) = ledger_with(&[100]);
        let id = ids.first().copied().unwrap_or(AgentId::new(0));
        ledger.debit(id, 500, Flow::LivingExpense);
        assert_eq!(ledger.balance(id), -400);
        assert_eq!(ledger.drain_flows().get(Flow::LivingExpense), 500);
    }

    #[test]
    fn transfer_is_capped_by_donor_balance() {
        let (ledger, _) = ledger_with(&[300, -1000]);
        let moved = ledger.transfer_up_to(AgentId::new(0), AgentId::new(1), 1000, Flow::FamilySupport);
        assert_eq!(moved, 300);
        assert_eq!(ledger.balance(AgentId::new(0)), 0);
        assert_eq!(ledger.balance(AgentId::new(1)), -700);
        assert_eq!(ledger.total(), -700);
    }

    #[test]
    fn transfer_from_indebted_donor_moves_nothing() {
        let (ledger, _) = ledger_with(&[-5, 10]);
        let moved = ledger.transfer_up_to(AgentId::new(0), AgentId::new(1), 50, Flow::FamilySupport);
        assert_eq!(moved, 0);
        assert_eq!(ledger.balance(AgentId::new(0)), -5);
    }

    #[test]
    fn close_account_classifies_remainder() {
        let (ledger, _) = ledger_with(&[42, -17]);
        assert_eq!(ledger.close_account(AgentId::new(0)), 42);
        assert_eq!(ledger.close_account(AgentId::new(1)), -17);
        let flows = ledger.drain_flows();
        assert_eq!(flows.get(Flow::EstateRemainder), 42);
        assert_eq!(flows.get(Flow::DebtWriteOff), 17);
        assert_eq!(ledger.total(), 0);
    }

    #[test]
    fn drain_resets_counters() {
        let (ledger, _) = ledger_with(&[0]);
        ledger.credit(AgentId::new(0), 9, Flow::Salary);
        assert_eq!(ledger.drain_flows().sources(), 9);
        assert_eq!(ledger.drain_flows().sources(), 0);
    }

    #[test]
    fn concurrent_pulls_never_overdraw_the_donor() {
        let mut balances = vec![1_000_i64];
        balances.extend(std::iter::repeat_n(-100, 32));
        let (ledger, _) = ledger_with(&balances);
        (1..=32_u32).into_par_iter().for_each(|i| {
            ledger.transfer_up_to(AgentId::new(0), AgentId::new(i), 100, Flow::FamilySupport);
        });
        assert_eq!(ledger.balance(AgentId::new(0)), 0);
        assert_eq!(ledger.total(), 1_000 - 3_200);
    }

    #[test]
    fn unknown_accounts_are_ignored() {
        let (ledger, _) = ledger_with(&[5]);
        ledger.credit(AgentId::new(99), 10, Flow::Salary);
        assert_eq!(ledger.balance(AgentId::new(99)), 0);
        assert_eq!(ledger.total(), 5);
    }
}
