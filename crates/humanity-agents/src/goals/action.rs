//! Actions: the atomic, priced steps agents take towards their goals.

use std::collections::BTreeMap;
use std::str::FromStr;

use humanity_types::{ActionId, TagSet};

use crate::error::RuleError;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// A quantity derived from the acting agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Own balance plus the balances of close family.
    Cash,
    /// Hours at the current job.
    JobTime,
}

/// One side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// A natural-number literal.
    Literal(i64),
    /// A per-agent metric.
    Metric(Metric),
}

impl FromStr for Operand {
    type Err = RuleError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "cash" => Ok(Self::Metric(Metric::Cash)),
            "job_time" => Ok(Self::Metric(Metric::JobTime)),
            _ if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => text
                .parse()
                .ok()
                .map(Self::Literal)
                .ok_or_else(|| RuleError::UnknownOperand(text.to_owned())),
            _ => Err(RuleError::UnknownOperand(text.to_owned())),
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl Comparison {
    /// Operators in matching order: two-character forms first.
    const MATCH_ORDER: [(&'static str, Self); 6] = [
        ("<>", Self::Ne),
        (">=", Self::Ge),
        ("<=", Self::Le),
        (">", Self::Gt),
        ("<", Self::Lt),
        ("=", Self::Eq),
    ];

    /// Apply the operator.
    pub const fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

/// A comparison that must hold for an action to be eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Left operand.
    pub lhs: Operand,
    /// Operator.
    pub op: Comparison,
    /// Right operand.
    pub rhs: Operand,
}

impl Rule {
    /// Whether `text` contains a comparison operator at all.
    pub fn is_comparison(text: &str) -> bool {
        Comparison::MATCH_ORDER.iter().any(|(symbol, _)| text.contains(symbol))
    }

    /// Evaluate against an agent's metrics.
    pub const fn holds(&self, subject: &Eligibility<'_>) -> bool {
        self.op.holds(subject.resolve(self.lhs), subject.resolve(self.rhs))
    }
}

impl FromStr for Rule {
    type Err = RuleError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (symbol, op) = Comparison::MATCH_ORDER
            .iter()
            .find(|(symbol, _)| text.contains(symbol))
            .copied()
            .ok_or_else(|| RuleError::Malformed(text.to_owned()))?;
        let (lhs, rhs) = text
            .split_once(symbol)
            .filter(|(_, rhs)| !rhs.contains(symbol))
            .ok_or_else(|| RuleError::Malformed(text.to_owned()))?;
        Ok(Self {
            lhs: lhs.parse()?,
            op,
            rhs: rhs.parse()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Named side effect run after an action is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    /// No side effect.
    None,
    /// Run a job search.
    FindJob,
    /// Queue an acquaintance for the serialized phase.
    MeetNewPerson,
    /// Buy an apartment in the home city if homeless.
    BuyApartment,
}

impl ActionEffect {
    /// Effect tied to an action name.
    pub fn for_name(name: &str) -> Self {
        match name {
            "find_job" => Self::FindJob,
            "meet_new_person" => Self::MeetNewPerson,
            "buy_apartment" => Self::BuyApartment,
            _ => Self::None,
        }
    }
}

/// What an action's eligibility check reads from the acting agent.
#[derive(Debug, Clone, Copy)]
pub struct Eligibility<'a> {
    /// Own balance plus close family balances.
    pub cash: i64,
    /// Hours at the current job.
    pub job_hours: i64,
    /// Inventory.
    pub items: &'a BTreeMap<String, i64>,
}

impl Eligibility<'_> {
    const fn resolve(&self, operand: Operand) -> i64 {
        match operand {
            Operand::Literal(value) => value,
            Operand::Metric(Metric::Cash) => self.cash,
            Operand::Metric(Metric::JobTime) => self.job_hours,
        }
    }

    fn count(&self, item: &str) -> i64 {
        self.items.get(item).copied().unwrap_or(0)
    }
}

/// An action template, shared by every agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Catalog id.
    pub id: ActionId,
    /// Unique name.
    pub name: String,
    /// Debited when applied.
    pub price: i64,
    /// Hours the agent is busy, including the hour it is applied.
    pub duration: u32,
    /// Credited when applied.
    pub bonus: i64,
    /// Tags the action covers.
    pub tags: TagSet,
    /// Comparisons that must hold.
    pub rules: Vec<Rule>,
    /// Minimum counts of items that must be held.
    pub required_items: BTreeMap<String, i64>,
    /// Items removed when applied. Must be held.
    pub consumed_items: BTreeMap<String, i64>,
    /// Items added when applied.
    pub produced_items: BTreeMap<String, i64>,
    /// Side effect.
    pub effect: ActionEffect,
}

impl Action {
    /// Whether every rule holds and every required or consumed item is held.
    pub fn is_feasible(&self, subject: &Eligibility<'_>) -> bool {
        self.rules.iter().all(|rule| rule.holds(subject))
            && self
                .required_items
                .iter()
                .chain(&self.consumed_items)
                .all(|(item, needed)| subject.count(item) >= *needed)
    }

    /// Add produced items and remove consumed ones. Keys that drop to zero
    /// or below are deleted.
    pub fn apply_items(&self, items: &mut BTreeMap<String, i64>) {
        for (item, count) in &self.produced_items {
            let held = items.entry(item.clone()).or_insert(0);
            *held = held.saturating_add(*count);
        }
        for (item, count) in &self.consumed_items {
            if let Some(held) = items.get_mut(item) {
                *held = held.saturating_sub(*count);
                if *held <= 0 {
                    items.remove(item);
                }
            }
        }
    }
}
