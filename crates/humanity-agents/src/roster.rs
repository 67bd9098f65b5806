//! The agent arena and its per-hour read snapshot.
//!
//! Agents are addressed by [`AgentId`], which is both their position in the
//! roster and their account in the ledger. Nobody is ever removed: dead
//! agents stay in place so that ids remain stable.

use humanity_ledger::Ledger;
use humanity_types::{AgentId, CityId, Gender};

use crate::config::LifecycleRules;
use crate::error::AgentError;
use crate::human::Human;

/// What a parallel task may read about another agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSnapshot {
    /// Alive at the start of the hour.
    pub alive: bool,
    /// Monthly pay, or 0 when unemployed.
    pub payment: i64,
}

/// Immutable view of every agent, taken before the parallel phase.
#[derive(Debug, Clone, Default)]
pub struct RosterView {
    agents: Vec<AgentSnapshot>,
}

impl RosterView {
    /// Snapshot of one agent.
    pub fn get(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.agents.get(id.index())
    }

    /// Whether the agent was alive at the start of the hour.
    pub fn is_alive(&self, id: AgentId) -> bool {
        self.get(id).is_some_and(|agent| agent.alive)
    }

    /// Monthly pay of the agent, or 0.
    pub fn payment(&self, id: AgentId) -> i64 {
        self.get(id).map_or(0, |agent| agent.payment)
    }
}

/// All agents plus the ledger holding their money.
#[derive(Debug, Default)]
pub struct Roster {
    humans: Vec<Human>,
    ledger: Ledger,
}

impl Roster {
    /// An empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new single, unemployed agent holding `money`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::RosterFull`] when ids are exhausted.
    pub fn spawn(
        &mut self,
        gender: Gender,
        age: f64,
        home_city: CityId,
        money: i64,
        rules: &LifecycleRules,
    ) -> Result<AgentId, AgentError> {
        if AgentId::from_index(self.humans.len()).is_none() {
            return Err(AgentError::RosterFull);
        }
        let id = self.ledger.open_account(money).ok_or(AgentError::RosterFull)?;
        self.humans.push(Human::new(id, gender, age, home_city, rules));
        Ok(id)
    }

    /// Number of agents, dead or alive.
    pub fn len(&self) -> usize {
        self.humans.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.humans.is_empty()
    }

    /// Every agent.
    pub fn humans(&self) -> &[Human] {
        &self.humans
    }

    /// Living agents.
    pub fn alive(&self) -> impl Iterator<Item = &Human> {
        self.humans.iter().filter(|h| h.is_alive())
    }

    /// Look up an agent.
    pub fn get(&self, id: AgentId) -> Option<&Human> {
        self.humans.get(id.index())
    }

    /// Look up an agent mutably.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Human> {
        self.humans.get_mut(id.index())
    }

    /// The money ledger.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Balance of an agent.
    pub fn balance(&self, id: AgentId) -> i64 {
        self.ledger.balance(id)
    }

    /// Agents and ledger at once, for the parallel phase.
    pub fn split_mut(&mut self) -> (&mut [Human], &Ledger) {
        (&mut self.humans, &self.ledger)
    }

    /// Two distinct agents mutably. `None` if the ids are equal or unknown.
    pub fn pair_mut(&mut self, a: AgentId, b: AgentId) -> Option<(&mut Human, &mut Human)> {
        pair_in(&mut self.humans, a, b)
    }

    /// Two distinct agents mutably, plus the ledger.
    pub fn pair_with_ledger(&mut self, a: AgentId, b: AgentId) -> Option<(&mut Human, &mut Human, &Ledger)> {
        let (first, second) = pair_in(&mut self.humans, a, b)?;
        Some((first, second, &self.ledger))
    }

    /// Snapshot for cross-agent reads during the parallel phase.
    pub fn view(&self) -> RosterView {
        RosterView {
            agents: self
                .humans
                .iter()
                .map(|h| AgentSnapshot {
                    alive: h.is_alive(),
                    payment: h.payment(),
                })
                .collect(),
        }
    }
}

fn pair_in(humans: &mut [Human], a: AgentId, b: AgentId) -> Option<(&mut Human, &mut Human)> {
    let (i, j) = (a.index(), b.index());
    if i == j || i >= humans.len() || j >= humans.len() {
        return None;
    }
    let (low, high) = (i.min(j), i.max(j));
    let (head, tail) = humans.split_at_mut(high);
    let first = head.get_mut(low)?;
    let second = tail.first_mut()?;
    if i < j { Some((first, second)) } else { Some((second, first)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: u32) -> Roster {
        let mut roster = Roster::new();
        let rules = LifecycleRules::default();
        for i in 0..n {
            let gender = if i % 2 == 0 { Gender::Male } else { Gender::Female };
            let spawned = roster.spawn(gender, 30.0, CityId::new(0), i64::from(i).saturating_mul(100), &rules);
            assert_eq!(spawned.ok(), Some(AgentId::new(i)));
        }
        roster
    }

    #[test]
    fn ids_match_ledger_accounts() {
        let roster = roster(3);
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.ledger().len(), 3);
        assert_eq!(roster.balance(AgentId::new(2)), 200);
    }

    #[test]
    fn pair_mut_returns_requested_order() {
        let mut roster = roster(4);
        let pair = roster.pair_mut(AgentId::new(3), AgentId::new(1));
        assert_eq!(pair.map(|(a, b)| (a.id, b.id)), Some((AgentId::new(3), AgentId::new(1))));
        assert!(roster.pair_mut(AgentId::new(2), AgentId::new(2)).is_none());
        assert!(roster.pair_mut(AgentId::new(2), AgentId::new(9)).is_none());
    }

    #[test]
    fn view_reflects_deaths() {
        let mut roster = roster(2);
        if let Some(h) = roster.get_mut(AgentId::new(1)) {
            h.dead = true;
        }
        let view = roster.view();
        assert!(view.is_alive(AgentId::new(0)));
        assert!(!view.is_alive(AgentId::new(1)));
        assert_eq!(roster.alive().count(), 1);
        assert_eq!(
            view.get(AgentId::new(1)),
            Some(&AgentSnapshot {
                alive: false,
                payment: 0,
            })
        );
        assert_eq!(view.payment(AgentId::new(0)), 0);
    }
}
