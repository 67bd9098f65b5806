//! Death by old age and settlement of the estate.
//!
//! Dying is split in two. [`die`] runs in the parallel phase: the job slot
//! returns to its vacancy and the agent leaves its residence without
//! selling it. [`settle`] runs in the serialized phase, once every task of
//! the hour has finished, so that relatives who died in the same hour are
//! already marked dead and inherit nothing.
//!
//! A positive balance is split equally among living relatives. Whatever
//! the split cannot place (the rounding remainder, or all of it when nobody
//! is left) leaves the economy through [`Ledger::close_account`]. A
//! negative balance is written off the same way.

use std::collections::BTreeSet;

use tracing::debug;

use humanity_ledger::{Flow, Ledger};
use humanity_types::AgentId;
use humanity_world::World;

use crate::config::LifecycleRules;
use crate::human::Human;
use crate::roster::Roster;

/// Money movements caused by one death.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estate {
    /// The agent who died.
    pub agent: AgentId,
    /// Age at death in years, truncated.
    pub final_age: u32,
    /// Living relatives who received a share.
    pub heirs: BTreeSet<AgentId>,
    /// Total paid to heirs.
    pub inherited: i64,
    /// Balance zeroed when the account closed. Negative for written-off debt.
    pub closed_with: i64,
}

/// Whether the agent has outlived its gender's death age.
pub fn is_due(human: &Human, rules: &LifecycleRules) -> bool {
    human.is_alive() && human.age > human.death_age(rules)
}

/// Living family, children, and parents of `human`.
pub fn living_heirs(human: &Human, roster: &Roster) -> BTreeSet<AgentId> {
    human
        .relations
        .kin()
        .into_iter()
        .filter(|id| *id != human.id && roster.get(*id).is_some_and(Human::is_alive))
        .collect()
}

/// Pay equal shares of a positive balance to `heirs`. Returns the total paid.
pub fn distribute(agent: AgentId, heirs: &BTreeSet<AgentId>, ledger: &Ledger) -> i64 {
    let balance = ledger.balance(agent);
    let count = i64::try_from(heirs.len()).unwrap_or(i64::MAX);
    let Some(share) = balance.checked_div(count) else {
        return 0;
    };
    if share <= 0 {
        return 0;
    }
    heirs
        .iter()
        .map(|heir| ledger.transfer_up_to(agent, *heir, share, Flow::Inheritance))
        .fold(0, i64::saturating_add)
}

/// Kill the agent and free its job and home.
///
/// Returns `false` when the agent was already dead. The money stays on the
/// account until [`settle`].
pub fn die(human: &mut Human, world: &World) -> bool {
    if human.dead {
        return false;
    }
    if let Some(employment) = human.employment.take() {
        world.release(employment.vacancy);
    }
    if let Some(building) = human.residence.and_then(|id| world.building(id)) {
        building.remove_resident(human.id);
    }

    human.dead = true;
    human.busy_hours = 0;
    human.pregnant = false;
    human.pregnancy_hours = 0;
    human.current_building = None;
    true
}

/// Split the estate of a dead agent among its living heirs and close the
/// account.
///
/// Must run after every agent's death for the hour has been recorded.
/// Returns `None` when the agent is unknown or still alive.
pub fn settle(roster: &Roster, agent: AgentId) -> Option<Estate> {
    let human = roster.get(agent).filter(|h| h.dead)?;
    let ledger = roster.ledger();
    let heirs = living_heirs(human, roster);
    let inherited = distribute(agent, &heirs, ledger);
    let closed_with = ledger.close_account(agent);

    let estate = Estate {
        agent,
        final_age: age_years(human.age),
        heirs,
        inherited,
        closed_with,
    };
    debug!(
        agent = %estate.agent,
        age = estate.final_age,
        heirs = estate.heirs.len(),
        inherited = estate.inherited,
        closed_with = estate.closed_with,
        "Agent died"
    );
    Some(estate)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn age_years(age: f64) -> u32 {
    age.clamp(0.0, f64::from(u32::MAX)) as u32
}
