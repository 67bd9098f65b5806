//! The serialized phase: everything that links two agents.
//!
//! Runs single-threaded after the parallel phase, in a fixed order:
//!
//! 1. estates of agents who died this hour, split among the kin still
//!    alive after the barrier, then widowing of their spouses;
//! 2. friendship and marriage among co-located agents (skipped at rest);
//! 3. acquaintances requested by `meet_new_person` actions;
//! 4. births of due pregnancies;
//! 5. layoffs.
//!
//! All randomness comes from the one generator the scheduler owns for this
//! phase.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use humanity_agents::death;
use humanity_agents::family::{self, Newborn};
use humanity_agents::layoff::{self, LayoffCause};
use humanity_agents::{AgentRules, Catalog, Estate, HourOutcome, Moment, Roster, SocialRules};
use humanity_types::{AgentId, BuildingId, Gender};
use humanity_world::World;

use crate::config::PopulationConfig;

/// What the serialized phase did in one hour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationReport {
    /// Estates of agents who died this hour.
    pub deaths: Vec<Estate>,
    /// Spouses widowed by this hour's deaths.
    pub widowed: u32,
    /// New friendship links.
    pub friendships: u32,
    /// New marriages.
    pub marriages: u32,
    /// Friendships formed through `meet_new_person`.
    pub acquaintances: u32,
    /// Children born.
    pub births: Vec<AgentId>,
    /// Employees laid off, with the deciding cause.
    pub layoffs: Vec<(AgentId, LayoffCause)>,
}

/// Shared inputs of the serialized phase.
#[derive(Debug, Clone, Copy)]
pub struct PopulationManager<'a> {
    /// Calendar facts of the hour being closed.
    pub moment: Moment,
    /// Behaviour parameters.
    pub rules: &'a AgentRules,
    /// Newborn gender split and goal counts.
    pub population: &'a PopulationConfig,
    /// Goal templates.
    pub catalog: &'a Catalog,
    /// Buildings and jobs.
    pub world: &'a World,
}

impl PopulationManager<'_> {
    /// Run the whole serialized phase for one hour.
    pub fn run(
        &self,
        roster: &mut Roster,
        outcomes: &[(AgentId, HourOutcome)],
        rng: &mut impl Rng,
    ) -> PopulationReport {
        let deaths = settle_estates(roster, outcomes);
        let mut report = PopulationReport {
            widowed: widow_survivors(roster, &deaths),
            deaths,
            ..PopulationReport::default()
        };

        if !self.moment.rest {
            report.friendships = form_friendships(roster, &self.rules.social, rng);
            report.marriages = form_marriages(roster, self.world, &self.rules.social, rng);
        }

        for (id, outcome) in outcomes {
            if outcome.wants_acquaintance && introduce(roster, *id, rng).is_some() {
                report.acquaintances = report.acquaintances.saturating_add(1);
            }
        }

        report.births = self.deliver_births(roster, rng);
        report.layoffs = self.lay_off(roster, rng);
        report
    }

    /// Deliver every pregnancy that reached term.
    pub fn deliver_births(&self, roster: &mut Roster, rng: &mut impl Rng) -> Vec<AgentId> {
        let due: Vec<AgentId> = roster
            .humans()
            .iter()
            .filter(|h| family::is_due(h, &self.rules.family))
            .map(|h| h.id)
            .collect();

        due.into_iter()
            .filter_map(|mother| {
                let male = rng.random_bool(self.population.male_probability.clamp(0.0, 1.0));
                let newborn = Newborn {
                    gender: if male { Gender::Male } else { Gender::Female },
                    goals: self.catalog.sample_goals(
                        rng,
                        self.population.min_goals,
                        self.population.max_goals,
                    ),
                };
                family::deliver(roster, mother, newborn, self.rules, self.catalog, self.moment.hour)
            })
            .collect()
    }

    /// Roll layoffs for every living employee.
    pub fn lay_off(&self, roster: &mut Roster, rng: &mut impl Rng) -> Vec<(AgentId, LayoffCause)> {
        let employees: Vec<AgentId> = roster
            .alive()
            .filter(|h| h.is_employed())
            .map(|h| h.id)
            .collect();

        let mut fired = Vec::new();
        for id in employees {
            let Some(human) = roster.get_mut(id) else {
                continue;
            };
            let Some(cause) = layoff::evaluate(human, &self.rules.layoff, rng) else {
                continue;
            };
            if layoff::fire(human, self.world, self.catalog, &self.rules.lifecycle, self.moment.hour) {
                debug!(agent = %id, cause = cause.name(), "Layoff");
                fired.push((id, cause));
            }
        }
        fired
    }
}

// ---------------------------------------------------------------------------
// Links between agents
// ---------------------------------------------------------------------------

/// Living agents grouped by the building they are in right now.
pub fn co_located(roster: &Roster) -> BTreeMap<BuildingId, Vec<AgentId>> {
    let mut groups: BTreeMap<BuildingId, Vec<AgentId>> = BTreeMap::new();
    for human in roster.alive() {
        if let Some(building) = human.current_building {
            groups.entry(building).or_default().push(human.id);
        }
    }
    groups
}

/// Link `a` and `b` as friends with a fresh duration. Returns `false` if
/// either is unknown or they are the same agent.
pub fn befriend(roster: &mut Roster, a: AgentId, b: AgentId) -> bool {
    let Some((first, second)) = roster.pair_mut(a, b) else {
        return false;
    };
    first.relations.friends.insert(b, 0.0);
    second.relations.friends.insert(a, 0.0);
    true
}

/// Every unlinked co-located pair becomes friends with the configured
/// probability. Returns the number of new links.
pub fn form_friendships(roster: &mut Roster, rules: &SocialRules, rng: &mut impl Rng) -> u32 {
    let probability = rules.friendship_probability.clamp(0.0, 1.0);
    let mut formed: u32 = 0;
    for members in co_located(roster).values() {
        for (position, &a) in members.iter().enumerate() {
            for &b in members.iter().skip(position.saturating_add(1)) {
                let linked = roster.get(a).is_some_and(|h| h.relations.friends.contains_key(&b));
                if linked || !rng.random_bool(probability) {
                    continue;
                }
                if befriend(roster, a, b) {
                    formed = formed.saturating_add(1);
                }
            }
        }
    }
    formed
}

/// Compatible co-located singles marry with the configured probability.
/// Returns the number of weddings.
pub fn form_marriages(roster: &mut Roster, world: &World, rules: &SocialRules, rng: &mut impl Rng) -> u32 {
    let probability = rules.marriage_probability.clamp(0.0, 1.0);
    let mut weddings: u32 = 0;
    for members in co_located(roster).values() {
        for (position, &a) in members.iter().enumerate() {
            for &b in members.iter().skip(position.saturating_add(1)) {
                let compatible = match (roster.get(a), roster.get(b)) {
                    (Some(x), Some(y)) => family::is_compatible(x, y, rules),
                    _ => false,
                };
                if !compatible || !rng.random_bool(probability) {
                    continue;
                }
                let married = roster
                    .pair_with_ledger(a, b)
                    .is_some_and(|(x, y, ledger)| family::marry(x, y, world, ledger));
                if married {
                    weddings = weddings.saturating_add(1);
                }
            }
        }
    }
    weddings
}

/// Befriend a random living stranger from the requester's home city.
/// Returns the new friend, if anyone was available.
pub fn introduce(roster: &mut Roster, requester: AgentId, rng: &mut impl Rng) -> Option<AgentId> {
    let candidates: Vec<AgentId> = {
        let human = roster.get(requester).filter(|h| h.is_alive())?;
        roster
            .alive()
            .filter(|other| {
                other.id != requester
                    && other.home_city == human.home_city
                    && !human.relations.friends.contains_key(&other.id)
            })
            .map(|other| other.id)
            .collect()
    };
    let stranger = *candidates.choose(rng)?;
    befriend(roster, requester, stranger).then_some(stranger)
}

/// Settle the estate of everyone who died this hour, in id order.
pub fn settle_estates(roster: &Roster, outcomes: &[(AgentId, HourOutcome)]) -> Vec<Estate> {
    outcomes
        .iter()
        .filter(|(_, outcome)| outcome.died)
        .filter_map(|(id, _)| death::settle(roster, *id))
        .collect()
}

/// Clear the spouse links of agents whose spouse died this hour.
fn widow_survivors(roster: &mut Roster, deaths: &[Estate]) -> u32 {
    let mut widowed: u32 = 0;
    for estate in deaths {
        let Some(spouse) = roster.get(estate.agent).and_then(|h| h.spouse) else {
            continue;
        };
        let cleared = roster
            .pair_mut(estate.agent, spouse)
            .is_some_and(|(dead, survivor)| family::divorce(dead, survivor));
        if cleared {
            debug!(agent = %spouse, spouse = %estate.agent, "Widowed");
            widowed = widowed.saturating_add(1);
        }
    }
    widowed
}
