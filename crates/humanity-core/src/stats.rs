//! Population statistics computed from the roster.

use serde::Serialize;

use humanity_agents::Roster;

/// Age below which an agent counts as a child.
pub const ADULT_AGE: f64 = 18.0;

/// A snapshot of the population at one hour.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulationStats {
    /// Hour the snapshot was taken at.
    pub hour: u64,
    /// Living agents.
    pub alive: u32,
    /// Dead agents.
    pub dead: u32,
    /// Living agents holding a job.
    pub employed: u32,
    /// Living married agents.
    pub married: u32,
    /// Living agents younger than [`ADULT_AGE`].
    pub children: u32,
    /// Living pregnant agents.
    pub pregnant: u32,
    /// Agents born during the run, dead or alive.
    pub born: u32,
    /// Mean balance of the living, in whole currency units.
    pub average_money: f64,
    /// Global targets completed by all agents.
    pub completed_goals: u32,
    /// Friendship links, counting each pair once.
    pub friendships: u32,
}

impl PopulationStats {
    /// Count everything at `hour`.
    pub fn collect(roster: &Roster, hour: u64) -> Self {
        let mut stats = Self {
            hour,
            ..Self::default()
        };
        let mut money: i64 = 0;
        let mut friend_ends: usize = 0;

        for human in roster.humans() {
            if !human.relations.parents.is_empty() {
                stats.born = stats.born.saturating_add(1);
            }
            stats.completed_goals = stats.completed_goals.saturating_add(count(human.completed_goals.len()));
            if !human.is_alive() {
                stats.dead = stats.dead.saturating_add(1);
                continue;
            }
            stats.alive = stats.alive.saturating_add(1);
            stats.employed = stats.employed.saturating_add(u32::from(human.is_employed()));
            stats.married = stats.married.saturating_add(u32::from(human.is_married()));
            stats.children = stats.children.saturating_add(u32::from(human.age < ADULT_AGE));
            stats.pregnant = stats.pregnant.saturating_add(u32::from(human.pregnant));
            money = money.saturating_add(roster.balance(human.id));
            friend_ends = friend_ends.saturating_add(human.relations.friends.len());
        }

        stats.friendships = count(friend_ends.checked_div(2).unwrap_or(0));
        stats.average_money = mean(money, stats.alive);
        stats
    }

    /// Share of the living who are employed, in `[0, 1]`.
    pub fn employment_rate(&self) -> f64 {
        if self.alive == 0 {
            0.0
        } else {
            f64::from(self.employed) / f64::from(self.alive)
        }
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[allow(clippy::cast_precision_loss)]
fn mean(total: i64, people: u32) -> f64 {
    if people == 0 {
        0.0
    } else {
        total as f64 / f64::from(people)
    }
}
