//! The human agent and its per-entity state.
//!
//! A [`Human`] holds everything that belongs to one agent. Money is the one
//! exception: balances live in the shared [`humanity_ledger::Ledger`] so
//! that relatives can support each other during the parallel phase without
//! touching each other's structs. Relationships are id-keyed maps into the
//! roster, never references.

use std::collections::{BTreeMap, BTreeSet};

use humanity_types::{
    AgentId, BuildingId, CityId, Gender, GlobalTargetId, JobId, MaritalStatus, TagSet, VacancyId,
};
use humanity_world::Vacancy;

use crate::config::LifecycleRules;
use crate::goals::GoalProgress;
use crate::splash::{Splash, SplashKind};

/// The job an agent currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Employment {
    /// Vacancy occupied.
    pub vacancy: VacancyId,
    /// Job owning the vacancy.
    pub job: JobId,
    /// Workplace building.
    pub building: BuildingId,
    /// Monthly payment of the vacancy.
    pub payment: i64,
}

impl Employment {
    /// Employment in `vacancy` at `building`.
    pub const fn in_vacancy(vacancy: &Vacancy, building: BuildingId) -> Self {
        Self {
            vacancy: vacancy.id,
            job: vacancy.job,
            building,
            payment: vacancy.payment,
        }
    }
}

/// Relationship maps: related agent -> relationship duration in years.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relations {
    /// Mother and father.
    pub parents: BTreeMap<AgentId, f64>,
    /// Sons and daughters.
    pub children: BTreeMap<AgentId, f64>,
    /// Spouse and other close family.
    pub family: BTreeMap<AgentId, f64>,
    /// Friends.
    pub friends: BTreeMap<AgentId, f64>,
}

impl Relations {
    /// Add `years` to every relationship duration.
    pub fn age_all(&mut self, years: f64) {
        for map in [
            &mut self.parents,
            &mut self.children,
            &mut self.family,
            &mut self.friends,
        ] {
            for duration in map.values_mut() {
                *duration += years;
            }
        }
    }

    /// Family, children, and parents, without duplicates.
    pub fn kin(&self) -> BTreeSet<AgentId> {
        self.family
            .keys()
            .chain(self.children.keys())
            .chain(self.parents.keys())
            .copied()
            .collect()
    }

    /// Family, then children, then parents, in that order.
    pub fn supporters(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.family
            .keys()
            .chain(self.children.keys())
            .chain(self.parents.keys())
            .copied()
    }
}

/// One simulated person.
#[derive(Debug, Clone)]
pub struct Human {
    /// Roster index and ledger account.
    pub id: AgentId,
    /// Gender category.
    pub gender: Gender,
    /// Age in years.
    pub age: f64,
    /// Marital status; `Married` iff `spouse` is set.
    pub marital_status: MaritalStatus,
    /// Spouse, mutated only in the serialized phase.
    pub spouse: Option<AgentId>,
    /// Whether the agent is pregnant.
    pub pregnant: bool,
    /// Hours since conception.
    pub pregnancy_hours: u32,
    /// Terminal flag. Dead agents stay in the roster.
    pub dead: bool,
    /// Hours left on the action in progress.
    pub busy_hours: u32,
    /// Current job, if any.
    pub employment: Option<Employment>,
    /// Hours at the current job, or the unemployed sentinel.
    pub job_hours: u32,
    /// City the agent lives and works in.
    pub home_city: CityId,
    /// Where the agent is this hour.
    pub current_building: Option<BuildingId>,
    /// Where the agent lives.
    pub residence: Option<BuildingId>,
    /// Relationships.
    pub relations: Relations,
    /// Active transient needs.
    pub splashes: Vec<Splash>,
    /// Active long-term goals with per-agent progress.
    pub goals: Vec<GoalProgress>,
    /// Goals already achieved, in completion order.
    pub completed_goals: Vec<GlobalTargetId>,
    /// Inventory: item name -> count.
    pub items: BTreeMap<String, i64>,
}

impl Human {
    /// A new, single, unemployed human.
    pub fn new(id: AgentId, gender: Gender, age: f64, home_city: CityId, rules: &LifecycleRules) -> Self {
        Self {
            id,
            gender,
            age,
            marital_status: MaritalStatus::Single,
            spouse: None,
            pregnant: false,
            pregnancy_hours: 0,
            dead: false,
            busy_hours: 0,
            employment: None,
            job_hours: rules.unemployed_job_hours,
            home_city,
            current_building: None,
            residence: None,
            relations: Relations::default(),
            splashes: Vec::new(),
            goals: Vec::new(),
            completed_goals: Vec::new(),
            items: BTreeMap::new(),
        }
    }

    /// Whether the agent is alive.
    pub const fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Whether the agent holds a job.
    pub const fn is_employed(&self) -> bool {
        self.employment.is_some()
    }

    /// Whether the agent is married.
    pub fn is_married(&self) -> bool {
        self.marital_status == MaritalStatus::Married
    }

    /// Monthly pay, or 0 when unemployed.
    pub fn payment(&self) -> i64 {
        self.employment.map_or(0, |e| e.payment)
    }

    /// Workplace building, if employed.
    pub fn work_building(&self) -> Option<BuildingId> {
        self.employment.map(|e| e.building)
    }

    /// Age above which this agent dies.
    pub const fn death_age(&self, rules: &LifecycleRules) -> f64 {
        match self.gender {
            Gender::Male => rules.death_age_male,
            Gender::Female => rules.death_age_female,
        }
    }

    /// Whether the inventory holds at least one `item`.
    pub fn holds(&self, item: &str) -> bool {
        self.items.get(item).is_some_and(|count| *count > 0)
    }

    /// Attach a splash of `kind` appearing at `hour`.
    pub fn add_splash(&mut self, kind: SplashKind, tags: TagSet, hour: u64) {
        self.splashes.push(Splash {
            kind,
            tags,
            appeared_at: hour,
            lifetime: kind.lifetime_hours(),
        });
    }

    /// Whether a splash of `kind` is active.
    pub fn has_splash(&self, kind: SplashKind) -> bool {
        self.splashes.iter().any(|s| s.kind == kind)
    }

    /// Active global targets.
    pub fn active_goal_ids(&self) -> impl Iterator<Item = GlobalTargetId> + '_ {
        self.goals.iter().map(|g| g.target)
    }

    /// Number of active global targets shared with `other`.
    pub fn shared_goals(&self, other: &Self) -> usize {
        let mine: BTreeSet<GlobalTargetId> = self.active_goal_ids().collect();
        other.active_goal_ids().filter(|id| mine.contains(id)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human(id: u32) -> Human {
        Human::new(
            AgentId::new(id),
            Gender::Female,
            30.0,
            CityId::new(0),
            &LifecycleRules::default(),
        )
    }

    #[test]
    fn new_human_is_single_and_jobless() {
        let h = human(0);
        assert!(h.is_alive());
        assert!(!h.is_employed());
        assert!(!h.is_married());
        assert_eq!(h.job_hours, 721);
        assert_eq!(h.payment(), 0);
    }

    #[test]
    fn relations_age_together() {
        let mut relations = Relations::default();
        relations.friends.insert(AgentId::new(1), 0.0);
        relations.parents.insert(AgentId::new(2), 3.0);
        relations.age_all(0.5);
        let years = |map: &BTreeMap<AgentId, f64>, id| map.get(&AgentId::new(id)).copied().unwrap_or(f64::NAN);
        assert!((years(&relations.friends, 1) - 0.5).abs() < f64::EPSILON);
        assert!((years(&relations.parents, 2) - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn kin_deduplicates_and_excludes_friends() {
        let mut relations = Relations::default();
        relations.family.insert(AgentId::new(1), 0.0);
        relations.children.insert(AgentId::new(1), 0.0);
        relations.parents.insert(AgentId::new(2), 0.0);
        relations.friends.insert(AgentId::new(3), 0.0);
        let kin: Vec<_> = relations.kin().into_iter().collect();
        assert_eq!(kin, vec![AgentId::new(1), AgentId::new(2)]);
    }

    #[test]
    fn death_age_depends_on_gender() {
        let rules = LifecycleRules::default();
        let mut h = human(0);
        assert!((h.death_age(&rules) - 78.0).abs() < f64::EPSILON);
        h.gender = Gender::Male;
        assert!((h.death_age(&rules) - 68.0).abs() < f64::EPSILON);
    }

    #[test]
    fn shared_goals_counts_common_targets() {
        let mut a = human(0);
        let mut b = human(1);
        for id in [0, 1, 2] {
            a.goals.push(GoalProgress::new(GlobalTargetId::new(id)));
        }
        for id in [1, 2, 5] {
            b.goals.push(GoalProgress::new(GlobalTargetId::new(id)));
        }
        assert_eq!(a.shared_goals(&b), 2);
    }
}
