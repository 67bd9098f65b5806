//! The hourly cycle: a parallel phase over every living agent, a barrier,
//! and a serialized phase for everything that links two agents.
//!
//! 1. **Snapshot** -- read the calendar, the money supply, and an immutable
//!    [`RosterView`] of every agent.
//! 2. **Parallel phase** -- one task per living agent runs
//!    [`iterate_hour`] on a fixed-size rayon pool. Tasks mutate only their
//!    own agent, the registries (per-entity locks), and the ledger (atomic
//!    accounts). The end of `install` is the barrier.
//! 3. **Serialized phase** -- estates and widowing, friendships, marriages,
//!    acquaintances, births, and layoffs through the [`PopulationManager`].
//! 4. **Audit** -- the money supply must have moved exactly by the recorded
//!    flows; a mismatch is logged as a warning.
//! 5. **Advance** -- the clock moves to the next hour.
//!
//! Contention between tasks is resolved by lock order, so which of two
//! agents wins the last slot of a vacancy is not reproducible. Everything
//! else is: each task seeds its own generator from the run seed, the hour,
//! and the agent id.
//!
//! [`RosterView`]: humanity_agents::RosterView

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use humanity_agents::{
    AgentRules, Catalog, Completion, Estate, HourContext, HourOutcome, JobChange, Roster, iterate_hour,
};
use humanity_ledger::{ConservationResult, LedgerAnomaly, verify_conservation};
use humanity_types::AgentId;
use humanity_world::World;

use crate::clock::{ClockError, HourClock};
use crate::config::PopulationConfig;
use crate::population::PopulationManager;

/// Errors that can occur while building or stepping the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {source}")]
    Pool {
        /// The underlying rayon error.
        #[from]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Summary of one simulated hour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourSummary {
    /// The hour that was executed.
    pub hour: u64,
    /// Living agents at the end of the hour.
    pub alive: u32,
    /// Estates of agents who died this hour.
    pub deaths: Vec<Estate>,
    /// Children born this hour.
    pub births: Vec<AgentId>,
    /// Spouses widowed this hour.
    pub widowed: u32,
    /// New friendship links among co-located agents.
    pub friendships: u32,
    /// Friendships formed through `meet_new_person`.
    pub acquaintances: u32,
    /// New marriages.
    pub marriages: u32,
    /// Unemployed agents hired.
    pub hires: u32,
    /// Employees who moved to another vacancy.
    pub switches: u32,
    /// Employees laid off.
    pub layoffs: u32,
    /// Actions performed.
    pub actions: u32,
    /// Global targets completed.
    pub completed_goals: u32,
    /// Apartments bought.
    pub homes_bought: u32,
    /// Unrecorded money movement, if the audit found one.
    pub anomaly: Option<LedgerAnomaly>,
}

impl HourSummary {
    fn tally(&mut self, outcomes: &[(AgentId, HourOutcome)]) {
        for (_, outcome) in outcomes {
            match outcome.job_change {
                JobChange::None => {}
                JobChange::Hired => self.hires = self.hires.saturating_add(1),
                JobChange::Switched => self.switches = self.switches.saturating_add(1),
            }
            self.actions = self.actions.saturating_add(u32::from(outcome.action.is_some()));
            self.homes_bought = self.homes_bought.saturating_add(u32::from(outcome.bought_home));
            if outcome.completion == Some(Completion::GlobalTarget) {
                self.completed_goals = self.completed_goals.saturating_add(1);
            }
        }
    }
}

/// Everything the hourly cycle reads and mutates.
#[derive(Debug)]
pub struct Simulation {
    /// Current hour and calendar.
    pub clock: HourClock,
    /// Buildings and jobs.
    pub world: World,
    /// Agents and their money.
    pub roster: Roster,
    /// Goal templates.
    pub catalog: Catalog,
    /// Behaviour parameters.
    pub rules: AgentRules,
    /// Newborn parameters.
    pub population: PopulationConfig,
    seed: u64,
    pool: ThreadPool,
    rng: StdRng,
}

impl Simulation {
    /// Assemble a simulation.
    ///
    /// `threads == 0` lets rayon pick one worker per core.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Pool`] if the worker pool cannot start.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: HourClock,
        world: World,
        roster: Roster,
        catalog: Catalog,
        rules: AgentRules,
        population: PopulationConfig,
        seed: u64,
        threads: usize,
    ) -> Result<Self, SchedulerError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("humanity-worker-{index}"))
            .build()?;
        info!(threads = pool.current_num_threads(), seed, "Worker pool ready");
        Ok(Self {
            clock,
            world,
            roster,
            catalog,
            rules,
            population,
            seed,
            pool,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// The run seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Execute one hour and advance the clock.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Clock`] if the hour counter overflows.
    pub fn step(&mut self) -> Result<HourSummary, SchedulerError> {
        // --- Snapshot ---
        let moment = self.clock.moment();
        let hour = moment.hour;
        let view = self.roster.view();
        let total_before = self.roster.ledger().total();

        // --- Parallel phase ---
        let seed = self.seed;
        let (humans, ledger) = self.roster.split_mut();
        let ctx = HourContext {
            moment,
            rules: &self.rules,
            catalog: &self.catalog,
            world: &self.world,
            ledger,
            view: &view,
        };
        let outcomes: Vec<(AgentId, HourOutcome)> = self.pool.install(|| {
            humans
                .par_iter_mut()
                .filter(|human| human.is_alive())
                .map(|human| {
                    let mut rng = StdRng::seed_from_u64(task_seed(seed, hour, human.id));
                    (human.id, iterate_hour(human, &ctx, &mut rng))
                })
                .collect()
        });

        // --- Serialized phase ---
        let manager = PopulationManager {
            moment,
            rules: &self.rules,
            population: &self.population,
            catalog: &self.catalog,
            world: &self.world,
        };
        let report = manager.run(&mut self.roster, &outcomes, &mut self.rng);

        // --- Audit ---
        let flows = self.roster.ledger().drain_flows();
        let total_after = self.roster.ledger().total();
        let anomaly = match verify_conservation(hour, total_before, total_after, &flows) {
            ConservationResult::Balanced => None,
            ConservationResult::Anomaly(anomaly) => {
                warn!(
                    hour,
                    expected = anomaly.expected,
                    actual = anomaly.actual,
                    "{anomaly}"
                );
                Some(anomaly)
            }
        };

        let mut summary = HourSummary {
            hour,
            alive: u32::try_from(self.roster.alive().count()).unwrap_or(u32::MAX),
            widowed: report.widowed,
            friendships: report.friendships,
            acquaintances: report.acquaintances,
            marriages: report.marriages,
            layoffs: u32::try_from(report.layoffs.len()).unwrap_or(u32::MAX),
            births: report.births,
            deaths: report.deaths,
            anomaly,
            ..HourSummary::default()
        };
        summary.tally(&outcomes);

        debug!(
            hour,
            alive = summary.alive,
            deaths = summary.deaths.len(),
            births = summary.births.len(),
            marriages = summary.marriages,
            hires = summary.hires,
            layoffs = summary.layoffs,
            "Hour completed"
        );

        // --- Advance ---
        self.clock.advance()?;
        Ok(summary)
    }
}

/// Seed of one agent's generator for one hour.
fn task_seed(seed: u64, hour: u64, agent: AgentId) -> u64 {
    let mixed = seed
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(hour)
        .rotate_left(29)
        .wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^ u64::from(agent.into_inner()).wrapping_mul(0x94D0_49BB_1331_11EB)
}
