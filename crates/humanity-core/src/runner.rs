//! Bounded simulation loop.
//!
//! [`run`] steps the [`Simulation`] hour by hour and hands every finished
//! hour to an [`HourCallback`] (the persistence hook) before the next one
//! starts. The loop always runs the requested number of hours, so the
//! callback fires once per hour even after the population dies out.

use tracing::{info, warn};

use crate::scheduler::{HourSummary, SchedulerError, Simulation};
use crate::stats::PopulationStats;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// An hour could not be executed.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: SchedulerError,
    },
}

/// Why the run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The requested number of hours ran.
    HoursCompleted,
    /// Every agent died before the last hour ran.
    Extinction,
}

/// Result of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Number of hours executed.
    pub hours_run: u64,
    /// Summary of the last hour, if any hour ran.
    pub final_summary: Option<HourSummary>,
    /// Population at the end of the run.
    pub final_stats: PopulationStats,
    /// Hours whose money audit failed.
    pub anomalies: u64,
}

/// Callback invoked after each hour completes.
///
/// Receives the hour summary and the simulation as it stands after the
/// serialized phase.
pub trait HourCallback {
    /// Called after an hour completes successfully.
    fn on_hour(&mut self, summary: &HourSummary, sim: &Simulation);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl HourCallback for NoOpCallback {
    fn on_hour(&mut self, _summary: &HourSummary, _sim: &Simulation) {}
}

/// Run up to `hours` hours.
///
/// # Errors
///
/// Returns [`RunnerError`] if an hour cannot be executed.
pub fn run(
    sim: &mut Simulation,
    hours: u64,
    callback: &mut dyn HourCallback,
) -> Result<SimulationResult, RunnerError> {
    info!(
        hours,
        start_hour = sim.clock.hour(),
        agents = sim.roster.len(),
        "Simulation starting"
    );

    let mut last: Option<HourSummary> = None;
    let mut hours_run: u64 = 0;
    let mut anomalies: u64 = 0;
    let mut end_reason = EndReason::HoursCompleted;

    while hours_run < hours {
        let summary = sim.step()?;
        hours_run = hours_run.saturating_add(1);
        if summary.anomaly.is_some() {
            anomalies = anomalies.saturating_add(1);
        }
        callback.on_hour(&summary, sim);

        if summary.alive == 0 && end_reason == EndReason::HoursCompleted {
            info!(hour = summary.hour, "All agents dead");
            end_reason = EndReason::Extinction;
        }
        last = Some(summary);
    }

    Ok(SimulationResult {
        end_reason,
        hours_run,
        final_summary: last,
        final_stats: PopulationStats::collect(&sim.roster, sim.clock.hour()),
        anomalies,
    })
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        hours_run = result.hours_run,
        final_hour = result.final_summary.as_ref().map(|s| s.hour),
        alive = result.final_stats.alive,
        dead = result.final_stats.dead,
        "Simulation ended"
    );
    if result.final_summary.is_none() {
        warn!("Simulation ended with no hours executed");
    }
    if result.anomalies > 0 {
        warn!(hours = result.anomalies, "Money audit failed during the run");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use humanity_agents::{AgentRules, Catalog, LifecycleRules, Roster};
    use humanity_types::{CityId, Gender};
    use humanity_world::World;

    use super::*;
    use crate::clock::HourClock;
    use crate::config::{CalendarConfig, PopulationConfig};

    fn simulation(ages: &[f64]) -> Simulation {
        let mut roster = Roster::new();
        for age in ages {
            roster
                .spawn(Gender::Female, *age, CityId::new(0), 100, &LifecycleRules::default())
                .unwrap();
        }
        Simulation::new(
            HourClock::new(&CalendarConfig::default()).unwrap(),
            World::builder().build(),
            roster,
            Catalog::default(),
            AgentRules::default(),
            PopulationConfig::default(),
            1,
            1,
        )
        .unwrap()
    }

    #[test]
    fn bounded_by_hours() {
        let mut sim = simulation(&[30.0, 31.0]);
        let result = run(&mut sim, 5, &mut NoOpCallback).unwrap();
        assert_eq!(result.end_reason, EndReason::HoursCompleted);
        assert_eq!(result.hours_run, 5);
        assert_eq!(result.final_summary.map(|s| s.hour), Some(4));
        assert_eq!(result.final_stats.alive, 2);
        assert_eq!(result.anomalies, 0);
    }

    struct Hours(Vec<u64>);

    impl HourCallback for Hours {
        fn on_hour(&mut self, summary: &HourSummary, _sim: &Simulation) {
            self.0.push(summary.hour);
        }
    }

    #[test]
    fn extinction_keeps_the_hourly_callback_running() {
        let mut sim = simulation(&[200.0]);
        let mut hours = Hours(Vec::new());
        let result = run(&mut sim, 10, &mut hours).unwrap();
        assert_eq!(result.end_reason, EndReason::Extinction);
        assert_eq!(result.hours_run, 10);
        assert_eq!(result.final_stats.dead, 1);
        assert_eq!(result.final_stats.alive, 0);
        assert_eq!(hours.0, (0..10).collect::<Vec<u64>>());
        assert_eq!(result.final_summary.map(|s| s.alive), Some(0));
    }

    #[test]
    fn callback_sees_every_hour() {
        let mut sim = simulation(&[30.0]);
        let mut hours = Hours(Vec::new());
        let _ = run(&mut sim, 3, &mut hours).unwrap();
        assert_eq!(hours.0, vec![0, 1, 2]);
    }
}
