//! Per-hour engine callback and the final report.

use std::io::{self, Write};

use humanity_core::{EndReason, HourCallback, HourSummary, PopulationStats, Simulation, SimulationResult};
use tracing::debug;

use crate::csv_log::CsvLog;

/// Hour callback of the binary: feeds the CSV log and logs population
/// statistics at the end of every simulated day.
pub struct EngineCallback<W: Write> {
    csv: Option<CsvLog<W>>,
    days: u64,
}

impl<W: Write> EngineCallback<W> {
    /// A callback writing to `csv` when given.
    pub const fn new(csv: Option<CsvLog<W>>) -> Self {
        Self { csv, days: 0 }
    }

    /// Days completed so far.
    pub const fn days(&self) -> u64 {
        self.days
    }

    /// Flush and hand back the CSV log.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the final flush.
    pub fn finish(self) -> io::Result<Option<W>> {
        self.csv
            .map(|mut csv| -> io::Result<W> {
                csv.flush()?;
                Ok(csv.into_inner())
            })
            .transpose()
    }
}

impl<W: Write> HourCallback for EngineCallback<W> {
    fn on_hour(&mut self, summary: &HourSummary, sim: &Simulation) {
        if let Some(csv) = self.csv.as_mut() {
            csv.record(summary, sim);
        }

        // The clock has already moved past the executed hour.
        if !sim.clock.is_day_start() {
            return;
        }
        self.days = self.days.saturating_add(1);
        let stats = PopulationStats::collect(&sim.roster, summary.hour);
        debug!(
            day = self.days,
            hour = stats.hour,
            alive = stats.alive,
            dead = stats.dead,
            employed = stats.employed,
            married = stats.married,
            children = stats.children,
            pregnant = stats.pregnant,
            born = stats.born,
            average_money = stats.average_money,
            completed_goals = stats.completed_goals,
            friendships = stats.friendships,
            "Day completed"
        );
    }
}

/// Write the end-of-run report: a readable block followed by the final
/// statistics as one JSON line.
///
/// # Errors
///
/// Returns the first I/O error.
pub fn write_report(result: &SimulationResult, out: &mut impl Write) -> io::Result<()> {
    let stats = &result.final_stats;
    let reason = match result.end_reason {
        EndReason::HoursCompleted => "all hours completed",
        EndReason::Extinction => "population extinct",
    };

    writeln!(out, "=== Simulation report ===")?;
    writeln!(out, "end reason:        {reason}")?;
    writeln!(out, "hours run:         {}", result.hours_run)?;
    writeln!(out, "alive / dead:      {} / {}", stats.alive, stats.dead)?;
    writeln!(
        out,
        "employed:          {} ({:.1}%)",
        stats.employed,
        stats.employment_rate() * 100.0
    )?;
    writeln!(out, "married:           {}", stats.married)?;
    writeln!(out, "children:          {}", stats.children)?;
    writeln!(out, "pregnant:          {}", stats.pregnant)?;
    writeln!(out, "born during run:   {}", stats.born)?;
    writeln!(out, "average money:     {:.2}", stats.average_money)?;
    writeln!(out, "completed goals:   {}", stats.completed_goals)?;
    writeln!(out, "friendships:       {}", stats.friendships)?;
    if result.anomalies > 0 {
        writeln!(out, "ledger anomalies:  {}", result.anomalies)?;
    }
    let json = serde_json::to_string(stats).map_err(io::Error::other)?;
    writeln!(out, "{json}")?;
    Ok(())
}
