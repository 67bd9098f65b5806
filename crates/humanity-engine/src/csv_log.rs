//! Per-agent CSV log.
//!
//! One row per agent, dead or alive, every `every` hours. The header is
//! written on creation.

use std::io::{self, Write};

use humanity_core::{HourSummary, Simulation};
use tracing::warn;

/// Column header of the log.
pub const HEADER: &str = "hour,agent_id,age,gender,alive,money,city,building_type,job_status,marital_status";

/// Writes agent rows at a fixed hour stride.
pub struct CsvLog<W: Write> {
    out: W,
    every: u64,
    failed: bool,
}

impl<W: Write> CsvLog<W> {
    /// Start a log on `out`, writing every `every` hours (at least 1).
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the header cannot be written.
    pub fn new(mut out: W, every: u64) -> io::Result<Self> {
        writeln!(out, "{HEADER}")?;
        Ok(Self {
            out,
            every: every.max(1),
            failed: false,
        })
    }

    /// Whether `hour` falls on the stride.
    pub const fn is_due(&self, hour: u64) -> bool {
        matches!(hour.checked_rem(self.every), Some(0))
    }

    /// Append one row per agent for the hour in `summary`.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error.
    pub fn write_hour(&mut self, summary: &HourSummary, sim: &Simulation) -> io::Result<()> {
        for human in sim.roster.humans() {
            let city = sim
                .world
                .city(human.home_city)
                .map_or("unknown", |city| city.name.as_str());
            let building = human
                .current_building
                .and_then(|id| sim.world.building(id))
                .map_or("none", |building| building.kind.as_str());
            let job = if human.is_employed() { "employed" } else { "unemployed" };
            writeln!(
                self.out,
                "{},{},{:.2},{},{},{},{},{},{},{}",
                summary.hour,
                human.id,
                human.age,
                human.gender,
                human.is_alive(),
                sim.roster.balance(human.id),
                city,
                building,
                job,
                human.marital_status,
            )?;
        }
        Ok(())
    }

    /// Write the hour if it is due. After the first failure the log goes
    /// quiet.
    pub fn record(&mut self, summary: &HourSummary, sim: &Simulation) {
        if self.failed || !self.is_due(summary.hour) {
            return;
        }
        if let Err(err) = self.write_hour(summary, sim) {
            warn!(hour = summary.hour, error = %err, "CSV write failed, log disabled");
            self.failed = true;
        }
    }

    /// Flush buffered rows.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// The underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use humanity_agents::{AgentRules, Catalog, Roster};
    use humanity_core::{CalendarConfig, HourClock, PopulationConfig};
    use humanity_types::{CityId, Gender};
    use humanity_world::World;

    use super::*;

    fn simulation() -> Simulation {
        let rules = AgentRules::default();
        let mut roster = Roster::new();
        roster
            .spawn(Gender::Female, 30.0, CityId::new(0), 1_500, &rules.lifecycle)
            .unwrap();
        roster
            .spawn(Gender::Male, 41.5, CityId::new(0), 20, &rules.lifecycle)
            .unwrap();
        Simulation::new(
            HourClock::new(&CalendarConfig::default()).unwrap(),
            World::builder().build(),
            roster,
            Catalog::default(),
            rules,
            PopulationConfig::default(),
            7,
            1,
        )
        .unwrap()
    }

    #[test]
    fn writes_header_and_rows() {
        let sim = simulation();
        let summary = HourSummary {
            hour: 6,
            ..HourSummary::default()
        };
        let mut log = CsvLog::new(Vec::new(), 3).unwrap();
        log.record(&summary, &sim);

        let text = String::from_utf8(log.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.first().copied(), Some(HEADER));
        assert_eq!(
            lines.get(1).copied(),
            Some("6,0,30.00,female,true,1500,unknown,none,unemployed,single")
        );
        assert!(lines.get(2).is_some_and(|row| row.starts_with("6,1,41.50,male,")));
    }

    #[test]
    fn skips_hours_off_the_stride() {
        let sim = simulation();
        let mut log = CsvLog::new(Vec::new(), 4).unwrap();
        for hour in 0..8 {
            let summary = HourSummary {
                hour,
                ..HourSummary::default()
            };
            log.record(&summary, &sim);
        }
        let text = String::from_utf8(log.into_inner()).unwrap();
        // header + two agents at hours 0 and 4
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn zero_stride_means_every_hour() {
        let log = CsvLog::new(Vec::new(), 0).unwrap();
        assert!(log.is_due(0));
        assert!(log.is_due(1));
    }
}
