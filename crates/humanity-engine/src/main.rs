//! Simulation binary for Humanity.
//!
//! This is the entry point that wires together configuration, templates,
//! the starting cities, the initial population, and the hourly scheduler,
//! then runs the simulation for the requested number of hours.
//!
//! # Startup Sequence
//!
//! 1. Parse the command line and initialize structured logging (tracing)
//! 2. Load configuration from YAML and apply command-line overrides
//! 3. Load action and target templates
//! 4. Create the hour clock from the calendar config
//! 5. Build the starting cities
//! 6. Spawn the initial population
//! 7. Assemble the simulation and its worker pool
//! 8. Run the simulation loop
//! 9. Log the result and print the report

mod csv_log;
mod error;
mod report;
mod spawner;
mod templates;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Parser;
use humanity_core::{HourClock, Simulation, SimulationConfig, log_simulation_end, run};
use humanity_world::build_world;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::csv_log::CsvLog;
use crate::error::EngineError;
use crate::report::EngineCallback;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "humanity-engine", version, about = "Hour-stepped simulation of a human population")]
struct Args {
    /// YAML configuration file. Defaults apply when it does not exist.
    #[arg(short, long, default_value = "humanity-config.yaml")]
    config: PathBuf,

    /// Directory holding actions.txt, local_targets.txt and global_targets.txt.
    #[arg(short, long, default_value = "data")]
    templates: PathBuf,

    /// Simulated hours to run (overrides `simulation.hours`).
    #[arg(long)]
    hours: Option<u64>,

    /// Random seed (overrides `simulation.seed`).
    #[arg(short, long)]
    seed: Option<u64>,

    /// Worker threads, 0 for one per core (overrides `simulation.threads`).
    #[arg(long)]
    threads: Option<usize>,

    /// Write a per-agent CSV log to this file.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Hour stride of the CSV log.
    #[arg(long, default_value_t = 24)]
    csv_every: u64,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Parse arguments and initialize structured logging.
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("humanity-engine starting");
    start(&args)?;
    Ok(())
}

fn start(args: &Args) -> Result<(), EngineError> {
    // 2. Load configuration.
    let config = load_config(args)?;
    let rules = config.agent_rules();
    info!(
        hours = config.simulation.hours,
        seed = config.simulation.seed,
        threads = config.simulation.threads,
        population = config.population.size,
        cities = config.cities.len(),
        "Configuration loaded"
    );

    // 3. Load templates.
    let catalog = templates::load_catalog(&args.templates)?;

    // 4. Create the hour clock.
    let clock = HourClock::new(&config.calendar)?;
    info!(start_hour = clock.hour(), "Hour clock initialized");

    // 5. Build the starting cities.
    let mut rng = StdRng::seed_from_u64(config.simulation.seed);
    let world = build_world(&config.cities, &mut rng)?;
    info!(
        cities = world.cities().len(),
        buildings = world.buildings().len(),
        jobs = world.jobs().len(),
        "Starting cities built"
    );

    // 6. Spawn the initial population.
    let spawned = spawner::spawn_population(&config.population, &rules.lifecycle, &world, &catalog, &mut rng)?;
    info!(
        agents = spawned.roster.len(),
        employed = spawned.employed,
        homeless = spawned.homeless,
        "Initial population spawned"
    );

    // 7. Assemble the simulation.
    let mut sim = Simulation::new(
        clock,
        world,
        spawned.roster,
        catalog,
        rules,
        config.population,
        config.simulation.seed,
        config.simulation.threads,
    )?;

    let csv = args
        .csv
        .as_deref()
        .map(|path| open_csv(path, args.csv_every))
        .transpose()?;
    let mut callback = EngineCallback::new(csv);

    // 8. Run the simulation.
    let result = run(&mut sim, config.simulation.hours, &mut callback)?;

    // 9. Log results and print the report.
    log_simulation_end(&result);
    let csv_path = args.csv.clone().unwrap_or_default();
    callback.finish().map_err(|source| EngineError::Csv {
        path: csv_path,
        source,
    })?;
    report::write_report(&result, &mut std::io::stdout().lock())
        .map_err(|source| EngineError::Report { source })?;

    info!(
        end_reason = ?result.end_reason,
        hours_run = result.hours_run,
        "humanity-engine shutdown complete"
    );
    Ok(())
}

/// Load the configuration file, or the defaults when it does not exist,
/// then apply command-line overrides and validate.
fn load_config(args: &Args) -> Result<SimulationConfig, EngineError> {
    let mut config = if args.config.exists() {
        SimulationConfig::from_file(&args.config)?
    } else {
        info!(path = %args.config.display(), "Config file not found, using defaults");
        SimulationConfig::default()
    };

    if let Some(hours) = args.hours {
        config.simulation.hours = hours;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(threads) = args.threads {
        config.simulation.threads = threads;
    }

    config.validate()?;
    Ok(config)
}

fn open_csv(path: &Path, every: u64) -> Result<CsvLog<BufWriter<File>>, EngineError> {
    let to_error = |source: std::io::Error| EngineError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(to_error)?;
    let log = CsvLog::new(BufWriter::new(file), every).map_err(to_error)?;
    info!(path = %path.display(), every, "CSV log opened");
    Ok(log)
}
