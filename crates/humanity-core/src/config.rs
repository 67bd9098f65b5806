//! Configuration loading and typed config structures for the Humanity
//! simulation.
//!
//! The configuration is one YAML document. Every field has a default, so an
//! empty file is a valid configuration and a partial one only overrides
//! what it names. [`SimulationConfig::validate`] runs before the first hour;
//! a configuration that fails it never reaches the scheduler.

use std::path::Path;

use serde::Deserialize;

use humanity_agents::{
    AgentRules, EconomyRules, FamilyRules, JobMarketRules, LayoffRules, LifecycleRules, SocialRules,
};
use humanity_world::{CityTemplate, default_templates};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run length, seed, and worker threads.
    #[serde(default)]
    pub simulation: RunConfig,

    /// Hour, day, and month boundaries; work and rest windows.
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Initial population.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Ageing and death.
    #[serde(default)]
    pub lifecycle: LifecycleRules,

    /// Living expenses.
    #[serde(default)]
    pub economy: EconomyRules,

    /// Job search and switching.
    #[serde(default)]
    pub jobs: JobMarketRules,

    /// Pregnancy and birth.
    #[serde(default)]
    pub family: FamilyRules,

    /// Friendship and marriage.
    #[serde(default)]
    pub social: SocialRules,

    /// Layoffs.
    #[serde(default)]
    pub layoff: LayoffRules,

    /// City templates, small city first.
    #[serde(default = "default_templates")]
    pub cities: Vec<CityTemplate>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulation: RunConfig::default(),
            calendar: CalendarConfig::default(),
            population: PopulationConfig::default(),
            lifecycle: LifecycleRules::default(),
            economy: EconomyRules::default(),
            jobs: JobMarketRules::default(),
            family: FamilyRules::default(),
            social: SocialRules::default(),
            layoff: LayoffRules::default(),
            cities: default_templates(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string. An empty string yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// The per-agent behaviour rules.
    pub fn agent_rules(&self) -> AgentRules {
        AgentRules {
            lifecycle: self.lifecycle.clone(),
            economy: self.economy.clone(),
            jobs: self.jobs.clone(),
            family: self.family.clone(),
            social: self.social.clone(),
            layoff: self.layoff.clone(),
        }
    }

    /// Reject values the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calendar.validate()?;
        self.population.validate()?;

        let rules = self.agent_rules();
        let ratios = [
            ("population.small_city_share", self.population.small_city_share),
            ("population.employment_rate", self.population.employment_rate),
            ("population.male_probability", self.population.male_probability),
        ];
        for (name, value) in rules.probabilities().into_iter().chain(ratios) {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if self.jobs.switch_probability_min > self.jobs.switch_probability_max {
            return Err(invalid("jobs.switch_probability_min exceeds jobs.switch_probability_max"));
        }
        if self.lifecycle.hours_per_year <= 0.0 {
            return Err(invalid("lifecycle.hours_per_year must be positive"));
        }
        if self.jobs.search_interval_hours == 0 || self.jobs.offer_interval_hours == 0 {
            return Err(invalid("job market intervals must be at least one hour"));
        }
        if self.lifecycle.unemployed_job_hours.checked_rem(self.jobs.offer_interval_hours) == Some(0) {
            return Err(invalid(
                "lifecycle.unemployed_job_hours must not be a multiple of jobs.offer_interval_hours",
            ));
        }
        if self.family.hours_per_month <= 0.0 {
            return Err(invalid("family.hours_per_month must be positive"));
        }
        if self.cities.is_empty() {
            return Err(invalid("at least one city is required"));
        }
        for city in &self.cities {
            city.validate().map_err(|err| invalid(err.to_string()))?;
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run length and execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Simulated hours to run.
    #[serde(default = "default_hours")]
    pub hours: u64,

    /// Seed for every random stream in the run.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Worker threads for the parallel phase. 0 means one per core.
    #[serde(default)]
    pub threads: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            hours: default_hours(),
            seed: default_seed(),
            threads: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Calendar shape and daily schedule.
///
/// Hours are counted from zero; hour 0 is midnight of the first day of the
/// first month, a workday. The rest window may wrap past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarConfig {
    /// Hours in one day.
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: u64,

    /// Days in one month.
    #[serde(default = "default_days_per_month")]
    pub days_per_month: u64,

    /// Days in one week.
    #[serde(default = "default_days_per_week")]
    pub days_per_week: u64,

    /// Leading days of each week that are workdays.
    #[serde(default = "default_workdays_per_week")]
    pub workdays_per_week: u64,

    /// First hour of the work window.
    #[serde(default = "default_work_start_hour")]
    pub work_start_hour: u64,

    /// Hour the work window ends (exclusive).
    #[serde(default = "default_work_end_hour")]
    pub work_end_hour: u64,

    /// First hour of the rest window.
    #[serde(default = "default_rest_start_hour")]
    pub rest_start_hour: u64,

    /// Hour the rest window ends (exclusive).
    #[serde(default = "default_rest_end_hour")]
    pub rest_end_hour: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            hours_per_day: default_hours_per_day(),
            days_per_month: default_days_per_month(),
            days_per_week: default_days_per_week(),
            workdays_per_week: default_workdays_per_week(),
            work_start_hour: default_work_start_hour(),
            work_end_hour: default_work_end_hour(),
            rest_start_hour: default_rest_start_hour(),
            rest_end_hour: default_rest_end_hour(),
        }
    }
}

impl CalendarConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.hours_per_day == 0 || self.days_per_month == 0 || self.days_per_week == 0 {
            return Err(invalid("calendar lengths must be at least 1"));
        }
        if self.workdays_per_week > self.days_per_week {
            return Err(invalid("calendar.workdays_per_week exceeds calendar.days_per_week"));
        }
        let hours = [
            self.work_start_hour,
            self.work_end_hour,
            self.rest_start_hour,
            self.rest_end_hour,
        ];
        if hours.iter().any(|hour| *hour > self.hours_per_day) {
            return Err(invalid("calendar windows must lie within one day"));
        }
        if self.work_start_hour >= self.work_end_hour {
            return Err(invalid("calendar work window is empty"));
        }
        if self.rest_start_hour == self.rest_end_hour {
            return Err(invalid("calendar rest window is empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

/// Initial population parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Agents spawned before the first hour.
    #[serde(default = "default_population_size")]
    pub size: u32,

    /// Share of the population living in the first (small) city.
    #[serde(default = "default_small_city_share")]
    pub small_city_share: f64,

    /// Share of adults employed at start.
    #[serde(default = "default_employment_rate")]
    pub employment_rate: f64,

    /// Opening balance of every initial agent.
    #[serde(default = "default_starting_money")]
    pub starting_money: i64,

    /// Probability that an agent is male.
    #[serde(default = "default_male_probability")]
    pub male_probability: f64,

    /// Mean of the initial age distribution.
    #[serde(default = "default_age_mean")]
    pub age_mean: f64,

    /// Standard deviation of the initial age distribution.
    #[serde(default = "default_age_std_dev")]
    pub age_std_dev: f64,

    /// Lower clamp of initial ages.
    #[serde(default = "default_age_min")]
    pub age_min: f64,

    /// Upper clamp of initial ages.
    #[serde(default = "default_age_max")]
    pub age_max: f64,

    /// Fewest global targets per agent.
    #[serde(default = "default_min_goals")]
    pub min_goals: usize,

    /// Most global targets per agent.
    #[serde(default = "default_max_goals")]
    pub max_goals: usize,

    /// Upper bound of the random initial tenure of employed agents.
    #[serde(default = "default_max_initial_tenure_hours")]
    pub max_initial_tenure_hours: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            small_city_share: default_small_city_share(),
            employment_rate: default_employment_rate(),
            starting_money: default_starting_money(),
            male_probability: default_male_probability(),
            age_mean: default_age_mean(),
            age_std_dev: default_age_std_dev(),
            age_min: default_age_min(),
            age_max: default_age_max(),
            min_goals: default_min_goals(),
            max_goals: default_max_goals(),
            max_initial_tenure_hours: default_max_initial_tenure_hours(),
        }
    }
}

impl PopulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.age_min > self.age_max || self.age_min < 0.0 {
            return Err(invalid("population ages need 0 <= age_min <= age_max"));
        }
        if self.age_std_dev < 0.0 {
            return Err(invalid("population.age_std_dev must not be negative"));
        }
        if self.min_goals > self.max_goals {
            return Err(invalid("population.min_goals exceeds population.max_goals"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_hours() -> u64 {
    26_280
}

const fn default_seed() -> u64 {
    42
}

const fn default_hours_per_day() -> u64 {
    24
}

const fn default_days_per_month() -> u64 {
    30
}

const fn default_days_per_week() -> u64 {
    7
}

const fn default_workdays_per_week() -> u64 {
    5
}

const fn default_work_start_hour() -> u64 {
    9
}

const fn default_work_end_hour() -> u64 {
    18
}

const fn default_rest_start_hour() -> u64 {
    23
}

const fn default_rest_end_hour() -> u64 {
    7
}

const fn default_population_size() -> u32 {
    200
}

const fn default_small_city_share() -> f64 {
    0.4
}

const fn default_employment_rate() -> f64 {
    0.9
}

const fn default_starting_money() -> i64 {
    10_000
}

const fn default_male_probability() -> f64 {
    0.5
}

const fn default_age_mean() -> f64 {
    25.0
}

const fn default_age_std_dev() -> f64 {
    10.0
}

const fn default_age_min() -> f64 {
    20.0
}

const fn default_age_max() -> f64 {
    80.0
}

const fn default_min_goals() -> usize {
    2
}

const fn default_max_goals() -> usize {
    3
}

const fn default_max_initial_tenure_hours() -> u32 {
    2_000
}
