//! Tunable rules for agent behaviour.
//!
//! Each struct bundles the constants of one concern so that callers
//! (scheduler, population manager, tests) can override defaults. All of
//! them deserialize with `#[serde(default)]`, so a configuration file only
//! needs to name the values it changes.

use serde::Deserialize;

/// Ageing, death, and bookkeeping constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LifecycleRules {
    /// Simulated hours in one year of age (default: 8760).
    pub hours_per_year: f64,

    /// Age above which a man dies (default: 68).
    pub death_age_male: f64,

    /// Age above which a woman dies (default: 78).
    pub death_age_female: f64,

    /// Job-tenure value held while unemployed (default: 721).
    ///
    /// Must not be a multiple of [`JobMarketRules::offer_interval_hours`].
    pub unemployed_job_hours: u32,
}

impl Default for LifecycleRules {
    fn default() -> Self {
        Self {
            hours_per_year: 8760.0,
            death_age_male: 68.0,
            death_age_female: 78.0,
            unemployed_job_hours: 721,
        }
    }
}

impl LifecycleRules {
    /// Years added to an age or relationship per simulated hour.
    pub fn year_fraction_per_hour(&self) -> f64 {
        if self.hours_per_year > 0.0 {
            self.hours_per_year.recip()
        } else {
            0.0
        }
    }
}

/// Living costs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// Debited on every day boundary (default: 500).
    pub daily_expense: i64,

    /// Extra daily debit per child (default: 300).
    pub daily_expense_per_child: i64,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            daily_expense: 500,
            daily_expense_per_child: 300,
        }
    }
}

/// Job search and job switching.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobMarketRules {
    /// Hours between searches while unemployed (default: 24).
    pub search_interval_hours: u64,

    /// Minimum age to look for work (default: 18).
    pub min_working_age: f64,

    /// Skill match needed for a vacancy with requirements (default: 0.8).
    pub skill_match_threshold: f64,

    /// Below this balance an unemployed agent takes any vacancy (default: -10000).
    pub desperation_balance: i64,

    /// Tenure before better offers are considered (default: 168).
    pub offer_min_tenure_hours: u32,

    /// Tenure cadence of better-offer checks (default: 168).
    pub offer_interval_hours: u32,

    /// Required pay ratio over the current salary (default: 1.10).
    pub offer_min_raise_ratio: f64,

    /// Skill match needed for a better offer (default: 0.7).
    pub offer_min_skill_match: f64,

    /// Lower clamp of the switch probability (default: 0.2).
    pub switch_probability_min: f64,

    /// Upper clamp of the switch probability (default: 0.6).
    pub switch_probability_max: f64,
}

impl Default for JobMarketRules {
    fn default() -> Self {
        Self {
            search_interval_hours: 24,
            min_working_age: 18.0,
            skill_match_threshold: 0.8,
            desperation_balance: -10_000,
            offer_min_tenure_hours: 168,
            offer_interval_hours: 168,
            offer_min_raise_ratio: 1.10,
            offer_min_skill_match: 0.7,
            switch_probability_min: 0.2,
            switch_probability_max: 0.6,
        }
    }
}

/// Weights of civic buildings in a city's family-friendliness coefficient.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FamilyCoefficientWeights {
    /// Coefficient of a city with no civic buildings (default: 1.0).
    pub base: f64,
    /// Per hospital (default: 0.3).
    pub hospital: f64,
    /// Per school (default: 0.4).
    pub school: f64,
    /// Per entertainment venue (default: 0.2).
    pub entertainment: f64,
    /// Per cafe (default: 0.1).
    pub cafe: f64,
    /// Per shop (default: 0.1).
    pub shop: f64,
}

impl Default for FamilyCoefficientWeights {
    fn default() -> Self {
        Self {
            base: 1.0,
            hospital: 0.3,
            school: 0.4,
            entertainment: 0.2,
            cafe: 0.1,
            shop: 0.1,
        }
    }
}

/// Pregnancy and birth.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FamilyRules {
    /// Youngest age at which a woman plans a child (default: 18).
    pub min_parent_age: f64,

    /// Oldest age at which a woman plans a child (default: 45).
    pub max_mother_age: f64,

    /// Years married before planning a child (default: 1).
    pub min_marriage_years: f64,

    /// Combined monthly pay of both spouses needed (default: 50000).
    pub min_family_income: i64,

    /// No more children once a mother has this many (default: 4).
    pub max_children: usize,

    /// Name of the global target that marks a wish for children (default: `happy_family`).
    pub family_goal: String,

    /// Conception chance per month before the city coefficient (default: 0.25).
    pub monthly_conception_rate: f64,

    /// Hours in a month for the rate conversion (default: 720).
    pub hours_per_month: f64,

    /// Pregnancy length in hours (default: 6480).
    pub gestation_hours: u32,

    /// City coefficient weights.
    pub coefficient: FamilyCoefficientWeights,
}

impl Default for FamilyRules {
    fn default() -> Self {
        Self {
            min_parent_age: 18.0,
            max_mother_age: 45.0,
            min_marriage_years: 1.0,
            min_family_income: 50_000,
            max_children: 4,
            family_goal: "happy_family".to_owned(),
            monthly_conception_rate: 0.25,
            hours_per_month: 720.0,
            gestation_hours: 6480,
            coefficient: FamilyCoefficientWeights::default(),
        }
    }
}

/// Friendship and marriage formation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SocialRules {
    /// Chance per hour that two co-located strangers become friends (default: 0.25).
    pub friendship_probability: f64,

    /// Chance per hour that an eligible pair marries (default: 0.05).
    pub marriage_probability: f64,

    /// Largest age gap in years for marriage (default: 10).
    pub max_age_gap: f64,

    /// Shortest friendship in years before marriage (default: 0.5).
    pub min_friendship_years: f64,

    /// Shared active global targets needed for marriage (default: 3).
    pub min_shared_goals: usize,
}

impl Default for SocialRules {
    fn default() -> Self {
        Self {
            friendship_probability: 0.25,
            marriage_probability: 0.05,
            max_age_gap: 10.0,
            min_friendship_years: 0.5,
            min_shared_goals: 3,
        }
    }
}

/// Additive firing probabilities evaluated every hour for employed agents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoffRules {
    /// Tenure below which an agent counts as a new hire (default: 168).
    pub new_hire_hours: u32,
    /// Added for new hires (default: 0.01).
    pub new_hire_rate: f64,

    /// Chance that a downturn hits an agent this hour (default: 0.0005).
    pub downturn_chance: f64,
    /// Added when a downturn hits (default: 0.03).
    pub downturn_rate: f64,

    /// Pay above which restructuring targets the agent (default: 60000).
    pub high_salary: i64,
    /// Added for high earners (default: 0.0003).
    pub high_salary_rate: f64,

    /// More negative needs than this count as stress (default: 1).
    pub stress_threshold: usize,
    /// Added for stressed agents (default: 0.005).
    pub stress_rate: f64,

    /// Age above which age bias applies (default: 55).
    pub age_bias_age: f64,
    /// Added for older agents (default: 0.0001).
    pub age_bias_rate: f64,

    /// Chance of a pure random cut this hour (default: 0.00001).
    pub random_cut_chance: f64,
    /// Added on a random cut (default: 0.001).
    pub random_cut_rate: f64,
}

impl Default for LayoffRules {
    fn default() -> Self {
        Self {
            new_hire_hours: 168,
            new_hire_rate: 0.01,
            downturn_chance: 0.0005,
            downturn_rate: 0.03,
            high_salary: 60_000,
            high_salary_rate: 0.0003,
            stress_threshold: 1,
            stress_rate: 0.005,
            age_bias_age: 55.0,
            age_bias_rate: 0.0001,
            random_cut_chance: 0.000_01,
            random_cut_rate: 0.001,
        }
    }
}

/// Every agent rule set, as read from the `agents` section of the config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentRules {
    /// Ageing and death.
    pub lifecycle: LifecycleRules,
    /// Living costs.
    pub economy: EconomyRules,
    /// Job market.
    pub jobs: JobMarketRules,
    /// Pregnancy and birth.
    pub family: FamilyRules,
    /// Friendship and marriage.
    pub social: SocialRules,
    /// Layoffs.
    pub layoff: LayoffRules,
}

impl AgentRules {
    /// Names and values of every probability, for range validation.
    pub fn probabilities(&self) -> [(&'static str, f64); 7] {
        [
            ("social.friendship_probability", self.social.friendship_probability),
            ("social.marriage_probability", self.social.marriage_probability),
            ("family.monthly_conception_rate", self.family.monthly_conception_rate),
            ("layoff.downturn_chance", self.layoff.downturn_chance),
            ("layoff.random_cut_chance", self.layoff.random_cut_chance),
            ("jobs.switch_probability_min", self.jobs.switch_probability_min),
            ("jobs.switch_probability_max", self.jobs.switch_probability_max),
        ]
    }
}
