//! Layoffs: additive firing probabilities evaluated every hour.
//!
//! Each cause contributes a fixed rate when it applies. Standing causes
//! depend only on the employee; market causes are independent random
//! events rolled fresh every hour. One draw against the summed probability
//! decides the firing.

use rand::Rng;
use tracing::debug;

use humanity_world::World;

use crate::config::{LayoffRules, LifecycleRules};
use crate::goals::Catalog;
use crate::human::Human;
use crate::splash::SplashKind;

/// A reason that raises an employee's firing probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayoffCause {
    /// Still within the new-hire period.
    NewHire,
    /// A macro downturn hit this hour.
    Downturn,
    /// Pay above the restructuring threshold.
    HighSalary,
    /// Too many distressing needs.
    Stress,
    /// Older than the age-bias threshold.
    AgeBias,
    /// A pure random cut this hour.
    RandomCut,
}

impl LayoffCause {
    /// Snake-case label for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NewHire => "new_hire",
            Self::Downturn => "downturn",
            Self::HighSalary => "high_salary",
            Self::Stress => "stress",
            Self::AgeBias => "age_bias",
            Self::RandomCut => "random_cut",
        }
    }

    /// Probability the cause adds.
    pub const fn rate(self, rules: &LayoffRules) -> f64 {
        match self {
            Self::NewHire => rules.new_hire_rate,
            Self::Downturn => rules.downturn_rate,
            Self::HighSalary => rules.high_salary_rate,
            Self::Stress => rules.stress_rate,
            Self::AgeBias => rules.age_bias_rate,
            Self::RandomCut => rules.random_cut_rate,
        }
    }
}

/// Causes that follow from the employee's own state.
pub fn standing_causes(human: &Human, rules: &LayoffRules) -> Vec<LayoffCause> {
    let Some(employment) = human.employment else {
        return Vec::new();
    };
    let distress = human.splashes.iter().filter(|s| s.kind.is_distressing()).count();
    [
        (human.job_hours < rules.new_hire_hours, LayoffCause::NewHire),
        (employment.payment > rules.high_salary, LayoffCause::HighSalary),
        (distress > rules.stress_threshold, LayoffCause::Stress),
        (human.age > rules.age_bias_age, LayoffCause::AgeBias),
    ]
    .into_iter()
    .filter_map(|(applies, cause)| applies.then_some(cause))
    .collect()
}

/// Market events rolled this hour.
pub fn market_causes(rules: &LayoffRules, rng: &mut impl Rng) -> Vec<LayoffCause> {
    let mut causes = Vec::new();
    if rng.random_bool(rules.downturn_chance.clamp(0.0, 1.0)) {
        causes.push(LayoffCause::Downturn);
    }
    if rng.random_bool(rules.random_cut_chance.clamp(0.0, 1.0)) {
        causes.push(LayoffCause::RandomCut);
    }
    causes
}

/// Summed firing probability of a set of causes, capped at 1.
pub fn fire_probability(causes: &[LayoffCause], rules: &LayoffRules) -> f64 {
    causes.iter().map(|cause| cause.rate(rules)).sum::<f64>().clamp(0.0, 1.0)
}

/// Decide whether to fire an employee this hour.
///
/// Returns the last applicable cause in declaration order when the draw
/// fires, `None` otherwise or when the agent is unemployed or dead.
pub fn evaluate(human: &Human, rules: &LayoffRules, rng: &mut impl Rng) -> Option<LayoffCause> {
    if !human.is_employed() || !human.is_alive() {
        return None;
    }
    let mut causes = standing_causes(human, rules);
    causes.extend(market_causes(rules, rng));
    causes.sort_unstable();
    let probability = fire_probability(&causes, rules);
    if probability > 0.0 && rng.random_bool(probability) {
        causes.last().copied()
    } else {
        None
    }
}

/// Fire an employee: return the slot, drop the job, and attach a
/// `job_loss` splash. Returns `false` if the agent had no job.
pub fn fire(
    human: &mut Human,
    world: &World,
    catalog: &Catalog,
    lifecycle: &LifecycleRules,
    hour: u64,
) -> bool {
    let Some(employment) = human.employment.take() else {
        return false;
    };
    world.release(employment.vacancy);
    human.job_hours = lifecycle.unemployed_job_hours;
    human.add_splash(SplashKind::JobLoss, catalog.splash_tags(SplashKind::JobLoss), hour);
    debug!(agent = %human.id, vacancy = %employment.vacancy, "Laid off");
    true
}
