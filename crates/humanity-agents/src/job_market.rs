//! Job search and better-offer switching.
//!
//! Both run inside the parallel phase. Browsing takes shared locks on the
//! home city's jobs; hiring and switching take exclusive ones. A vacancy
//! that fills up between browsing and hiring simply refuses the hire.

use rand::Rng;
use tracing::debug;

use humanity_ledger::Ledger;
use humanity_types::CityId;
use humanity_world::{Job, Vacancy, World};

use crate::config::JobMarketRules;
use crate::goals::{Catalog, pick_uniform_max};
use crate::human::{Employment, Human};
use crate::splash::SplashKind;

/// Outcome of an hourly job-market check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobChange {
    /// Nothing changed.
    #[default]
    None,
    /// An unemployed agent was hired.
    Hired,
    /// An employed agent moved to another vacancy.
    Switched,
}

#[allow(clippy::cast_precision_loss)]
const fn money_f64(amount: i64) -> f64 {
    amount as f64
}

/// Open vacancies in one city.
fn open_vacancies(world: &World, city: CityId) -> impl Iterator<Item = (&Job, &Vacancy)> {
    world
        .jobs_in(city)
        .flat_map(|job| job.open_vacancies().into_iter().map(move |vacancy| (job, vacancy)))
}

/// Search the home city for a job and take one uniformly at random.
///
/// A vacancy qualifies when it has no requirements, when the agent holds
/// enough of its required tags, or when the agent is unemployed and deep in
/// debt. An employed agent only considers better-paying vacancies.
pub fn find_job(
    human: &mut Human,
    world: &World,
    ledger: &Ledger,
    rules: &JobMarketRules,
    rng: &mut impl Rng,
) -> JobChange {
    let current = human.employment;
    let desperate = current.is_none() && ledger.balance(human.id) < rules.desperation_balance;
    let candidates: Vec<(&Job, &Vacancy)> = open_vacancies(world, human.home_city)
        .filter(|(_, vacancy)| {
            vacancy.is_open_to_all()
                || vacancy.skill_match(|tag| human.holds(tag)) >= rules.skill_match_threshold
                || desperate
        })
        .filter(|(_, vacancy)| current.is_none_or(|job| vacancy.payment > job.payment))
        .collect();
    let Some(&(job, vacancy)) = pick_uniform_max(candidates.iter(), |_| (), rng) else {
        return JobChange::None;
    };

    let taken = match current {
        Some(old) => world.switch_job(old.vacancy, vacancy.id),
        None => world.hire(vacancy.id),
    };
    if !taken {
        return JobChange::None;
    }
    human.employment = Some(Employment::in_vacancy(vacancy, job.building));
    human.job_hours = 0;
    debug!(agent = %human.id, vacancy = %vacancy.id, payment = vacancy.payment, "Hired");
    if current.is_some() {
        JobChange::Switched
    } else {
        JobChange::Hired
    }
}

/// Probability of accepting a raise, clamped to the configured band.
pub fn switch_probability(current: i64, offered: i64, rules: &JobMarketRules) -> f64 {
    let raise = if current > 0 {
        money_f64(offered.saturating_sub(current)) / money_f64(current)
    } else {
        rules.switch_probability_max
    };
    raise
        .clamp(rules.switch_probability_min, rules.switch_probability_max)
        .clamp(0.0, 1.0)
}

/// Look for a vacancy paying at least the configured raise and maybe take
/// the best one. A switch adds a `career_advancement` splash.
pub fn consider_better_offer(
    human: &mut Human,
    world: &World,
    catalog: &Catalog,
    rules: &JobMarketRules,
    hour: u64,
    rng: &mut impl Rng,
) -> JobChange {
    let Some(current) = human.employment else {
        return JobChange::None;
    };
    let floor = money_f64(current.payment) * rules.offer_min_raise_ratio;
    let offers = open_vacancies(world, human.home_city).filter(|(_, vacancy)| {
        money_f64(vacancy.payment) >= floor
            && vacancy.id != current.vacancy
            && vacancy.skill_match(|tag| human.holds(tag)) >= rules.offer_min_skill_match
    });
    let Some((job, best)) = pick_uniform_max(offers, |(_, vacancy)| vacancy.payment, rng) else {
        return JobChange::None;
    };

    if !rng.random_bool(switch_probability(current.payment, best.payment, rules)) {
        return JobChange::None;
    }
    if !world.switch_job(current.vacancy, best.id) {
        return JobChange::None;
    }
    human.employment = Some(Employment::in_vacancy(best, job.building));
    human.job_hours = 0;
    human.add_splash(
        SplashKind::CareerAdvancement,
        catalog.splash_tags(SplashKind::CareerAdvancement),
        hour,
    );
    debug!(agent = %human.id, from = current.payment, to = best.payment, "Switched job");
    JobChange::Switched
}

/// The hourly job-market step.
///
/// Unemployed adults search on the search cadence; employees past the
/// minimum tenure weigh better offers on the offer cadence.
pub fn check(
    human: &mut Human,
    world: &World,
    ledger: &Ledger,
    catalog: &Catalog,
    rules: &JobMarketRules,
    hour: u64,
    rng: &mut impl Rng,
) -> JobChange {
    if human.is_employed() {
        let due = human.job_hours.checked_rem(rules.offer_interval_hours) == Some(0);
        if human.job_hours >= rules.offer_min_tenure_hours && due {
            return consider_better_offer(human, world, catalog, rules, hour, rng);
        }
        return JobChange::None;
    }
    let due = hour.checked_rem(rules.search_interval_hours) == Some(0);
    if due && human.age >= rules.min_working_age {
        find_job(human, world, ledger, rules, rng)
    } else {
        JobChange::None
    }
}
