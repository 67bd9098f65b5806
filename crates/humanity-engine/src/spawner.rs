//! Initial population for the simulation.
//!
//! The spawner splits [`PopulationConfig::size`] agents between the cities,
//! draws ages from a clamped normal distribution, houses each agent in a
//! random residential building of its home city, assigns two to three
//! global targets, and employs the configured share of every city in
//! vacancies that require nothing.

use std::f64::consts::TAU;

use humanity_agents::{Catalog, Employment, GoalProgress, LifecycleRules, Roster};
use humanity_core::PopulationConfig;
use humanity_types::{AgentId, BuildingType, CityId, Gender};
use humanity_world::World;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Outcome of spawning the initial population.
#[derive(Debug)]
pub struct SpawnResult {
    /// The populated roster.
    pub roster: Roster,
    /// Agents that received a job.
    pub employed: u32,
    /// Agents left without an apartment.
    pub homeless: u32,
}

/// Create the initial population.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if the roster runs out of ids.
pub fn spawn_population(
    config: &PopulationConfig,
    lifecycle: &LifecycleRules,
    world: &World,
    catalog: &Catalog,
    rng: &mut impl Rng,
) -> Result<SpawnResult, EngineError> {
    let mut result = SpawnResult {
        roster: Roster::new(),
        employed: 0,
        homeless: 0,
    };

    for (city, count) in city_split(world, config.size, config.small_city_share) {
        let to_employ = share_of(count, config.employment_rate);
        let mut city_employed: u32 = 0;

        for index in 0..count {
            let gender = if rng.random_bool(config.male_probability) {
                Gender::Male
            } else {
                Gender::Female
            };
            let age = sample_age(config, rng);
            let id = result
                .roster
                .spawn(gender, age, city, config.starting_money, lifecycle)?;

            if !house(&mut result.roster, world, id, city, rng) {
                result.homeless = result.homeless.saturating_add(1);
            }
            if let Some(human) = result.roster.get_mut(id) {
                human.goals = catalog
                    .sample_goals(rng, config.min_goals, config.max_goals)
                    .into_iter()
                    .map(GoalProgress::new)
                    .collect();
            }
            if index < to_employ && employ(&mut result.roster, world, id, city, config, rng) {
                city_employed = city_employed.saturating_add(1);
            }
        }

        result.employed = result.employed.saturating_add(city_employed);
        info!(
            city = %city,
            population = count,
            employed = city_employed,
            "City populated"
        );
    }

    if result.homeless > 0 {
        warn!(homeless = result.homeless, "Not every agent could be housed");
    }
    Ok(result)
}

/// Agents per city: the first city gets `first_share` of the total, the
/// rest is spread evenly over the remaining cities.
fn city_split(world: &World, size: u32, first_share: f64) -> Vec<(CityId, u32)> {
    let cities = world.cities();
    let Some((first, others)) = cities.split_first() else {
        return Vec::new();
    };
    if others.is_empty() {
        return vec![(first.id, size)];
    }

    let first_count = share_of(size, first_share);
    let rest = size.saturating_sub(first_count);
    let other_count = u32::try_from(others.len()).unwrap_or(u32::MAX);
    let base = rest.checked_div(other_count).unwrap_or(0);
    let extra = rest.checked_rem(other_count).unwrap_or(0);

    let mut split = vec![(first.id, first_count)];
    for (index, city) in (0_u32..).zip(others) {
        let bonus = u32::from(index < extra);
        split.push((city.id, base.saturating_add(bonus)));
    }
    split
}

/// `round(count * share)`, clamped to `[0, count]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn share_of(count: u32, share: f64) -> u32 {
    let scaled = (f64::from(count) * share.clamp(0.0, 1.0)).round();
    (scaled as u32).min(count)
}

/// Normal(mean, std dev) by the Box-Muller transform, clamped to the
/// configured age range.
fn sample_age(config: &PopulationConfig, rng: &mut impl Rng) -> f64 {
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
    config
        .age_std_dev
        .mul_add(z, config.age_mean)
        .clamp(config.age_min, config.age_max)
}

/// Move `id` into a random residential building of `city` with room.
fn house(roster: &mut Roster, world: &World, id: AgentId, city: CityId, rng: &mut impl Rng) -> bool {
    let open: Vec<_> = world
        .buildings_of(city, BuildingType::ResidentialHouse)
        .filter(|building| building.has_room())
        .collect();
    let Some(building) = open.choose(rng) else {
        debug!(agent = %id, city = %city, "No apartment available");
        return false;
    };
    if !building.add_resident(id) {
        return false;
    }
    if let Some(human) = roster.get_mut(id) {
        human.residence = Some(building.id);
        human.current_building = Some(building.id);
    }
    true
}

/// Hire `id` into a random open vacancy of `city` that requires nothing.
fn employ(
    roster: &mut Roster,
    world: &World,
    id: AgentId,
    city: CityId,
    config: &PopulationConfig,
    rng: &mut impl Rng,
) -> bool {
    let open: Vec<_> = world
        .jobs_in(city)
        .flat_map(|job| {
            job.open_vacancies()
                .into_iter()
                .filter(|vacancy| vacancy.is_open_to_all())
                .map(move |vacancy| (job.building, vacancy))
        })
        .collect();
    let Some((building, vacancy)) = open.choose(rng) else {
        return false;
    };
    if !world.hire(vacancy.id) {
        return false;
    }

    let tenure = if config.max_initial_tenure_hours == 0 {
        0
    } else {
        rng.random_range(0..config.max_initial_tenure_hours)
    };
    if let Some(human) = roster.get_mut(id) {
        human.employment = Some(Employment::in_vacancy(vacancy, *building));
        human.job_hours = tenure;
    }
    debug!(agent = %id, vacancy = %vacancy.id, tenure, "Initial hire");
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use humanity_world::{build_world, default_templates};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn world(rng: &mut StdRng) -> World {
        build_world(&default_templates(), rng).unwrap()
    }

    fn spawn(config: &PopulationConfig, seed: u64) -> (World, SpawnResult) {
        let mut rng = StdRng::seed_from_u64(seed);
        let world = world(&mut rng);
        let result = spawn_population(
            config,
            &LifecycleRules::default(),
            &world,
            &Catalog::default(),
            &mut rng,
        )
        .unwrap();
        (world, result)
    }

    #[test]
    fn splits_population_between_cities() {
        let config = PopulationConfig::default();
        let (world, result) = spawn(&config, 1);
        let small = world.cities().first().unwrap().id;
        let in_small = result.roster.humans().iter().filter(|h| h.home_city == small).count();
        assert_eq!(result.roster.len(), 200);
        assert_eq!(in_small, 80);
    }

    #[test]
    fn ages_stay_within_bounds() {
        let config = PopulationConfig::default();
        let (_, result) = spawn(&config, 2);
        assert!(
            result
                .roster
                .humans()
                .iter()
                .all(|h| (config.age_min..=config.age_max).contains(&h.age))
        );
    }

    #[test]
    fn residents_match_building_sets() {
        let (world, result) = spawn(&PopulationConfig::default(), 3);
        let mut housed: u32 = 0;
        for human in result.roster.humans() {
            if let Some(home) = human.residence {
                let building = world.building(home).unwrap();
                assert!(building.is_resident(human.id));
                assert_eq!(building.city, human.home_city);
                housed = housed.saturating_add(1);
            }
        }
        assert_eq!(housed.saturating_add(result.homeless), 200);
        assert!(world.buildings().iter().all(|b| b.occupied() <= b.capacity));
    }

    #[test]
    fn employment_uses_open_vacancies() {
        let (world, result) = spawn(&PopulationConfig::default(), 4);
        let mut employed: u32 = 0;
        for human in result.roster.humans() {
            if let Some(job) = human.employment {
                let (_, vacancy) = world.vacancy(job.vacancy).unwrap();
                assert!(vacancy.is_open_to_all());
                assert_eq!(job.payment, vacancy.payment);
                assert!(human.job_hours < 2_000);
                employed = employed.saturating_add(1);
            }
        }
        assert_eq!(employed, result.employed);
        assert!(employed > 0);
        for job in world.jobs() {
            for vacancy in &job.vacancies {
                let held = result
                    .roster
                    .humans()
                    .iter()
                    .filter(|h| h.employment.is_some_and(|e| e.vacancy == vacancy.id))
                    .count();
                let held = u32::try_from(held).unwrap();
                assert_eq!(held.saturating_add(job.remaining(vacancy.id)), vacancy.initial_slots);
            }
        }
    }

    #[test]
    fn zero_employment_rate_leaves_everyone_unemployed() {
        let config = PopulationConfig {
            employment_rate: 0.0,
            ..PopulationConfig::default()
        };
        let (_, result) = spawn(&config, 5);
        assert_eq!(result.employed, 0);
        assert!(
            result
                .roster
                .humans()
                .iter()
                .all(|h| h.job_hours == LifecycleRules::default().unemployed_job_hours)
        );
    }

    #[test]
    fn single_city_takes_everyone() {
        let mut rng = StdRng::seed_from_u64(6);
        let templates = vec![default_templates().into_iter().next().unwrap()];
        let world = build_world(&templates, &mut rng).unwrap();
        assert_eq!(city_split(&world, 50, 0.4), vec![(world.cities()[0].id, 50)]);
    }

    #[test]
    fn share_rounds_and_clamps() {
        assert_eq!(share_of(200, 0.4), 80);
        assert_eq!(share_of(3, 0.5), 2);
        assert_eq!(share_of(10, 1.5), 10);
    }
}
