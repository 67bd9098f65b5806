//! End-to-end properties of the hourly cycle.
//!
//! Each test assembles a small world and roster by hand, runs the real
//! scheduler on a multi-threaded pool, and checks an invariant or a
//! scenario outcome.

#![allow(
    clippy::arithmetic_side_effects,
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::indexing_slicing
)]

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;

use humanity_agents::family;
use humanity_agents::layoff::{self, LayoffCause};
use humanity_agents::{
    ActionSpec, AgentRules, Catalog, Employment, GlobalTargetSpec, GoalProgress, LayoffRules, LifecycleRules,
    LocalTargetSpec, Roster, SocialRules, SplashKind,
};
use humanity_core::population::form_marriages;
use humanity_core::{CalendarConfig, HourClock, NoOpCallback, PopulationConfig, Simulation, run};
use humanity_types::{AgentId, BuildingId, BuildingType, CityId, Gender, GlobalTargetId, JobId, MaritalStatus, VacancyId};
use humanity_world::{Coordinates, VacancySpec, World, WorldBuilder};

// =============================================================================
// Fixtures
// =============================================================================

const APARTMENT_PRICE: i64 = 1_000;

fn names(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| (*t).to_owned()).collect()
}

/// One city with a residential building of `homes` units and an office
/// offering `slots` clerk positions.
fn town(homes: u32, slots: u32) -> World {
    let mut builder = WorldBuilder::default();
    let city = builder.add_city("Town", APARTMENT_PRICE, Coordinates::default()).unwrap();
    builder
        .add_building(city, BuildingType::ResidentialHouse, "Flats".to_owned(), homes, Coordinates::default())
        .unwrap();
    let office = builder
        .add_building(city, BuildingType::Workplace, "Office".to_owned(), 100, Coordinates::default())
        .unwrap();
    let clerk = VacancySpec {
        title: "clerk".to_owned(),
        required_tags: Vec::new(),
        payment: 3_000,
        slots,
    };
    builder.add_job(office, vec![clerk]).unwrap();
    builder.build()
}

/// Two goals: owning a home, and a two-step healthy routine.
fn catalog() -> Catalog {
    let actions = vec![
        ActionSpec {
            name: "buy_apartment".to_owned(),
            duration: 1,
            tags: names(&["home"]),
            ..ActionSpec::default()
        },
        ActionSpec {
            name: "jog".to_owned(),
            price: 5,
            duration: 2,
            tags: names(&["sport"]),
            ..ActionSpec::default()
        },
        ActionSpec {
            name: "salad".to_owned(),
            price: 20,
            duration: 1,
            tags: names(&["food"]),
            ..ActionSpec::default()
        },
    ];
    let locals = vec![
        LocalTargetSpec {
            name: "settle".to_owned(),
            tags: names(&["home"]),
        },
        LocalTargetSpec {
            name: "exercise".to_owned(),
            tags: names(&["sport"]),
        },
        LocalTargetSpec {
            name: "eat_well".to_owned(),
            tags: names(&["food"]),
        },
    ];
    let globals = vec![
        GlobalTargetSpec {
            name: "own_home".to_owned(),
            power: 1.0,
            tags: names(&["home"]),
        },
        GlobalTargetSpec {
            name: "healthy_life".to_owned(),
            power: 1.0,
            tags: names(&["sport", "food"]),
        },
    ];
    Catalog::build(actions, locals, globals).unwrap()
}

fn calm_layoffs() -> LayoffRules {
    LayoffRules {
        new_hire_rate: 0.0,
        downturn_chance: 0.0,
        high_salary_rate: 0.0,
        stress_rate: 0.0,
        age_bias_rate: 0.0,
        random_cut_chance: 0.0,
        ..LayoffRules::default()
    }
}

fn spawn(roster: &mut Roster, gender: Gender, age: f64, money: i64) -> AgentId {
    roster
        .spawn(gender, age, CityId::new(0), money, &LifecycleRules::default())
        .unwrap()
}

fn simulation(world: World, roster: Roster, catalog: Catalog, rules: AgentRules, start: u64) -> Simulation {
    Simulation::new(
        HourClock::starting_at(start, &CalendarConfig::default()).unwrap(),
        world,
        roster,
        catalog,
        rules,
        PopulationConfig::default(),
        11,
        4,
    )
    .unwrap()
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn apartment_capacity_is_never_exceeded() {
    let world = town(3, 0);
    let catalog = catalog();
    let own_home = catalog.global_by_name("own_home").unwrap().id;
    let mut roster = Roster::new();
    for i in 0..10_u32 {
        let gender = if i % 2 == 0 { Gender::Male } else { Gender::Female };
        let id = spawn(&mut roster, gender, 30.0, 5_000);
        roster.get_mut(id).unwrap().goals.push(GoalProgress::new(own_home));
    }
    let mut sim = simulation(world, roster, catalog, AgentRules::default(), 0);

    let result = run(&mut sim, 48, &mut NoOpCallback).unwrap();

    assert_eq!(result.anomalies, 0);
    let flats = sim.world.building(BuildingId::new(0)).unwrap();
    assert_eq!(flats.occupied(), 3);
    let owners: Vec<_> = sim.roster.humans().iter().filter(|h| h.residence.is_some()).collect();
    assert_eq!(owners.len(), 3);
    for owner in owners {
        assert!(flats.is_resident(owner.id));
        assert_eq!(sim.roster.balance(owner.id), 5_000 - APARTMENT_PRICE - 2 * 500);
    }
}

#[test]
fn vacancy_slots_are_conserved_through_hires_and_layoffs() {
    let world = town(20, 4);
    let mut roster = Roster::new();
    for i in 0..12_u32 {
        let gender = if i % 2 == 0 { Gender::Male } else { Gender::Female };
        spawn(&mut roster, gender, 35.0, 50_000);
    }
    let rules = AgentRules {
        layoff: LayoffRules {
            new_hire_rate: 0.05,
            ..LayoffRules::default()
        },
        ..AgentRules::default()
    };
    let mut sim = simulation(world, roster, Catalog::default(), rules, 0);

    for _ in 0..240 {
        let summary = sim.step().unwrap();
        assert!(summary.anomaly.is_none());

        let mut held: BTreeMap<VacancyId, u32> = BTreeMap::new();
        for human in sim.roster.alive() {
            if let Some(employment) = human.employment {
                *held.entry(employment.vacancy).or_default() += 1;
            }
        }
        for job in sim.world.jobs() {
            for vacancy in &job.vacancies {
                let taken = held.get(&vacancy.id).copied().unwrap_or(0);
                assert_eq!(taken + job.remaining(vacancy.id), vacancy.initial_slots);
            }
        }
    }
}

#[test]
fn completed_goals_only_grow() {
    let world = town(20, 0);
    let catalog = catalog();
    let ids: Vec<GlobalTargetId> = catalog.globals().iter().map(|g| g.id).collect();
    let mut roster = Roster::new();
    for i in 0..8_u32 {
        let gender = if i % 2 == 0 { Gender::Male } else { Gender::Female };
        let id = spawn(&mut roster, gender, 30.0, 10_000);
        roster.get_mut(id).unwrap().goals = ids.iter().copied().map(GoalProgress::new).collect();
    }
    let mut sim = simulation(world, roster, catalog, AgentRules::default(), 0);

    let mut previous: BTreeMap<AgentId, Vec<GlobalTargetId>> = BTreeMap::new();
    for _ in 0..72 {
        sim.step().unwrap();
        for human in sim.roster.humans() {
            let before = previous.get(&human.id).cloned().unwrap_or_default();
            assert!(human.completed_goals.starts_with(&before));
            let unique: BTreeSet<_> = human.completed_goals.iter().collect();
            assert_eq!(unique.len(), human.completed_goals.len());
            assert!(human.active_goal_ids().all(|g| !human.completed_goals.contains(&g)));
            previous.insert(human.id, human.completed_goals.clone());
        }
    }
    assert!(previous.values().all(|done| done.len() == 2));
}

#[test]
fn marriage_links_stay_symmetric_and_divorce_clears_both() {
    let world = town(20, 0);
    let mut roster = Roster::new();
    let flats = BuildingId::new(0);
    for i in 0..10_u32 {
        let gender = if i % 2 == 0 { Gender::Male } else { Gender::Female };
        let id = spawn(&mut roster, gender, 30.0, 10_000);
        assert!(world.building(flats).unwrap().add_resident(id));
        let h = roster.get_mut(id).unwrap();
        h.residence = Some(flats);
        h.current_building = Some(flats);
    }
    let rules = AgentRules {
        social: SocialRules {
            friendship_probability: 1.0,
            marriage_probability: 0.5,
            min_friendship_years: 0.0,
            min_shared_goals: 0,
            ..SocialRules::default()
        },
        ..AgentRules::default()
    };
    let mut sim = simulation(world, roster, Catalog::default(), rules, 0);
    let _ = run(&mut sim, 48, &mut NoOpCallback).unwrap();

    let married: Vec<AgentId> = sim.roster.alive().filter(|h| h.is_married()).map(|h| h.id).collect();
    assert!(!married.is_empty());
    for id in &married {
        let human = sim.roster.get(*id).unwrap();
        let spouse = sim.roster.get(human.spouse.unwrap()).unwrap();
        assert_eq!(spouse.spouse, Some(*id));
        assert_eq!(spouse.marital_status, MaritalStatus::Married);
        assert_ne!(spouse.gender, human.gender);
        assert!(human.relations.family.contains_key(&spouse.id));
    }
    for human in sim.roster.alive().filter(|h| !h.is_married()) {
        assert!(human.spouse.is_none());
    }

    let a = married[0];
    let b = sim.roster.get(a).unwrap().spouse.unwrap();
    let (x, y) = sim.roster.pair_mut(a, b).unwrap();
    assert!(family::divorce(x, y));
    for id in [a, b] {
        let h = sim.roster.get(id).unwrap();
        assert!(h.spouse.is_none());
        assert_eq!(h.marital_status, MaritalStatus::Single);
    }
}

#[test]
fn wealth_is_conserved_when_an_elder_dies() {
    let lifecycle = LifecycleRules::default();
    let mut roster = Roster::new();
    let elder = spawn(&mut roster, Gender::Female, lifecycle.death_age_female + 0.5, 10_001);
    let son = spawn(&mut roster, Gender::Male, 40.0, 1_000);
    let daughter = spawn(&mut roster, Gender::Female, 38.0, 1_000);
    let h = roster.get_mut(elder).unwrap();
    h.relations.children.insert(son, 40.0);
    h.relations.children.insert(daughter, 38.0);
    let before = roster.ledger().total();
    let mut sim = simulation(town(5, 0), roster, Catalog::default(), AgentRules::default(), 0);

    let summary = sim.step().unwrap();

    assert!(summary.anomaly.is_none());
    let estate = summary.deaths.first().unwrap();
    assert_eq!(estate.agent, elder);
    assert_eq!(estate.inherited, 10_000);
    assert_eq!(estate.closed_with, 1);
    assert_eq!(sim.roster.balance(son), 1_000 - 500 + 5_000);
    assert_eq!(sim.roster.balance(daughter), 1_000 - 500 + 5_000);
    assert_eq!(sim.roster.balance(elder), 0);
    assert_eq!(sim.roster.ledger().total(), before - 1 - 2 * 500);
    assert!(!sim.roster.get(elder).unwrap().is_alive());
}

#[test]
fn spouses_dying_in_the_same_hour_leave_everything_to_the_child() {
    let lifecycle = LifecycleRules::default();
    let mut roster = Roster::new();
    let husband = spawn(&mut roster, Gender::Male, lifecycle.death_age_male + 0.5, 1_000);
    let wife = spawn(&mut roster, Gender::Female, lifecycle.death_age_female + 0.5, 600);
    let child = spawn(&mut roster, Gender::Male, 40.0, 1_000);
    for (one, other) in [(husband, wife), (wife, husband)] {
        let h = roster.get_mut(one).unwrap();
        h.spouse = Some(other);
        h.marital_status = MaritalStatus::Married;
        h.relations.family.insert(other, 30.0);
        h.relations.children.insert(child, 40.0);
    }
    let before = roster.ledger().total();
    let mut sim = simulation(town(5, 0), roster, Catalog::default(), AgentRules::default(), 0);

    let summary = sim.step().unwrap();

    assert!(summary.anomaly.is_none());
    assert_eq!(summary.deaths.len(), 2);
    for estate in &summary.deaths {
        assert_eq!(estate.heirs, std::iter::once(child).collect::<BTreeSet<_>>());
        assert_eq!(estate.closed_with, 0);
    }
    assert_eq!(sim.roster.balance(husband), 0);
    assert_eq!(sim.roster.balance(wife), 0);
    assert_eq!(sim.roster.balance(child), 1_000 - 500 + 1_600);
    assert_eq!(sim.roster.ledger().total(), before - 500);
    assert_eq!(sim.roster.alive().count(), 1);
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn empty_wallet_raises_one_need_money_splash() {
    let mut roster = Roster::new();
    let broke = spawn(&mut roster, Gender::Male, 30.0, 0);
    let mut sim = simulation(town(5, 0), roster, Catalog::default(), AgentRules::default(), 1);

    sim.step().unwrap();
    let human = sim.roster.get(broke).unwrap();
    assert!(human.has_splash(SplashKind::NeedMoney));

    sim.step().unwrap();
    let human = sim.roster.get(broke).unwrap();
    assert_eq!(human.splashes.iter().filter(|s| s.kind == SplashKind::NeedMoney).count(), 1);
}

#[test]
fn marriage_rate_converges_to_the_configured_probability() {
    let world = World::builder().build();
    let rules = SocialRules::default();
    let mut rng = StdRng::seed_from_u64(2024);
    let trials = 4_000_u32;
    let mut weddings = 0_u32;

    for _ in 0..trials {
        let mut roster = Roster::new();
        let groom = spawn(&mut roster, Gender::Male, 30.0, 0);
        let bride = spawn(&mut roster, Gender::Female, 28.0, 0);
        for (one, other) in [(groom, bride), (bride, groom)] {
            let h = roster.get_mut(one).unwrap();
            h.current_building = Some(BuildingId::new(0));
            h.relations.friends.insert(other, 1.0);
            h.goals = (0..3).map(|g| GoalProgress::new(GlobalTargetId::new(g))).collect();
        }
        weddings += form_marriages(&mut roster, &world, &rules, &mut rng);
    }

    // Expected 200 at p = 0.05.
    assert!((140..=260).contains(&weddings), "weddings = {weddings}");
}

#[test]
fn marriage_over_several_hours_follows_the_compound_probability() {
    let world = World::builder().build();
    let rules = SocialRules::default();
    let mut rng = StdRng::seed_from_u64(77);
    let trials = 2_000_u32;
    let hours = 5;
    let mut married = 0_u32;

    for _ in 0..trials {
        let mut roster = Roster::new();
        let groom = spawn(&mut roster, Gender::Male, 30.0, 0);
        let bride = spawn(&mut roster, Gender::Female, 28.0, 0);
        for (one, other) in [(groom, bride), (bride, groom)] {
            let h = roster.get_mut(one).unwrap();
            h.current_building = Some(BuildingId::new(0));
            h.relations.friends.insert(other, 1.0);
            h.goals = (0..3).map(|g| GoalProgress::new(GlobalTargetId::new(g))).collect();
        }
        let weddings: u32 = (0..hours)
            .map(|_| form_marriages(&mut roster, &world, &rules, &mut rng))
            .sum();
        assert!(weddings <= 1);
        married += weddings;
    }

    // 1 - 0.95^5 = 0.226, about 452 of 2000.
    assert!((370..=540).contains(&married), "married = {married}");
}

#[test]
fn unemployed_adult_is_hired_within_one_search_interval() {
    let mut roster = Roster::new();
    let seeker = spawn(&mut roster, Gender::Female, 25.0, 10_000);
    let rules = AgentRules {
        layoff: calm_layoffs(),
        ..AgentRules::default()
    };
    let mut sim = simulation(town(5, 1), roster, Catalog::default(), rules, 1);

    for _ in 1..24 {
        let summary = sim.step().unwrap();
        assert_eq!(summary.hires, 0);
    }
    assert!(!sim.roster.get(seeker).unwrap().is_employed());

    let summary = sim.step().unwrap();
    assert_eq!(summary.hour, 24);
    assert_eq!(summary.hires, 1);
    let human = sim.roster.get(seeker).unwrap();
    assert_eq!(human.payment(), 3_000);
    assert_eq!(human.job_hours, 0);
}

#[test]
fn child_is_born_exactly_at_gestation() {
    let world = town(5, 0);
    let flats = BuildingId::new(0);
    let rules = AgentRules::default();
    let gestation = rules.family.gestation_hours;
    let mut roster = Roster::new();
    let father = spawn(&mut roster, Gender::Male, 32.0, 10_000);
    let mother = spawn(&mut roster, Gender::Female, 30.0, 10_000);
    for (one, other) in [(father, mother), (mother, father)] {
        assert!(world.building(flats).unwrap().add_resident(one));
        let h = roster.get_mut(one).unwrap();
        h.spouse = Some(other);
        h.marital_status = MaritalStatus::Married;
        h.residence = Some(flats);
    }
    let m = roster.get_mut(mother).unwrap();
    m.pregnant = true;
    m.pregnancy_hours = gestation - 2;
    let mut sim = simulation(world, roster, Catalog::default(), rules, 3);

    let first = sim.step().unwrap();
    assert!(first.births.is_empty());
    assert_eq!(sim.roster.get(mother).unwrap().pregnancy_hours, gestation - 1);

    let second = sim.step().unwrap();
    assert_eq!(second.births.len(), 1);
    let child = sim.roster.get(second.births[0]).unwrap();
    assert!(child.age.abs() < f64::EPSILON);
    assert_eq!(child.residence, Some(flats));
    assert!(child.relations.parents.contains_key(&mother));
    assert!(child.relations.parents.contains_key(&father));
    assert_eq!(sim.roster.balance(child.id), 0);
    let mom = sim.roster.get(mother).unwrap();
    assert!(!mom.pregnant);
    assert!(mom.relations.children.contains_key(&child.id));
    assert!(mom.has_splash(SplashKind::ChildBirth));
}

#[test]
fn two_firing_causes_fire_more_often_than_one() {
    let rules = LayoffRules {
        new_hire_rate: 0.02,
        high_salary_rate: 0.02,
        downturn_chance: 0.0,
        random_cut_chance: 0.0,
        age_bias_age: 100.0,
        ..LayoffRules::default()
    };
    let employee = |payment: i64| {
        let mut human = humanity_agents::Human::new(
            AgentId::new(0),
            Gender::Male,
            30.0,
            CityId::new(0),
            &LifecycleRules::default(),
        );
        human.employment = Some(Employment {
            vacancy: VacancyId::new(0),
            job: JobId::new(0),
            building: BuildingId::new(1),
            payment,
        });
        human.job_hours = 10;
        human
    };
    let one_cause = employee(1_000);
    let two_causes = employee(100_000);
    let mut rng = StdRng::seed_from_u64(99);
    let trials = 20_000;

    let fired = |human: &humanity_agents::Human, rng: &mut StdRng| {
        (0..trials)
            .filter_map(|_| layoff::evaluate(human, &rules, rng))
            .collect::<Vec<LayoffCause>>()
    };
    let single = fired(&one_cause, &mut rng);
    let double = fired(&two_causes, &mut rng);

    assert!(single.iter().all(|cause| *cause == LayoffCause::NewHire));
    assert!(double.iter().all(|cause| *cause == LayoffCause::HighSalary));
    // Expected 400 and 800.
    assert!(double.len() * 2 > single.len() * 3, "{} vs {}", double.len(), single.len());
}
