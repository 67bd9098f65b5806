//! Marriage, divorce, pregnancy, birth, and family support.
//!
//! Everything that links two agents runs in the serialized phase and takes
//! both agents mutably. The two exceptions run in the parallel phase and
//! touch only the acting agent plus atomic ledger accounts: conception and
//! [`seek_support`].

use rand::Rng;
use tracing::debug;

use humanity_ledger::{Flow, Ledger};
use humanity_types::{AgentId, BuildingType, CityId, Gender, GlobalTargetId, MaritalStatus};
use humanity_world::World;

use crate::config::{AgentRules, FamilyCoefficientWeights, FamilyRules, SocialRules};
use crate::goals::{Catalog, GoalProgress};
use crate::human::Human;
use crate::roster::{Roster, RosterView};
use crate::splash::SplashKind;

// ---------------------------------------------------------------------------
// Marriage
// ---------------------------------------------------------------------------

/// Whether `a` and `b` may marry.
///
/// Both must be alive and single, of opposite gender, from the same home
/// city, within the age gap, friends for long enough, and share enough
/// active global targets.
pub fn is_compatible(a: &Human, b: &Human, rules: &SocialRules) -> bool {
    a.id != b.id
        && a.is_alive()
        && b.is_alive()
        && !a.is_married()
        && !b.is_married()
        && a.gender != b.gender
        && a.home_city == b.home_city
        && (a.age - b.age).abs() <= rules.max_age_gap
        && a
            .relations
            .friends
            .get(&b.id)
            .is_some_and(|years| *years >= rules.min_friendship_years)
        && a.shared_goals(b) >= rules.min_shared_goals
}

/// Marry `a` and `b`.
///
/// Sets both spouse links and adds each to the other's family. The bride
/// then moves into the groom's residence, selling her old unit back to the
/// city. A failed move (full building) leaves her where she was; the
/// marriage stands either way. Refused when either is already married.
pub fn marry(a: &mut Human, b: &mut Human, world: &World, ledger: &Ledger) -> bool {
    if a.id == b.id || a.is_married() || b.is_married() {
        return false;
    }

    a.marital_status = MaritalStatus::Married;
    a.spouse = Some(b.id);
    b.marital_status = MaritalStatus::Married;
    b.spouse = Some(a.id);
    a.relations.family.entry(b.id).or_insert(0.0);
    b.relations.family.entry(a.id).or_insert(0.0);

    let (bride, groom) = if a.gender == Gender::Female { (a, b) } else { (b, a) };
    if let Some(home) = groom.residence {
        let moved = match bride.residence {
            Some(old) => world.move_to_spouse(bride.id, old, home, ledger),
            None => world.building(home).is_some_and(|b| b.add_resident(bride.id)),
        };
        if moved {
            bride.residence = Some(home);
            bride.current_building = Some(home);
        }
    }

    debug!(bride = %bride.id, groom = %groom.id, "Married");
    true
}

/// End the marriage between `a` and `b`. Refused unless they are married
/// to each other.
pub fn divorce(a: &mut Human, b: &mut Human) -> bool {
    if a.spouse != Some(b.id) || b.spouse != Some(a.id) {
        return false;
    }
    for one in [&mut *a, &mut *b] {
        one.spouse = None;
        one.marital_status = MaritalStatus::Single;
    }
    debug!(a = %a.id, b = %b.id, "Divorced");
    true
}

// ---------------------------------------------------------------------------
// Pregnancy and birth
// ---------------------------------------------------------------------------

/// Family-friendliness of a city: a base plus weighted civic building counts.
pub fn family_coefficient(world: &World, city: CityId, weights: &FamilyCoefficientWeights) -> f64 {
    let count = |kind| f64::from(world.count_of(city, kind));
    weights.base
        + count(BuildingType::Hospital) * weights.hospital
        + count(BuildingType::School) * weights.school
        + count(BuildingType::Entertainment) * weights.entertainment
        + count(BuildingType::Cafe) * weights.cafe
        + count(BuildingType::Shop) * weights.shop
}

/// Hourly conception probability for a city coefficient, in `[0, 1]`.
pub fn conception_probability(rules: &FamilyRules, coefficient: f64) -> f64 {
    if rules.hours_per_month <= 0.0 {
        return 0.0;
    }
    (rules.monthly_conception_rate / rules.hours_per_month * coefficient).clamp(0.0, 1.0)
}

/// Whether a woman is ready to plan a child this hour.
pub fn should_plan_child(human: &Human, view: &RosterView, catalog: &Catalog, rules: &FamilyRules) -> bool {
    let Some(spouse) = human.spouse else {
        return false;
    };
    let wants_family = human
        .goals
        .iter()
        .filter_map(|goal| catalog.global(goal.target))
        .any(|global| global.name == rules.family_goal);
    human.gender == Gender::Female
        && human.is_alive()
        && human.is_married()
        && !human.pregnant
        && human.age >= rules.min_parent_age
        && human.age <= rules.max_mother_age
        && human
            .relations
            .family
            .get(&spouse)
            .is_some_and(|years| *years >= rules.min_marriage_years)
        && wants_family
        && human.payment().saturating_add(view.payment(spouse)) >= rules.min_family_income
        && human.relations.children.len() < rules.max_children
}

/// Try to conceive this hour. Returns `true` on conception.
pub fn try_conceive(
    human: &mut Human,
    view: &RosterView,
    catalog: &Catalog,
    world: &World,
    rules: &FamilyRules,
    hour: u64,
    rng: &mut impl Rng,
) -> bool {
    if !should_plan_child(human, view, catalog, rules) {
        return false;
    }
    let coefficient = family_coefficient(world, human.home_city, &rules.coefficient);
    if !rng.random_bool(conception_probability(rules, coefficient)) {
        return false;
    }
    human.pregnant = true;
    human.pregnancy_hours = 0;
    human.add_splash(SplashKind::Pregnancy, catalog.splash_tags(SplashKind::Pregnancy), hour);
    true
}

/// Whether a pregnancy has reached term.
pub const fn is_due(human: &Human, rules: &FamilyRules) -> bool {
    human.pregnant && !human.dead && human.pregnancy_hours >= rules.gestation_hours
}

/// Attributes of a newborn decided by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Newborn {
    /// Gender of the child.
    pub gender: Gender,
    /// Global targets assigned at birth.
    pub goals: Vec<GlobalTargetId>,
}

/// Deliver the child of a due mother.
///
/// The child is aged zero, holds no money, lives in the mother's residence
/// without being registered as a resident, and is linked to both parents.
/// Both parents get a `child_birth` splash. Returns `None` if the mother is
/// unknown or not due, or if the roster is full.
pub fn deliver(
    roster: &mut Roster,
    mother: AgentId,
    newborn: Newborn,
    rules: &AgentRules,
    catalog: &Catalog,
    hour: u64,
) -> Option<AgentId> {
    let (home_city, residence, father) = {
        let mom = roster.get_mut(mother)?;
        if !is_due(mom, &rules.family) {
            return None;
        }
        mom.pregnant = false;
        mom.pregnancy_hours = 0;
        (mom.home_city, mom.residence, mom.spouse)
    };

    let child = roster.spawn(newborn.gender, 0.0, home_city, 0, &rules.lifecycle).ok()?;
    let splash_tags = catalog.splash_tags(SplashKind::ChildBirth);
    if let Some(baby) = roster.get_mut(child) {
        baby.residence = residence;
        baby.current_building = residence;
        baby.goals = newborn.goals.into_iter().map(GoalProgress::new).collect();
        baby.relations.parents.insert(mother, 0.0);
        if let Some(father) = father {
            baby.relations.parents.insert(father, 0.0);
        }
    }
    for parent in [Some(mother), father].into_iter().flatten() {
        if let Some(p) = roster.get_mut(parent) {
            p.relations.children.insert(child, 0.0);
            p.add_splash(SplashKind::ChildBirth, splash_tags.clone(), hour);
        }
    }

    debug!(child = %child, mother = %mother, "Child born");
    Some(child)
}

// ---------------------------------------------------------------------------
// Support
// ---------------------------------------------------------------------------

/// Cover a negative balance from family, then children, then parents.
///
/// Each pull is capped at the remaining debt and the donor's balance.
/// Returns the total received.
pub fn seek_support(human: &Human, ledger: &Ledger) -> i64 {
    let mut received: i64 = 0;
    for donor in human.relations.supporters() {
        let debt = ledger.balance(human.id).saturating_neg();
        if debt <= 0 {
            break;
        }
        received = received.saturating_add(ledger.transfer_up_to(donor, human.id, debt, Flow::FamilySupport));
    }
    received
}
