//! Greedy goal planning.
//!
//! Each planning step walks the goal hierarchy top-down:
//!
//! 1. score every active global target (splash relevance or executability,
//!    weighted by power) and pick among the best uniformly at random;
//! 2. pick the executable local target covering most open target tags;
//! 3. pick the feasible action covering most open local tags.
//!
//! Ties at every level are broken uniformly at random, never by order.

use std::cmp::Ordering;

use rand::Rng;

use humanity_types::{ActionId, GlobalTargetId, LocalTargetId};

use crate::goals::action::Action;
use crate::goals::catalog::{Catalog, GlobalTarget};
use crate::goals::progress::{Completion, GoalProgress};
use crate::splash::Splash;

/// Totally ordered wrapper for float scores.
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One planning decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Position of the chosen goal in the agent's active goals.
    pub goal: usize,
    /// Chosen local target.
    pub local: LocalTargetId,
    /// Chosen action.
    pub action: ActionId,
}

/// Pick uniformly among the items with the greatest key.
pub fn pick_uniform_max<T, K, R>(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> K, rng: &mut R) -> Option<T>
where
    K: Ord,
    R: Rng + ?Sized,
{
    let mut best: Vec<T> = Vec::new();
    let mut best_key: Option<K> = None;
    for item in items {
        let k = key(&item);
        match best_key.as_ref().map(|current| k.cmp(current)) {
            Some(Ordering::Less) => {}
            Some(Ordering::Equal) => best.push(item),
            Some(Ordering::Greater) | None => {
                best.clear();
                best.push(item);
                best_key = Some(k);
            }
        }
    }
    if best.is_empty() {
        return None;
    }
    let chosen = rng.random_range(0..best.len());
    best.into_iter().nth(chosen)
}

fn fraction(part: usize, whole: usize) -> f64 {
    let to_f64 = |n: usize| u32::try_from(n).map_or(f64::from(u32::MAX), f64::from);
    if whole == 0 {
        0.0
    } else {
        to_f64(part) / to_f64(whole)
    }
}

/// Planner score of one active goal.
///
/// With splashes present: power times the fraction of splashes whose tags
/// intersect the target. Without: power if executable, else zero.
pub fn score(
    progress: &GoalProgress,
    global: &GlobalTarget,
    catalog: &Catalog,
    splashes: &[Splash],
    feasible: &impl Fn(&Action) -> bool,
) -> f64 {
    if splashes.is_empty() {
        if progress.is_executable(catalog, feasible) {
            global.power
        } else {
            0.0
        }
    } else {
        let relevant = splashes.iter().filter(|s| s.tags.intersects(&global.tags)).count();
        global.power * fraction(relevant, splashes.len())
    }
}

/// Choose the next action for an agent, if any.
pub fn plan<R: Rng + ?Sized>(
    goals: &[GoalProgress],
    splashes: &[Splash],
    catalog: &Catalog,
    feasible: &impl Fn(&Action) -> bool,
    rng: &mut R,
) -> Option<Plan> {
    let scored = goals.iter().enumerate().filter_map(|(index, progress)| {
        let global = catalog.global(progress.target)?;
        let value = Score(score(progress, global, catalog, splashes, feasible));
        Some((index, progress, global, value))
    });
    let (goal, progress, global, _) = pick_uniform_max(scored, |entry| entry.3, rng)?;

    let open_target = progress.open_target_tags(catalog, global);
    let locals = progress
        .pending_locals(global)
        .filter_map(|id| catalog.local(id))
        .filter(|local| progress.local_is_executable(catalog, local, feasible));
    let local = pick_uniform_max(locals, |local| local.tags.intersection_len(&open_target), rng)?;

    let open_local = progress.open_local_tags(catalog, local);
    let actions = progress
        .pending_actions(local)
        .filter_map(|id| catalog.action(id))
        .filter(|action| feasible(action));
    let action = pick_uniform_max(actions, |action| action.tags.intersection_len(&open_local), rng)?;

    Some(Plan {
        goal,
        local: local.id,
        action: action.id,
    })
}

/// Record a plan's action and move a finished goal to `completed`.
pub fn commit(
    goals: &mut Vec<GoalProgress>,
    completed: &mut Vec<GlobalTargetId>,
    catalog: &Catalog,
    plan: Plan,
) -> Completion {
    let Some(progress) = goals.get_mut(plan.goal) else {
        return Completion::Action;
    };
    let completion = progress.record(catalog, plan.local, plan.action);
    if completion == Completion::GlobalTarget {
        let finished = goals.remove(plan.goal);
        completed.push(finished.target);
    }
    completion
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::goals::catalog::{ActionSpec, GlobalTargetSpec, LocalTargetSpec};
    use crate::splash::SplashKind;

    fn names(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| (*t).to_owned()).collect()
    }

    fn catalog() -> Catalog {
        let action = |name: &str, tags: &[&str]| ActionSpec {
            name: name.to_owned(),
            duration: 1,
            tags: names(tags),
            ..ActionSpec::default()
        };
        let local = |name: &str, tags: &[&str]| LocalTargetSpec {
            name: name.to_owned(),
            tags: names(tags),
        };
        let global = |name: &str, power: f64, tags: &[&str]| GlobalTargetSpec {
            name: name.to_owned(),
            power,
            tags: names(tags),
        };
        Catalog::build(
            vec![
                action("work", &["money"]),
                action("overtime", &["money", "stress"]),
                action("jog", &["health"]),
            ],
            vec![local("earn", &["money", "stress"]), local("exercise", &["health"])],
            vec![global("wealth", 2.0, &["money", "stress"]), global("fitness", 1.0, &["health"])],
        )
        .unwrap_or_default()
    }

    fn goals() -> Vec<GoalProgress> {
        vec![
            GoalProgress::new(GlobalTargetId::new(0)),
            GoalProgress::new(GlobalTargetId::new(1)),
        ]
    }

    fn anything(_: &Action) -> bool {
        true
    }

    #[test]
    fn highest_power_wins_without_splashes() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(5);
        let plan = plan(&goals(), &[], &catalog, &anything, &mut rng);
        assert_eq!(plan.map(|p| p.goal), Some(0));
        // `overtime` covers both open tags of `earn`.
        assert_eq!(plan.map(|p| p.action), Some(ActionId::new(1)));
    }

    #[test]
    fn splashes_redirect_the_choice() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(5);
        let health = catalog.tags().known_set(["health"]);
        let splash = Splash {
            kind: SplashKind::Pregnancy,
            tags: health,
            appeared_at: 0,
            lifetime: 10,
        };
        let plan = plan(&goals(), &[splash], &catalog, &anything, &mut rng);
        assert_eq!(plan.map(|p| p.goal), Some(1));
    }

    #[test]
    fn nothing_feasible_means_no_plan() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(5);
        assert!(plan(&goals(), &[], &catalog, &|_: &Action| false, &mut rng).is_none());
    }

    #[test]
    fn ties_are_broken_uniformly() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut counts: BTreeMap<u8, u32> = BTreeMap::new();
        for _ in 0..3000 {
            if let Some(pick) = pick_uniform_max([1_u8, 2, 3, 0], |v| u8::from(*v > 0), &mut rng) {
                let seen = counts.entry(pick).or_default();
                *seen = seen.saturating_add(1);
            }
        }
        assert!(!counts.contains_key(&0));
        for value in [1, 2, 3] {
            let seen = counts.get(&value).copied().unwrap_or(0);
            assert!((800..1200).contains(&seen), "{value}: {seen}");
        }
    }

    #[test]
    fn commit_moves_finished_goals() {
        let catalog = catalog();
        let mut goals = goals();
        let mut completed = Vec::new();
        let plan = Plan {
            goal: 1,
            local: LocalTargetId::new(1),
            action: ActionId::new(2),
        };
        assert_eq!(commit(&mut goals, &mut completed, &catalog, plan), Completion::GlobalTarget);
        assert_eq!(goals.len(), 1);
        assert_eq!(completed, vec![GlobalTargetId::new(1)]);
    }
}
