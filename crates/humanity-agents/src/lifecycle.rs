//! The hourly update of one agent.
//!
//! [`iterate_hour`] runs inside the parallel phase. It mutates only the
//! agent it is given, plus the shared registries and ledger through their
//! own locks and atomics. Everything it needs to know about other agents
//! comes from the [`RosterView`] snapshot taken before the phase started.
//! Effects that link two agents are reported back in [`HourOutcome`] for
//! the serialized phase.

use rand::Rng;

use humanity_ledger::{Flow, Ledger};
use humanity_types::{ActionId, BuildingType, Gender};
use humanity_world::World;

use crate::config::AgentRules;
use crate::death;
use crate::family;
use crate::goals::{Action, ActionEffect, Catalog, Completion, Eligibility, commit, plan};
use crate::human::Human;
use crate::job_market::{self, JobChange};
use crate::roster::RosterView;
use crate::splash::SplashKind;

/// Calendar facts about the current hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Moment {
    /// Absolute hour index.
    pub hour: u64,
    /// First hour of a day.
    pub day_start: bool,
    /// First hour of a month.
    pub month_start: bool,
    /// Inside the work window of a workday.
    pub at_work: bool,
    /// Inside the nightly rest window.
    pub rest: bool,
}

/// Everything an agent reads during its hourly update.
#[derive(Debug, Clone, Copy)]
pub struct HourContext<'a> {
    /// The current hour.
    pub moment: Moment,
    /// Behaviour parameters.
    pub rules: &'a AgentRules,
    /// Goal and action templates.
    pub catalog: &'a Catalog,
    /// Buildings and jobs.
    pub world: &'a World,
    /// Money.
    pub ledger: &'a Ledger,
    /// Start-of-hour snapshot of every agent.
    pub view: &'a RosterView,
}

/// What happened to one agent during its update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourOutcome {
    /// The agent died this hour. Its estate is settled in the serialized
    /// phase.
    pub died: bool,
    /// A `meet_new_person` action ran; the serialized phase introduces
    /// someone.
    pub wants_acquaintance: bool,
    /// Became pregnant this hour.
    pub conceived: bool,
    /// Job-market result.
    pub job_change: JobChange,
    /// Action started this hour.
    pub action: Option<ActionId>,
    /// How far the action's completion cascaded.
    pub completion: Option<Completion>,
    /// Bought an apartment this hour.
    pub bought_home: bool,
}

/// Run one hour of an agent's life.
///
/// The steps run in a fixed order; death, the rest window, and an action
/// in progress each end the update early. Dead agents are left untouched.
pub fn iterate_hour(human: &mut Human, ctx: &HourContext<'_>, rng: &mut impl Rng) -> HourOutcome {
    let mut outcome = HourOutcome::default();
    if human.dead {
        return outcome;
    }
    let hour = ctx.moment.hour;
    let lifecycle = &ctx.rules.lifecycle;
    let year_fraction = lifecycle.year_fraction_per_hour();

    if ctx.ledger.balance(human.id) <= 0 && !human.has_splash(SplashKind::NeedMoney) {
        human.add_splash(SplashKind::NeedMoney, ctx.catalog.splash_tags(SplashKind::NeedMoney), hour);
    }

    human.relations.age_all(year_fraction);

    human.job_hours = if human.is_employed() {
        human.job_hours.saturating_add(1)
    } else {
        lifecycle.unemployed_job_hours
    };

    human.splashes.retain(|splash| !splash.is_expired(hour));

    if death::is_due(human, lifecycle) {
        outcome.died = death::die(human, ctx.world);
        return outcome;
    }

    human.age += year_fraction;

    settle_accounts(human, ctx);

    if human.gender == Gender::Female {
        if human.pregnant {
            human.pregnancy_hours = human.pregnancy_hours.saturating_add(1);
        } else {
            outcome.conceived =
                family::try_conceive(human, ctx.view, ctx.catalog, ctx.world, &ctx.rules.family, hour, rng);
        }
    }

    if ctx.ledger.balance(human.id) < 0 {
        family::seek_support(human, ctx.ledger);
    }

    outcome.job_change = job_market::check(human, ctx.world, ctx.ledger, ctx.catalog, &ctx.rules.jobs, hour, rng);

    move_by_schedule(human, ctx.moment);

    if ctx.moment.rest {
        return outcome;
    }

    if human.busy_hours > 0 {
        human.busy_hours = human.busy_hours.saturating_sub(1);
        return outcome;
    }

    perform_action(human, ctx, rng, &mut outcome);
    outcome
}

/// Daily living costs and monthly salary.
fn settle_accounts(human: &Human, ctx: &HourContext<'_>) {
    let economy = &ctx.rules.economy;
    if ctx.moment.day_start {
        let children = human
            .relations
            .children
            .keys()
            .filter(|child| ctx.view.is_alive(**child))
            .count();
        let children = i64::try_from(children).unwrap_or(i64::MAX);
        let expense = economy
            .daily_expense
            .saturating_add(economy.daily_expense_per_child.saturating_mul(children));
        ctx.ledger.debit(human.id, expense, Flow::LivingExpense);
    }
    if ctx.moment.month_start && human.is_employed() {
        ctx.ledger.credit(human.id, human.payment(), Flow::Salary);
    }
}

/// Home during rest and off hours, at the workplace during work hours.
/// An agent without a residence stays where it is off hours.
fn move_by_schedule(human: &mut Human, moment: Moment) {
    match (human.work_building(), human.residence) {
        (Some(work), _) if moment.at_work && !moment.rest => human.current_building = Some(work),
        (_, Some(home)) => human.current_building = Some(home),
        _ => {}
    }
}

/// Own balance plus close family balances.
fn family_cash(human: &Human, ledger: &Ledger) -> i64 {
    human
        .relations
        .family
        .keys()
        .map(|relative| ledger.balance(*relative))
        .fold(ledger.balance(human.id), i64::saturating_add)
}

/// Plan, pay for, and apply the next action.
fn perform_action(human: &mut Human, ctx: &HourContext<'_>, rng: &mut impl Rng, outcome: &mut HourOutcome) {
    let chosen = {
        let subject = Eligibility {
            cash: family_cash(human, ctx.ledger),
            job_hours: i64::from(human.job_hours),
            items: &human.items,
        };
        let feasible = |action: &Action| action.is_feasible(&subject);
        plan(&human.goals, &human.splashes, ctx.catalog, &feasible, rng)
    };
    let Some(chosen) = chosen else {
        return;
    };
    let Some(action) = ctx.catalog.action(chosen.action) else {
        return;
    };

    if action.price != 0 {
        ctx.ledger.debit(human.id, action.price, Flow::ActionPrice);
    }
    action.apply_items(&mut human.items);
    if action.bonus != 0 {
        ctx.ledger.credit(human.id, action.bonus, Flow::ActionBonus);
    }
    human.busy_hours = action.duration.saturating_sub(1);

    match action.effect {
        ActionEffect::None => {}
        ActionEffect::FindJob => {
            let change = job_market::find_job(human, ctx.world, ctx.ledger, &ctx.rules.jobs, rng);
            if change != JobChange::None {
                outcome.job_change = change;
            }
        }
        ActionEffect::MeetNewPerson => outcome.wants_acquaintance = true,
        ActionEffect::BuyApartment => outcome.bought_home = buy_home(human, ctx.world, ctx.ledger),
    }

    outcome.action = Some(action.id);
    outcome.completion = Some(commit(&mut human.goals, &mut human.completed_goals, ctx.catalog, chosen));
}

/// Buy the first affordable apartment with room in the home city.
/// Agents that already have a residence keep it.
pub fn buy_home(human: &mut Human, world: &World, ledger: &Ledger) -> bool {
    if human.residence.is_some() {
        return false;
    }
    let bought = world
        .buildings_of(human.home_city, BuildingType::ResidentialHouse)
        .find(|building| building.buy_apartment(human.id, ledger))
        .map(|building| building.id);
    if bought.is_some() {
        human.residence = bought;
        human.current_building = bought;
    }
    bought.is_some()
}
