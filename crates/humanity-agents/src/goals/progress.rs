//! Per-agent progress through one global target.
//!
//! Templates are shared; what an agent has already done lives here, keyed
//! by template id. Executed sets only grow until the whole goal completes
//! and the record is dropped.

use std::collections::{BTreeMap, BTreeSet};

use humanity_types::{ActionId, GlobalTargetId, LocalTargetId, TagSet};

use crate::goals::action::Action;
use crate::goals::catalog::{Catalog, GlobalTarget, LocalTarget};

/// Deepest level closed by recording an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Completion {
    /// Only the action was recorded.
    Action,
    /// The local target is now fully covered.
    LocalTarget,
    /// The global target is now fully covered.
    GlobalTarget,
}

/// One agent's progress through one global target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalProgress {
    /// Template this record tracks.
    pub target: GlobalTargetId,
    executed_locals: BTreeSet<LocalTargetId>,
    executed_actions: BTreeMap<LocalTargetId, BTreeSet<ActionId>>,
}

impl GoalProgress {
    /// A fresh record with nothing executed.
    pub const fn new(target: GlobalTargetId) -> Self {
        Self {
            target,
            executed_locals: BTreeSet::new(),
            executed_actions: BTreeMap::new(),
        }
    }

    /// Local targets already covered.
    pub const fn executed_locals(&self) -> &BTreeSet<LocalTargetId> {
        &self.executed_locals
    }

    /// Whether `action` has been executed towards `local`.
    pub fn is_action_executed(&self, local: LocalTargetId, action: ActionId) -> bool {
        self.executed_actions
            .get(&local)
            .is_some_and(|done| done.contains(&action))
    }

    /// Number of actions executed across all local targets.
    pub fn executed_action_count(&self) -> usize {
        self.executed_actions.values().map(BTreeSet::len).sum()
    }

    /// Tags of `local` not yet covered by its executed actions.
    pub fn open_local_tags(&self, catalog: &Catalog, local: &LocalTarget) -> TagSet {
        let mut closed = TagSet::new();
        for action in self
            .executed_actions
            .get(&local.id)
            .into_iter()
            .flatten()
            .filter_map(|id| catalog.action(*id))
        {
            closed.union_with(&action.tags);
        }
        local.tags.difference(&closed)
    }

    /// Tags of `global` not yet covered by executed local targets.
    pub fn open_target_tags(&self, catalog: &Catalog, global: &GlobalTarget) -> TagSet {
        let mut closed = TagSet::new();
        for local in self.executed_locals.iter().filter_map(|id| catalog.local(*id)) {
            closed.union_with(&local.tags);
        }
        global.tags.difference(&closed)
    }

    /// Possible local targets not yet executed.
    pub fn pending_locals<'a>(&'a self, global: &'a GlobalTarget) -> impl Iterator<Item = LocalTargetId> + 'a {
        global
            .possible
            .iter()
            .copied()
            .filter(|id| !self.executed_locals.contains(id))
    }

    /// Possible actions of `local` not yet executed.
    pub fn pending_actions<'a>(&'a self, local: &'a LocalTarget) -> impl Iterator<Item = ActionId> + 'a {
        local
            .possible
            .iter()
            .copied()
            .filter(|id| !self.is_action_executed(local.id, *id))
    }

    /// Whether feasible pending actions can cover every open tag of `local`.
    pub fn local_is_executable(
        &self,
        catalog: &Catalog,
        local: &LocalTarget,
        feasible: &impl Fn(&Action) -> bool,
    ) -> bool {
        let mut open = self.open_local_tags(catalog, local);
        for action in self
            .pending_actions(local)
            .filter_map(|id| catalog.action(id))
            .filter(|action| feasible(action))
        {
            open = open.difference(&action.tags);
        }
        open.is_empty()
    }

    /// Whether executable pending local targets can cover every open tag.
    pub fn is_executable(&self, catalog: &Catalog, feasible: &impl Fn(&Action) -> bool) -> bool {
        let Some(global) = catalog.global(self.target) else {
            return false;
        };
        let mut open = self.open_target_tags(catalog, global);
        for local in self
            .pending_locals(global)
            .filter_map(|id| catalog.local(id))
            .filter(|local| self.local_is_executable(catalog, local, feasible))
        {
            open = open.difference(&local.tags);
        }
        open.is_empty()
    }

    /// Record `action` as executed towards `local` and cascade completion.
    pub fn record(&mut self, catalog: &Catalog, local: LocalTargetId, action: ActionId) -> Completion {
        self.executed_actions.entry(local).or_default().insert(action);

        let Some(local_target) = catalog.local(local) else {
            return Completion::Action;
        };
        if !self.open_local_tags(catalog, local_target).is_empty() {
            return Completion::Action;
        }
        self.executed_locals.insert(local);

        let Some(global) = catalog.global(self.target) else {
            return Completion::LocalTarget;
        };
        if self.open_target_tags(catalog, global).is_empty() {
            Completion::GlobalTarget
        } else {
            Completion::LocalTarget
        }
    }
}
