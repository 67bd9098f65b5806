//! The immutable template catalog shared by every agent.
//!
//! Templates are loaded once at startup. Tags are interned into a single
//! [`TagInterner`]; each target precomputes the children whose tags
//! intersect its own, so the hourly planner never compares strings.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::IndexedRandom;

use humanity_types::{ActionId, GlobalTargetId, LocalTargetId, TagInterner, TagSet};

use crate::error::CatalogError;
use crate::goals::action::{Action, ActionEffect, Rule};
use crate::splash::SplashKind;

// ---------------------------------------------------------------------------
// Template specs (loader output)
// ---------------------------------------------------------------------------

/// An action as read from a template file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSpec {
    /// Unique name.
    pub name: String,
    /// Price debited when applied.
    pub price: i64,
    /// Busy hours.
    pub duration: u32,
    /// Bonus credited when applied.
    pub bonus: i64,
    /// Tag names.
    pub tags: Vec<String>,
    /// Comparison expressions such as `cash>=1000`.
    pub rules: Vec<String>,
    /// Items that must be held, with minimum counts.
    pub required_items: BTreeMap<String, i64>,
    /// Items consumed.
    pub consumed_items: BTreeMap<String, i64>,
    /// Items produced.
    pub produced_items: BTreeMap<String, i64>,
}

/// A local target as read from a template file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalTargetSpec {
    /// Unique name.
    pub name: String,
    /// Tag names.
    pub tags: Vec<String>,
}

/// A global target as read from a template file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalTargetSpec {
    /// Unique name.
    pub name: String,
    /// Planner weight.
    pub power: f64,
    /// Tag names.
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// Compiled templates
// ---------------------------------------------------------------------------

/// A mid-term goal covered by actions.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTarget {
    /// Catalog id.
    pub id: LocalTargetId,
    /// Unique name.
    pub name: String,
    /// Tags to cover.
    pub tags: TagSet,
    /// Actions sharing at least one tag.
    pub possible: Vec<ActionId>,
}

/// A long-term goal covered by local targets.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalTarget {
    /// Catalog id.
    pub id: GlobalTargetId,
    /// Unique name.
    pub name: String,
    /// Planner weight.
    pub power: f64,
    /// Tags to cover.
    pub tags: TagSet,
    /// Local targets sharing at least one tag.
    pub possible: Vec<LocalTargetId>,
}

/// All templates plus the tag interner.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tags: TagInterner,
    actions: Vec<Action>,
    locals: Vec<LocalTarget>,
    globals: Vec<GlobalTarget>,
    splash_tags: BTreeMap<SplashKind, TagSet>,
}

impl Catalog {
    /// Compile template specs into a catalog.
    ///
    /// # Errors
    ///
    /// Rejects duplicate names, templates without tags, unparsable rules,
    /// negative prices, zero durations, and invalid powers.
    pub fn build(
        actions: Vec<ActionSpec>,
        locals: Vec<LocalTargetSpec>,
        globals: Vec<GlobalTargetSpec>,
    ) -> Result<Self, CatalogError> {
        let mut tags = TagInterner::new();

        let mut compiled_actions = Vec::with_capacity(actions.len());
        let mut names = BTreeSet::new();
        for (index, spec) in actions.into_iter().enumerate() {
            unique(&mut names, "action", &spec.name)?;
            let tag_set = intern_all(&mut tags, "action", &spec.name, &spec.tags)?;
            if spec.price < 0 {
                return Err(CatalogError::InvalidAction {
                    name: spec.name,
                    reason: "price must not be negative",
                });
            }
            if spec.duration == 0 {
                return Err(CatalogError::InvalidAction {
                    name: spec.name,
                    reason: "duration must be at least one hour",
                });
            }
            let rules = spec
                .rules
                .iter()
                .map(|text| text.parse::<Rule>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| CatalogError::InvalidRule {
                    action: spec.name.clone(),
                    source,
                })?;
            compiled_actions.push(Action {
                id: ActionId::from_index(index).ok_or(CatalogError::Overflow { entity: "actions" })?,
                effect: ActionEffect::for_name(&spec.name),
                name: spec.name,
                price: spec.price,
                duration: spec.duration,
                bonus: spec.bonus,
                tags: tag_set,
                rules,
                required_items: spec.required_items,
                consumed_items: spec.consumed_items,
                produced_items: spec.produced_items,
            });
        }

        let mut compiled_locals = Vec::with_capacity(locals.len());
        let mut names = BTreeSet::new();
        for (index, spec) in locals.into_iter().enumerate() {
            unique(&mut names, "local target", &spec.name)?;
            let tag_set = intern_all(&mut tags, "local target", &spec.name, &spec.tags)?;
            let possible = compiled_actions
                .iter()
                .filter(|action| action.tags.intersects(&tag_set))
                .map(|action| action.id)
                .collect();
            compiled_locals.push(LocalTarget {
                id: LocalTargetId::from_index(index).ok_or(CatalogError::Overflow { entity: "local targets" })?,
                name: spec.name,
                tags: tag_set,
                possible,
            });
        }

        let mut compiled_globals = Vec::with_capacity(globals.len());
        let mut names = BTreeSet::new();
        for (index, spec) in globals.into_iter().enumerate() {
            unique(&mut names, "global target", &spec.name)?;
            if !spec.power.is_finite() || spec.power < 0.0 {
                return Err(CatalogError::InvalidPower {
                    name: spec.name,
                    power: spec.power,
                });
            }
            let tag_set = intern_all(&mut tags, "global target", &spec.name, &spec.tags)?;
            let possible = compiled_locals
                .iter()
                .filter(|local| local.tags.intersects(&tag_set))
                .map(|local| local.id)
                .collect();
            compiled_globals.push(GlobalTarget {
                id: GlobalTargetId::from_index(index).ok_or(CatalogError::Overflow { entity: "global targets" })?,
                name: spec.name,
                power: spec.power,
                tags: tag_set,
                possible,
            });
        }

        let mut splash_tags = BTreeMap::new();
        for kind in SplashKind::ALL {
            let mut set = TagSet::new();
            for name in kind.tag_names() {
                set.insert(tags.intern(name).ok_or(CatalogError::Overflow { entity: "tags" })?);
            }
            splash_tags.insert(kind, set);
        }

        Ok(Self {
            tags,
            actions: compiled_actions,
            locals: compiled_locals,
            globals: compiled_globals,
            splash_tags,
        })
    }

    /// Tag names and ids.
    pub const fn tags(&self) -> &TagInterner {
        &self.tags
    }

    /// Every action.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Every local target.
    pub fn locals(&self) -> &[LocalTarget] {
        &self.locals
    }

    /// Every global target.
    pub fn globals(&self) -> &[GlobalTarget] {
        &self.globals
    }

    /// Look up an action.
    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id.index())
    }

    /// Look up a local target.
    pub fn local(&self, id: LocalTargetId) -> Option<&LocalTarget> {
        self.locals.get(id.index())
    }

    /// Look up a global target.
    pub fn global(&self, id: GlobalTargetId) -> Option<&GlobalTarget> {
        self.globals.get(id.index())
    }

    /// Find a global target by name.
    pub fn global_by_name(&self, name: &str) -> Option<&GlobalTarget> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Interned tags of a splash kind.
    pub fn splash_tags(&self, kind: SplashKind) -> TagSet {
        self.splash_tags.get(&kind).cloned().unwrap_or_default()
    }

    /// Draw between `min` and `max` (inclusive) distinct global targets.
    pub fn sample_goals(&self, rng: &mut impl Rng, min: usize, max: usize) -> Vec<GlobalTargetId> {
        let upper = max.min(self.globals.len());
        let lower = min.min(upper);
        let count = if upper > lower {
            rng.random_range(lower..=upper)
        } else {
            upper
        };
        self.globals
            .choose_multiple(rng, count)
            .map(|global| global.id)
            .collect()
    }
}

fn unique(seen: &mut BTreeSet<String>, kind: &'static str, name: &str) -> Result<(), CatalogError> {
    if seen.insert(name.to_owned()) {
        Ok(())
    } else {
        Err(CatalogError::DuplicateName {
            kind,
            name: name.to_owned(),
        })
    }
}

fn intern_all(
    interner: &mut TagInterner,
    kind: &'static str,
    name: &str,
    tags: &[String],
) -> Result<TagSet, CatalogError> {
    if tags.is_empty() {
        return Err(CatalogError::EmptyTags {
            kind,
            name: name.to_owned(),
        });
    }
    let mut set = TagSet::new();
    for tag in tags {
        set.insert(interner.intern(tag).ok_or(CatalogError::Overflow { entity: "tags" })?);
    }
    Ok(set)
}
