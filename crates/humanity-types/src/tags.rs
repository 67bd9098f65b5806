//! Interned tags and bitset tag sets.
//!
//! Goal templates, splashes, and vacancy requirements are all described by
//! string tags. Tags are interned once at load time into small integers so
//! that the hot per-hour coverage tests (intersection, union, subset) are
//! word-wise bit operations instead of string-set operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of tag bits stored per word.
const WORD_BITS: usize = 64;

/// An interned tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagId(pub u16);

impl TagId {
    /// Word index and bit mask of this tag inside a [`TagSet`].
    const fn slot(self) -> (usize, u64) {
        let bit = self.0 as usize;
        (bit / WORD_BITS, 1_u64 << (bit % WORD_BITS))
    }
}

/// Maps tag names to dense [`TagId`]s and back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagInterner {
    names: Vec<String>,
    index: BTreeMap<String, TagId>,
}

impl TagInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `name`, interning it on first sight.
    ///
    /// Returns `None` once `u16::MAX` distinct tags exist.
    pub fn intern(&mut self, name: &str) -> Option<TagId> {
        if let Some(id) = self.index.get(name) {
            return Some(*id);
        }
        let id = TagId(u16::try_from(self.names.len()).ok()?);
        self.names.push(name.to_owned());
        self.index.insert(name.to_owned(), id);
        Some(id)
    }

    /// Look up an already-interned tag.
    pub fn get(&self, name: &str) -> Option<TagId> {
        self.index.get(name).copied()
    }

    /// The name of an interned tag.
    pub fn name(&self, id: TagId) -> Option<&str> {
        self.names.get(usize::from(id.0)).map(String::as_str)
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no tag has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Build a set from names that are already known. Unknown names are
    /// skipped: a tag no template mentions can never intersect a template.
    pub fn known_set<'a, I>(&self, names: I) -> TagSet
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().filter_map(|name| self.get(name)).collect()
    }

    /// Render a set back to names, for logs.
    pub fn names_of(&self, set: &TagSet) -> Vec<&str> {
        set.iter().filter_map(|id| self.name(id)).collect()
    }
}

/// A set of interned tags stored as a growable bitset.
///
/// Sets of different word lengths interoperate; missing words read as zero.
/// Equality ignores trailing zero words.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct TagSet {
    words: Vec<u64>,
}

impl PartialEq for TagSet {
    fn eq(&self, other: &Self) -> bool {
        let longest = self.words.len().max(other.words.len());
        (0..longest).all(|i| self.word(i) == other.word(i))
    }
}

impl TagSet {
    /// Create an empty set.
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    fn word(&self, i: usize) -> u64 {
        self.words.get(i).copied().unwrap_or(0)
    }

    /// Add a tag. Returns `true` if it was not present.
    pub fn insert(&mut self, tag: TagId) -> bool {
        let (word, mask) = tag.slot();
        if self.words.len() <= word {
            self.words.resize(word.saturating_add(1), 0);
        }
        self.words.get_mut(word).is_some_and(|slot| {
            let fresh = *slot & mask == 0;
            *slot |= mask;
            fresh
        })
    }

    /// Whether the tag is in the set.
    pub fn contains(&self, tag: TagId) -> bool {
        let (word, mask) = tag.slot();
        self.word(word) & mask != 0
    }

    /// Number of tags in the set.
    pub fn len(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.count_ones() as usize)
            .fold(0, usize::saturating_add)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Whether the two sets share at least one tag.
    pub fn intersects(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(a, b)| a & b != 0)
    }

    /// Number of tags present in both sets.
    pub fn intersection_len(&self, other: &Self) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .fold(0, usize::saturating_add)
    }

    /// Add every tag of `other` to `self`.
    pub fn union_with(&mut self, other: &Self) {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    /// Tags of `self` that are not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let words = self
            .words
            .iter()
            .enumerate()
            .map(|(i, a)| a & !other.word(i))
            .collect();
        Self { words }
    }

    /// Whether every tag of `self` is also in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.words
            .iter()
            .enumerate()
            .all(|(i, a)| a & !other.word(i) == 0)
    }

    /// Iterate over the tags in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = TagId> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, word)| {
            (0..WORD_BITS).filter_map(move |bit| {
                if word & (1_u64 << bit) == 0 {
                    return None;
                }
                let raw = word_index.saturating_mul(WORD_BITS).saturating_add(bit);
                u16::try_from(raw).ok().map(TagId)
            })
        })
    }
}

impl FromIterator<TagId> for TagSet {
    fn from_iter<I: IntoIterator<Item = TagId>>(iter: I) -> Self {
        let mut set = Self::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u16]) -> TagSet {
        ids.iter().copied().map(TagId).collect()
    }

    #[test]
    fn interner_is_idempotent() {
        let mut interner = TagInterner::new();
        let a = interner.intern("money");
        let b = interner.intern("career");
        assert_eq!(interner.intern("money"), a);
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
        assert_eq!(a.and_then(|id| interner.name(id)), Some("money"));
    }

    #[test]
    fn known_set_skips_unknown_names() {
        let mut interner = TagInterner::new();
        interner.intern("money");
        let tags = interner.known_set(["money", "well-being"]);
        assert_eq!(tags.len(), 1);
        assert_eq!(interner.names_of(&tags), vec!["money"]);
    }

    #[test]
    fn set_operations_span_multiple_words() {
        let a = set(&[1, 70, 130]);
        let b = set(&[70, 200]);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection_len(&b), 1);
        assert_eq!(a.difference(&b), set(&[1, 130]));

        let mut union = a.clone();
        union.union_with(&b);
        assert_eq!(union.len(), 4);
        assert!(a.is_subset(&union));
        assert!(!union.is_subset(&a));
    }

    #[test]
    fn equality_ignores_trailing_zero_words() {
        let mut wide = set(&[3, 150]);
        let narrow = set(&[3]);
        assert_ne!(wide, narrow);
        wide = wide.difference(&set(&[150]));
        assert_eq!(wide, narrow);
    }

    #[test]
    fn insert_reports_novelty_and_iter_is_sorted() {
        let mut tags = TagSet::new();
        assert!(tags.insert(TagId(65)));
        assert!(tags.insert(TagId(2)));
        assert!(!tags.insert(TagId(65)));
        assert!(tags.contains(TagId(2)));
        assert!(!tags.contains(TagId(3)));
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec![TagId(2), TagId(65)]);
    }

    #[test]
    fn empty_set_is_subset_of_everything() {
        assert!(TagSet::new().is_subset(&TagSet::new()));
        assert!(TagSet::new().is_subset(&set(&[9])));
        assert!(TagSet::new().is_empty());
    }
}
