//! The pattern index: craftable key -> ordered patterns.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use autocraft_types::{FuzzyMode, Pattern, PatternId, ResourceKey};

use crate::IndexError;

/// Read-only lookup from a resource key to the patterns that produce it.
#[derive(Debug, Clone, Default)]
pub struct PatternIndex {
    /// Patterns filed under their primary output, in registration order.
    by_output: BTreeMap<ResourceKey, Vec<Pattern>>,
    /// Craftable keys in the order they first became craftable.
    craftable_order: Vec<ResourceKey>,
    /// Every registered pattern id.
    ids: BTreeSet<PatternId>,
}

impl PatternIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            by_output: BTreeMap::new(),
            craftable_order: Vec::new(),
            ids: BTreeSet::new(),
        }
    }

    /// Register a pattern under its primary output.
    ///
    /// Patterns for the same key are tried in the order they are registered.
    pub fn register(&mut self, pattern: Pattern) -> Result<PatternId, IndexError> {
        let id = pattern.id();
        if !self.ids.insert(id) {
            return Err(IndexError::DuplicatePattern(id));
        }
        let key = pattern.primary_output().key.clone();
        let slot = self.by_output.entry(key.clone()).or_default();
        if slot.is_empty() {
            self.craftable_order.push(key.clone());
        }
        slot.push(pattern);
        debug!(pattern = %id, output = %key, position = slot.len(), "pattern registered");
        Ok(id)
    }

    /// Patterns whose primary output is `key`, in try-order. Empty when
    /// nothing produces `key`.
    pub fn patterns_for(&self, key: &ResourceKey) -> &[Pattern] {
        self.by_output.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a pattern by id.
    pub fn get(&self, id: PatternId) -> Option<&Pattern> {
        if !self.ids.contains(&id) {
            return None;
        }
        self.by_output
            .values()
            .flat_map(|patterns| patterns.iter())
            .find(|p| p.id() == id)
    }

    /// Whether at least one pattern produces `key`.
    pub fn is_craftable(&self, key: &ResourceKey) -> bool {
        self.by_output.contains_key(key)
    }

    /// Craftable keys in first-registration order.
    pub fn craftables(&self) -> &[ResourceKey] {
        &self.craftable_order
    }

    /// Number of patterns registered per craftable key.
    pub fn craftable_counts(&self) -> BTreeMap<ResourceKey, usize> {
        self.by_output
            .iter()
            .map(|(key, patterns)| (key.clone(), patterns.len()))
            .collect()
    }

    /// Total number of registered patterns.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Every pattern, grouped by output key in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.craftable_order
            .iter()
            .flat_map(|key| self.patterns_for(key).iter())
    }

    /// The first registered craftable key that is
    /// [`FuzzyMode::IgnoreAll`]-equal to `key` and accepted by `accept`.
    pub fn fuzzy_match<F>(&self, key: &ResourceKey, accept: F) -> Option<&ResourceKey>
    where
        F: Fn(&ResourceKey) -> bool,
    {
        self.fuzzy_match_with(key, FuzzyMode::IgnoreAll, accept)
    }

    /// The first registered craftable key that is fuzzy-equal to `key`
    /// under `mode` and accepted by `accept`.
    pub fn fuzzy_match_with<F>(
        &self,
        key: &ResourceKey,
        mode: FuzzyMode,
        accept: F,
    ) -> Option<&ResourceKey>
    where
        F: Fn(&ResourceKey) -> bool,
    {
        self.craftable_order
            .iter()
            .find(|candidate| candidate.fuzzy_eq(key, mode) && accept(candidate))
    }
}
