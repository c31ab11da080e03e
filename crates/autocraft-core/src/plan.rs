//! The immutable result of one resolution run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use autocraft_types::{PatternId, ResourceKey, RunId};

use crate::budget::Interruption;
use crate::tree::NeedNode;

/// A per-key quantity in a plan summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAmount {
    /// The resource.
    pub key: ResourceKey,
    /// The quantity.
    pub amount: u64,
}

/// Total invocations of one pattern across the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternTotal {
    /// The pattern.
    pub pattern: PatternId,
    /// Invocations summed over every node that uses it.
    pub invocations: u64,
}

/// A resolved production plan.
///
/// For the requested key, `reserved + emitted + crafted + residual ==
/// requested`. The per-key summaries cover the whole tree, inputs
/// included, and are sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Identifies the run that produced this plan.
    pub run_id: RunId,
    /// The requested key.
    pub target: ResourceKey,
    /// Units requested.
    pub requested: u64,
    /// Requested units reserved from stock.
    pub reserved: u64,
    /// Requested units covered by emission.
    pub emitted: u64,
    /// Requested units covered by pattern invocations.
    pub crafted: u64,
    /// Requested units left unsatisfied.
    pub residual: u64,
    /// Invocation totals per pattern, in first-use order.
    pub pattern_totals: Vec<PatternTotal>,
    /// Stock reserved per key.
    pub stock_used: Vec<KeyAmount>,
    /// Emission per key.
    pub emitted_by_key: Vec<KeyAmount>,
    /// Unsatisfiable units per key.
    pub missing: Vec<KeyAmount>,
    /// Pattern attempts spent.
    pub iterations: u64,
    /// Set when the budget ran out before the search finished.
    pub interruption: Option<Interruption>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// The full resolution tree.
    pub tree: NeedNode,
}

/// Run metadata that is not derivable from the tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunRecord {
    pub(crate) run_id: RunId,
    pub(crate) iterations: u64,
    pub(crate) interruption: Option<Interruption>,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) finished_at: DateTime<Utc>,
}

impl Plan {
    /// Summarise a finished tree.
    pub(crate) fn assemble(tree: NeedNode, record: RunRecord) -> Self {
        let pattern_totals = tree
            .pattern_counts()
            .into_iter()
            .map(|(pattern, invocations)| PatternTotal {
                pattern,
                invocations,
            })
            .collect();
        Self {
            run_id: record.run_id,
            target: tree.key.clone(),
            requested: tree.amount,
            reserved: tree.stock_amount(),
            emitted: tree.emitted_amount(),
            crafted: tree.crafted_amount(),
            residual: tree.residual(),
            pattern_totals,
            stock_used: key_amounts(tree.stock_claims()),
            emitted_by_key: key_amounts(tree.emitted_totals()),
            missing: key_amounts(tree.missing_totals()),
            iterations: record.iterations,
            interruption: record.interruption,
            started_at: record.started_at,
            finished_at: record.finished_at,
            tree,
        }
    }

    /// Requested units covered without crafting.
    pub const fn stock_satisfied(&self) -> u64 {
        self.reserved.saturating_add(self.emitted)
    }

    /// Requested units covered by crafting.
    pub const fn pattern_satisfied(&self) -> u64 {
        self.crafted
    }

    /// Requested units covered by any source.
    pub const fn satisfied(&self) -> u64 {
        self.stock_satisfied().saturating_add(self.crafted)
    }

    /// Whether nothing is left unsatisfied.
    pub const fn is_complete(&self) -> bool {
        self.residual == 0
    }

    /// Whether the budget cut the search short.
    pub const fn is_interrupted(&self) -> bool {
        self.interruption.is_some()
    }

    /// Total invocations of `pattern`, or 0 if it is not used.
    pub fn invocations_of(&self, pattern: PatternId) -> u64 {
        self.pattern_totals
            .iter()
            .find(|total| total.pattern == pattern)
            .map_or(0, |total| total.invocations)
    }

    /// Stock of `key` reserved anywhere in the plan.
    pub fn stock_used_for(&self, key: &ResourceKey) -> u64 {
        lookup(&self.stock_used, key)
    }

    /// Units of `key` left unsatisfied anywhere in the plan.
    pub fn missing_for(&self, key: &ResourceKey) -> u64 {
        lookup(&self.missing, key)
    }

    /// Wall-clock time the run took.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.signed_duration_since(self.started_at)
    }
}

fn key_amounts(totals: std::collections::BTreeMap<ResourceKey, u64>) -> Vec<KeyAmount> {
    totals
        .into_iter()
        .map(|(key, amount)| KeyAmount { key, amount })
        .collect()
}

fn lookup(amounts: &[KeyAmount], key: &ResourceKey) -> u64 {
    amounts
        .iter()
        .find(|entry| &entry.key == key)
        .map_or(0, |entry| entry.amount)
}
