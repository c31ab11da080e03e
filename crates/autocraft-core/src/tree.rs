//! The resolution tree and the active-path cycle guard.
//!
//! A run builds one [`NeedNode`] per resource need. Each need lists the
//! [`ResolutionNode`]s that covered it, in the order they were applied:
//! stock first, then emission, then pattern invocations, then whatever
//! was left as unsatisfiable. A [`PatternInvocation`] owns one child need
//! per distinct input key, so the tree is rooted at the requested resource
//! and descends through every input that had to be resolved.
//!
//! For every need node the amounts add up:
//!
//! ```text
//! stock + emitted + sum(invocation.used) + unsatisfiable == amount
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use autocraft_types::{PatternId, ResourceKey, ResourceStack};

// ---------------------------------------------------------------------------
// Node types
// ---------------------------------------------------------------------------

/// Why part of a need could not be covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnsatisfiedReason {
    /// Not in stock, not emitable, and no pattern produces it.
    NoSource,
    /// The key is already being resolved by an ancestor.
    Cycle,
    /// The active path reached the configured depth cap.
    DepthLimit,
    /// Patterns exist but none could supply the remainder.
    NoViablePattern,
    /// The run's budget ran out before the need could be crafted.
    BudgetExhausted,
}

impl core::fmt::Display for UnsatisfiedReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::NoSource => "no source",
            Self::Cycle => "cycle",
            Self::DepthLimit => "depth limit",
            Self::NoViablePattern => "no viable pattern",
            Self::BudgetExhausted => "budget exhausted",
        };
        f.write_str(label)
    }
}

/// One way a need was (or was not) covered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionNode {
    /// Units reserved from the ledger's stored pool.
    Stock {
        /// Units reserved.
        amount: u64,
    },
    /// Units synthesised from an emitable declaration.
    Emit {
        /// Units emitted.
        amount: u64,
    },
    /// Units produced by running a pattern.
    Pattern(PatternInvocation),
    /// Units that could not be obtained.
    Unsatisfiable {
        /// Units left uncovered.
        amount: u64,
        /// Why they were left uncovered.
        reason: UnsatisfiedReason,
    },
}

/// A committed pattern invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternInvocation {
    /// The pattern that runs.
    pub pattern: PatternId,
    /// Whole number of times it runs.
    pub invocations: u64,
    /// Units of the needed key produced across all invocations.
    pub produced: u64,
    /// Units of the produced amount that go toward the parent need.
    pub used: u64,
    /// One resolved need per distinct input key, in declaration order.
    pub inputs: Vec<NeedNode>,
    /// Secondary outputs plus any primary overshoot. Informational only.
    pub byproducts: Vec<ResourceStack>,
}

/// A quantity of one key that the run had to obtain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedNode {
    /// The needed key.
    pub key: ResourceKey,
    /// Units needed.
    pub amount: u64,
    /// How the need was covered, in application order.
    pub sources: Vec<ResolutionNode>,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

impl NeedNode {
    /// A need with no sources yet.
    pub const fn new(key: ResourceKey, amount: u64) -> Self {
        Self {
            key,
            amount,
            sources: Vec::new(),
        }
    }

    /// Units reserved from stock directly under this node.
    pub fn stock_amount(&self) -> u64 {
        self.sum_sources(|node| match node {
            ResolutionNode::Stock { amount } => *amount,
            _ => 0,
        })
    }

    /// Units emitted directly under this node.
    pub fn emitted_amount(&self) -> u64 {
        self.sum_sources(|node| match node {
            ResolutionNode::Emit { amount } => *amount,
            _ => 0,
        })
    }

    /// Units supplied by pattern invocations directly under this node.
    pub fn crafted_amount(&self) -> u64 {
        self.sum_sources(|node| match node {
            ResolutionNode::Pattern(invocation) => invocation.used,
            _ => 0,
        })
    }

    /// Units covered by any source.
    pub fn satisfied(&self) -> u64 {
        self.stock_amount()
            .saturating_add(self.emitted_amount())
            .saturating_add(self.crafted_amount())
    }

    /// Units left unsatisfiable directly under this node.
    pub fn residual(&self) -> u64 {
        self.sum_sources(|node| match node {
            ResolutionNode::Unsatisfiable { amount, .. } => *amount,
            _ => 0,
        })
    }

    /// Total stock reserved per key anywhere in the tree.
    pub fn stock_claims(&self) -> BTreeMap<ResourceKey, u64> {
        let mut claims = BTreeMap::new();
        self.visit(&mut |need| accumulate(&mut claims, &need.key, need.stock_amount()));
        claims
    }

    /// Total emitted per key anywhere in the tree.
    pub fn emitted_totals(&self) -> BTreeMap<ResourceKey, u64> {
        let mut totals = BTreeMap::new();
        self.visit(&mut |need| accumulate(&mut totals, &need.key, need.emitted_amount()));
        totals
    }

    /// Total unsatisfiable per key anywhere in the tree.
    pub fn missing_totals(&self) -> BTreeMap<ResourceKey, u64> {
        let mut totals = BTreeMap::new();
        self.visit(&mut |need| accumulate(&mut totals, &need.key, need.residual()));
        totals
    }

    /// Invocation totals per pattern, in the order each pattern first
    /// appears in a pre-order walk of the tree.
    pub fn pattern_counts(&self) -> Vec<(PatternId, u64)> {
        let mut counts: Vec<(PatternId, u64)> = Vec::new();
        self.visit(&mut |need| {
            for invocation in need.invocations() {
                match counts.iter_mut().find(|(id, _)| *id == invocation.pattern) {
                    Some((_, total)) => *total = total.saturating_add(invocation.invocations),
                    None => counts.push((invocation.pattern, invocation.invocations)),
                }
            }
        });
        counts
    }

    /// Pattern invocations directly under this node.
    pub fn invocations(&self) -> impl Iterator<Item = &PatternInvocation> {
        self.sources.iter().filter_map(|node| match node {
            ResolutionNode::Pattern(invocation) => Some(invocation),
            _ => None,
        })
    }

    /// Number of need nodes in the tree, this one included.
    pub fn node_count(&self) -> usize {
        let mut count: usize = 0;
        self.visit(&mut |_| count = count.saturating_add(1));
        count
    }

    /// Length of the longest chain of needs from this node down.
    pub fn depth(&self) -> usize {
        self.invocations()
            .flat_map(|invocation| invocation.inputs.iter())
            .map(Self::depth)
            .max()
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Call `f` on every need node, parent before children.
    pub fn visit<F>(&self, f: &mut F)
    where
        F: FnMut(&Self),
    {
        f(self);
        for invocation in self.invocations() {
            for input in &invocation.inputs {
                input.visit(f);
            }
        }
    }

    fn sum_sources<F>(&self, amount_of: F) -> u64
    where
        F: Fn(&ResolutionNode) -> u64,
    {
        self.sources
            .iter()
            .map(amount_of)
            .fold(0_u64, u64::saturating_add)
    }
}

fn accumulate(totals: &mut BTreeMap<ResourceKey, u64>, key: &ResourceKey, amount: u64) {
    if amount == 0 {
        return;
    }
    let entry = totals.entry(key.clone()).or_insert(0);
    *entry = entry.saturating_add(amount);
}

// ---------------------------------------------------------------------------
// Active path
// ---------------------------------------------------------------------------

/// Keys currently being crafted by an ancestor call.
///
/// The resolver pushes a key before trying its patterns and pops it on
/// every exit path. A key found here is a cycle and may only be covered
/// from stock or emission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivePath {
    keys: Vec<ResourceKey>,
}

impl ActivePath {
    /// An empty path.
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Enter `key`.
    pub fn push(&mut self, key: ResourceKey) {
        self.keys.push(key);
    }

    /// Leave the innermost key.
    pub fn pop(&mut self) -> Option<ResourceKey> {
        self.keys.pop()
    }

    /// Whether `key` is being resolved by an ancestor.
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of keys on the path.
    pub fn depth(&self) -> usize {
        self.keys.len()
    }

    /// Whether the path is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The path, outermost key first.
    pub fn keys(&self) -> &[ResourceKey] {
        &self.keys
    }
}
