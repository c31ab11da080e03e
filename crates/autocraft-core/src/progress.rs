//! Incremental progress reporting.
//!
//! A [`ProgressListener`] sees the search as it happens, including trial
//! branches that are later discarded. Only the final [`Plan`] describes
//! what was committed.
//!
//! [`Plan`]: crate::plan::Plan

use autocraft_types::{PatternId, ResourceKey};

use crate::budget::Interruption;

/// Something the resolver did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent<'a> {
    /// A pattern is being tried for a need.
    PatternAttempted {
        /// The needed key.
        key: &'a ResourceKey,
        /// The candidate pattern.
        pattern: PatternId,
        /// Invocations the trial aims for.
        invocations: u64,
    },
    /// A pattern trial was adopted.
    PatternCommitted {
        /// The needed key.
        key: &'a ResourceKey,
        /// The adopted pattern.
        pattern: PatternId,
        /// Invocations committed.
        invocations: u64,
        /// Units applied to the need.
        used: u64,
    },
    /// A need finished resolving.
    NeedResolved {
        /// The needed key.
        key: &'a ResourceKey,
        /// Units needed.
        requested: u64,
        /// Units covered.
        satisfied: u64,
    },
    /// The budget ran out. Sent once per run.
    BudgetExhausted {
        /// What ran out.
        reason: Interruption,
        /// Iterations spent.
        iterations: u64,
    },
}

/// Receives [`ProgressEvent`]s during a run.
pub trait ProgressListener: Send {
    /// Called synchronously from the resolver.
    fn on_event(&mut self, event: &ProgressEvent<'_>);
}

/// A listener that ignores every event.
pub struct NoOpListener;

impl ProgressListener for NoOpListener {
    fn on_event(&mut self, _event: &ProgressEvent<'_>) {}
}
