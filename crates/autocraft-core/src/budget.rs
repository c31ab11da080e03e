//! Run budgets and cooperative cancellation.
//!
//! The resolver checks its budget once per pattern attempt and never
//! inside ledger operations. Stock reservation and emission are free, so
//! a run that needs no crafting finishes even with a zero budget. Once a
//! checkpoint fails the meter stays exhausted for the rest of the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Shared flag asking a running resolution to stop at its next checkpoint.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Limits for one resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBudget {
    /// Pattern attempts allowed (0 = none).
    pub max_iterations: u64,
    /// Wall-clock limit, if any.
    pub max_duration: Option<Duration>,
}

impl RunBudget {
    /// No iteration cap and no deadline.
    pub const fn unlimited() -> Self {
        Self {
            max_iterations: u64::MAX,
            max_duration: None,
        }
    }

    /// Cap the run at `max_iterations` pattern attempts, with no deadline.
    pub const fn iterations(max_iterations: u64) -> Self {
        Self {
            max_iterations,
            max_duration: None,
        }
    }

    /// Add a wall-clock limit.
    #[must_use]
    pub const fn with_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }
}

impl Default for RunBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Why a run stopped before finishing its search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interruption {
    /// The iteration cap was reached.
    IterationLimit,
    /// The deadline passed.
    Deadline,
    /// A [`CancelToken`] was triggered.
    Cancelled,
}

impl core::fmt::Display for Interruption {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IterationLimit => write!(f, "iteration limit"),
            Self::Deadline => write!(f, "deadline"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Counts checkpoints against a [`RunBudget`].
#[derive(Debug)]
pub struct BudgetMeter {
    limit: u64,
    used: u64,
    deadline: Option<Instant>,
    cancel: CancelToken,
    interrupted: Option<Interruption>,
}

impl BudgetMeter {
    /// Start metering `budget` now.
    pub fn start(budget: RunBudget, cancel: CancelToken) -> Self {
        let deadline = budget
            .max_duration
            .and_then(|limit| Instant::now().checked_add(limit));
        Self {
            limit: budget.max_iterations,
            used: 0,
            deadline,
            cancel,
            interrupted: None,
        }
    }

    /// Spend one iteration.
    ///
    /// Returns the interruption on the first failing checkpoint and on
    /// every checkpoint after it.
    pub fn checkpoint(&mut self) -> Result<(), Interruption> {
        if let Some(reason) = self.interrupted {
            return Err(reason);
        }
        let reason = if self.cancel.is_cancelled() {
            Some(Interruption::Cancelled)
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Some(Interruption::Deadline)
        } else if self.used >= self.limit {
            Some(Interruption::IterationLimit)
        } else {
            None
        };
        match reason {
            Some(reason) => {
                self.interrupted = Some(reason);
                Err(reason)
            }
            None => {
                self.used = self.used.saturating_add(1);
                Ok(())
            }
        }
    }

    /// Iterations spent so far.
    pub const fn used(&self) -> u64 {
        self.used
    }

    /// The interruption, once a checkpoint has failed.
    pub const fn interrupted(&self) -> Option<Interruption> {
        self.interrupted
    }
}
