//! Bounded, cancellable resolution runs.
//!
//! [`Harness::run_with_budget`] moves one resolution onto a dedicated
//! thread, with stack for the configured depth cap, and waits for its
//! plan under the budget's deadline. When the deadline
//! elapses first, the harness triggers the run's [`CancelToken`] and
//! waits for the worker to reach its next checkpoint, so the partial plan
//! built so far is returned instead of thrown away.
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | [`HarnessOutcome::Completed`] | The search finished, or covered the request before the budget ran out |
//! | [`HarnessOutcome::TimedOut`] | The budget ran out with part of the request covered |
//! | [`HarnessOutcome::TimedOutNoProgress`] | The budget ran out with nothing covered |

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use autocraft_ledger::LedgerError;
use autocraft_types::ResourceKey;

use crate::budget::{CancelToken, RunBudget};
use crate::config::ResolverConfig;
use crate::env::CraftingEnv;
use crate::plan::Plan;
use crate::progress::{NoOpListener, ProgressListener};
use crate::resolver::{ResolveError, Resolver, worker_thread};

/// Errors that can occur while running a bounded resolution.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The ledger snapshot could not be taken.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// The resolution itself failed.
    #[error("resolve error: {source}")]
    Resolve {
        /// The underlying resolve error.
        #[from]
        source: ResolveError,
    },

    /// The worker thread could not be started.
    #[error("failed to start resolution worker: {source}")]
    Spawn {
        /// The underlying spawn error.
        #[from]
        source: std::io::Error,
    },

    /// The worker exited without delivering a plan.
    #[error("resolution worker failed: {source}")]
    Worker {
        /// The closed channel.
        #[from]
        source: oneshot::error::RecvError,
    },
}

/// How a bounded run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessOutcome {
    /// The run finished within its budget.
    Completed(Plan),
    /// The budget ran out; the plan holds the progress made.
    TimedOut(Plan),
    /// The budget ran out before anything was covered.
    TimedOutNoProgress,
}

impl HarnessOutcome {
    /// The plan, if the run produced one.
    pub const fn plan(&self) -> Option<&Plan> {
        match self {
            Self::Completed(plan) | Self::TimedOut(plan) => Some(plan),
            Self::TimedOutNoProgress => None,
        }
    }

    /// Whether the budget ran out.
    pub const fn timed_out(&self) -> bool {
        !matches!(self, Self::Completed(_))
    }

    fn classify(plan: Plan) -> Self {
        if plan.is_complete() || !plan.is_interrupted() {
            Self::Completed(plan)
        } else if plan.satisfied() == 0 {
            Self::TimedOutNoProgress
        } else {
            Self::TimedOut(plan)
        }
    }
}

/// Runs resolutions against a shared environment.
#[derive(Debug, Clone)]
pub struct Harness {
    env: Arc<CraftingEnv>,
    config: ResolverConfig,
}

impl Harness {
    /// A harness over `env` using `config` for depth and default budget.
    pub fn new(env: CraftingEnv, config: ResolverConfig) -> Self {
        Self {
            env: Arc::new(env),
            config,
        }
    }

    /// The environment runs are resolved against.
    pub fn env(&self) -> &CraftingEnv {
        &self.env
    }

    /// Run with the budget from the harness configuration.
    pub async fn run(&self, key: ResourceKey, amount: i64) -> Result<HarnessOutcome, HarnessError> {
        self.run_with_budget(key, amount, self.config.budget()).await
    }

    /// Run with an explicit budget.
    pub async fn run_with_budget(
        &self,
        key: ResourceKey,
        amount: i64,
        budget: RunBudget,
    ) -> Result<HarnessOutcome, HarnessError> {
        self.run_observed(key, amount, budget, Box::new(NoOpListener))
            .await
    }

    /// Run with an explicit budget, reporting progress to `listener` from
    /// the worker.
    pub async fn run_observed(
        &self,
        key: ResourceKey,
        amount: i64,
        budget: RunBudget,
        listener: Box<dyn ProgressListener>,
    ) -> Result<HarnessOutcome, HarnessError> {
        let ledger = self.env.ledger()?;
        let cancel = CancelToken::new();
        let env = Arc::clone(&self.env);
        let worker_cancel = cancel.clone();
        let max_depth = self.config.max_depth;

        let (tx, mut rx) = oneshot::channel();
        let _worker = worker_thread(&self.config).spawn(move || {
            let result = Resolver::new(env.index(), ledger)
                .with_budget(budget)
                .with_max_depth(max_depth)
                .with_cancel(worker_cancel)
                .with_listener(listener)
                .resolve(&key, amount);
            if tx.send(result).is_err() {
                debug!("Harness caller gone before the plan was delivered");
            }
        })?;

        let received = match budget.max_duration {
            Some(limit) => match tokio::time::timeout(limit, &mut rx).await {
                Ok(received) => received,
                Err(_elapsed) => {
                    warn!(
                        limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        "Resolution deadline elapsed, cancelling"
                    );
                    cancel.cancel();
                    rx.await
                }
            },
            None => rx.await,
        };
        let plan = received??;

        let outcome = HarnessOutcome::classify(plan);
        info!(
            timed_out = outcome.timed_out(),
            satisfied = outcome.plan().map_or(0, Plan::satisfied),
            "Bounded resolution finished"
        );
        Ok(outcome)
    }
}
