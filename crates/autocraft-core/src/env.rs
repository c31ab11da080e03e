//! Crafting environments.
//!
//! A [`CraftingEnv`] bundles everything a run reads: the pattern index,
//! the stock it may reserve from, and the emitable declarations. Each run
//! takes its own ledger snapshot through [`CraftingEnv::ledger`], so
//! concurrent runs against one environment never share mutable state.
//!
//! Environments can be built in code or loaded from a YAML scenario:
//!
//! ```yaml
//! stock:
//!   - { key: { kind: Item, id: iron }, amount: 5 }
//! emitable:
//!   - { kind: Fluid, id: water }
//! patterns:
//!   - inputs:
//!       - { key: { kind: Item, id: iron }, amount: 2 }
//!     outputs:
//!       - { key: { kind: Item, id: plate }, amount: 1 }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::thread;

use serde::Deserialize;
use tracing::debug;

use autocraft_ledger::snapshot::snapshot;
use autocraft_ledger::{Ledger, LedgerError};
use autocraft_patterns::{IndexError, PatternIndex};
use autocraft_types::{Pattern, PatternError, PatternId, ResourceKey, ResourceStack};

use crate::config::{ConfigError, ResolverConfig};
use crate::plan::Plan;
use crate::resolver::{ResolveError, Resolver, worker_thread};

/// Errors raised while building an environment.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// A pattern failed validation.
    #[error("invalid pattern: {source}")]
    Pattern {
        /// The underlying pattern error.
        #[from]
        source: PatternError,
    },

    /// A pattern could not be indexed.
    #[error("pattern index error: {source}")]
    Index {
        /// The underlying index error.
        #[from]
        source: IndexError,
    },

    /// A stock entry was rejected.
    #[error("stock error: {source}")]
    Stock {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// The scenario could not be read or parsed.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },
}

// ---------------------------------------------------------------------------
// Scenario form
// ---------------------------------------------------------------------------

/// A pattern as written in a scenario file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatternSpec {
    /// Consumed per invocation.
    #[serde(default)]
    pub inputs: Vec<ResourceStack>,
    /// Produced per invocation.
    pub outputs: Vec<ResourceStack>,
    /// Index of the primary output.
    #[serde(default)]
    pub primary: usize,
}

/// A complete environment as written in a scenario file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    /// Stored resources.
    #[serde(default)]
    pub stock: Vec<ResourceStack>,
    /// Emitable keys.
    #[serde(default)]
    pub emitable: Vec<ResourceKey>,
    /// Patterns, in registration order.
    #[serde(default)]
    pub patterns: Vec<PatternSpec>,
}

// ---------------------------------------------------------------------------
// CraftingEnv
// ---------------------------------------------------------------------------

/// Patterns, stock, and emitable declarations for resolution runs.
#[derive(Debug, Clone, Default)]
pub struct CraftingEnv {
    index: PatternIndex,
    stock: BTreeMap<ResourceKey, u64>,
    emitable: BTreeSet<ResourceKey>,
}

impl CraftingEnv {
    /// An empty environment.
    pub const fn new() -> Self {
        Self {
            index: PatternIndex::new(),
            stock: BTreeMap::new(),
            emitable: BTreeSet::new(),
        }
    }

    /// Build an environment from a parsed scenario.
    pub fn from_scenario(scenario: Scenario) -> Result<Self, EnvError> {
        let mut env = Self::new();
        for stack in &scenario.stock {
            env.add_stored(stack)?;
        }
        for key in scenario.emitable {
            env.add_emitable(key);
        }
        for spec in scenario.patterns {
            let pattern = Pattern::with_primary(spec.inputs, spec.outputs, spec.primary)?;
            env.add_pattern(pattern)?;
        }
        debug!(
            patterns = env.index.len(),
            stocked = env.stock.len(),
            emitable = env.emitable.len(),
            "Scenario loaded"
        );
        Ok(env)
    }

    /// Parse a YAML scenario.
    pub fn from_yaml(yaml: &str) -> Result<Self, EnvError> {
        let scenario: Scenario = if yaml.trim().is_empty() {
            Scenario::default()
        } else {
            serde_yml::from_str(yaml).map_err(ConfigError::from)?
        };
        Self::from_scenario(scenario)
    }

    /// Load a YAML scenario from disk.
    pub fn from_file(path: &Path) -> Result<Self, EnvError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_yaml(&contents)
    }

    /// Register a pattern. Patterns for the same key are tried in the
    /// order they are added.
    pub fn add_pattern(&mut self, pattern: Pattern) -> Result<PatternId, EnvError> {
        Ok(self.index.register(pattern)?)
    }

    /// Add stored units. Negative amounts are rejected.
    pub fn add_stored(&mut self, stack: &ResourceStack) -> Result<(), EnvError> {
        let amount = stack
            .quantity()
            .ok_or_else(|| LedgerError::NegativeQuantity {
                key: stack.key.clone(),
                amount: stack.amount,
            })?;
        if amount == 0 {
            return Ok(());
        }
        let entry = self.stock.entry(stack.key.clone()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow {
                context: "environment stock overflow",
            })?;
        Ok(())
    }

    /// Declare `key` emitable.
    pub fn add_emitable(&mut self, key: ResourceKey) {
        self.emitable.insert(key);
    }

    /// An independent copy; changes to either side do not affect the
    /// other.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// The pattern index.
    pub const fn index(&self) -> &PatternIndex {
        &self.index
    }

    /// Stored units of `key`.
    pub fn stored(&self, key: &ResourceKey) -> u64 {
        self.stock.get(key).copied().unwrap_or(0)
    }

    /// Whether `key` is declared emitable.
    pub fn is_emitable(&self, key: &ResourceKey) -> bool {
        self.emitable.contains(key)
    }

    /// Keys with at least one registered pattern, in registration order.
    pub fn craftables(&self) -> &[ResourceKey] {
        self.index.craftables()
    }

    /// A fresh ledger seeded from this environment's stock.
    pub fn ledger(&self) -> Result<Ledger, LedgerError> {
        snapshot(&self.stock, self.emitable.iter().cloned())
    }

    /// Resolve `amount` units of `key` on a fresh ledger.
    ///
    /// Runs on a scoped thread with stack for `config.max_depth` levels.
    /// A panic in the resolver is resumed on the caller.
    pub fn resolve(
        &self,
        key: &ResourceKey,
        amount: i64,
        config: &ResolverConfig,
    ) -> Result<Plan, ResolveError> {
        let ledger = self.ledger()?;
        thread::scope(|scope| -> Result<Plan, ResolveError> {
            let worker = worker_thread(config).spawn_scoped(scope, move || {
                Resolver::new(&self.index, ledger)
                    .with_config(config)
                    .resolve(key, amount)
            })?;
            worker
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
        })
    }
}
