//! Plan resolution for the Autocraft crafting engine.
//!
//! Given a request for N units of a resource, this crate works out how to
//! obtain them from stock, emitable declarations, and production patterns,
//! and returns an immutable [`Plan`] describing the result. Shortfalls are
//! part of the plan, not errors.
//!
//! # Modules
//!
//! - [`tree`] -- Resolution tree nodes and the active-path cycle guard.
//! - [`budget`] -- Iteration and deadline budgets, [`CancelToken`].
//! - [`progress`] -- [`ProgressListener`] callbacks.
//! - [`resolver`] -- The depth-first [`Resolver`].
//! - [`plan`] -- The [`Plan`] result and its summaries.
//! - [`audit`] -- Post-run claim and accounting checks.
//! - [`env`] -- [`CraftingEnv`] snapshots and YAML scenarios.
//! - [`config`] -- [`ResolverConfig`] loading and env overrides.
//! - [`harness`] -- Bounded async runs via [`Harness`].
//!
//! # Example
//!
//! ```
//! use autocraft_core::{CraftingEnv, ResolverConfig};
//! use autocraft_types::{Pattern, ResourceKey, ResourceStack};
//!
//! let iron = ResourceKey::item("iron");
//! let plate = ResourceKey::item("plate");
//!
//! let mut env = CraftingEnv::new();
//! env.add_stored(&ResourceStack::new(iron.clone(), 5)).ok();
//! if let Ok(pattern) = Pattern::new(
//!     vec![ResourceStack::new(iron, 2)],
//!     vec![ResourceStack::new(plate.clone(), 1)],
//! ) {
//!     env.add_pattern(pattern).ok();
//! }
//!
//! let plan = env.resolve(&plate, 3, &ResolverConfig::default()).ok();
//! assert_eq!(plan.as_ref().map(|p| p.crafted), Some(2));
//! assert_eq!(plan.as_ref().map(|p| p.residual), Some(1));
//! ```

pub mod audit;
pub mod budget;
pub mod config;
pub mod env;
pub mod harness;
pub mod plan;
pub mod progress;
pub mod resolver;
pub mod tree;

pub use budget::{CancelToken, Interruption, RunBudget};
pub use config::{ConfigError, ResolverConfig};
pub use env::{CraftingEnv, EnvError, Scenario};
pub use harness::{Harness, HarnessError, HarnessOutcome};
pub use plan::Plan;
pub use progress::{NoOpListener, ProgressEvent, ProgressListener};
pub use resolver::{ResolveError, Resolver};
pub use tree::{NeedNode, PatternInvocation, ResolutionNode, UnsatisfiedReason};
