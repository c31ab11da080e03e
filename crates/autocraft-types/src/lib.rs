//! Shared type definitions for the Autocraft plan resolver.
//!
//! This crate is the single source of truth for the identity and recipe
//! types consumed by the ledger, the pattern index, and the resolver. Every
//! type here is immutable once constructed: the resolver reads patterns and
//! keys but never mutates them.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for patterns and resolution runs
//! - [`key`] -- [`ResourceKey`] identity with exact and fuzzy equality
//! - [`stack`] -- [`ResourceStack`], a key paired with a signed quantity
//! - [`pattern`] -- [`Pattern`], a validated production rule

pub mod ids;
pub mod key;
pub mod pattern;
pub mod stack;

// Re-export all public types at crate root for convenience.
pub use ids::{PatternId, RunId};
pub use key::{FuzzyMode, ResourceKey, ResourceKind};
pub use pattern::{Pattern, PatternError};
pub use stack::ResourceStack;
