//! Per-run resource ledger for the Autocraft plan resolver.
//!
//! A [`Ledger`] is the resolver's private bookkeeping for one resolution
//! run. It is seeded once from a point-in-time snapshot of external stock
//! and then only ever decremented by successful reservations. It is owned
//! exclusively by one run; concurrent runs each take their own snapshot.
//!
//! # Modules
//!
//! - [`ledger`] -- The [`Ledger`] struct: stored, reserved, missing, emitted
//!   and crafted pools plus emitable declarations.
//! - [`snapshot`] -- The [`StockSource`] trait and snapshot seeding via
//!   simulated extraction.
//! - [`balance`] -- Balance verification (`opening == stored + reserved`).
//!
//! # Pools
//!
//! | Pool | Meaning |
//! |------|---------|
//! | stored | still available for reservation |
//! | reserved | claimed from stock by this run's plan |
//! | missing | required but unobtainable (residuals) |
//! | emitted | satisfied by emitable declarations |
//! | crafted | produced by pattern invocations |
//!
//! # Usage
//!
//! ```
//! use autocraft_ledger::Ledger;
//! use autocraft_ledger::balance::BalanceResult;
//! use autocraft_types::ResourceKey;
//!
//! let iron = ResourceKey::item("iron");
//! let mut ledger = Ledger::new();
//! ledger.seed(&iron, 5).ok();
//!
//! assert_eq!(ledger.reserve(&iron, 3).ok(), Some(3));
//! assert_eq!(ledger.reserve(&iron, 3).ok(), Some(2));
//! assert_eq!(ledger.available(&iron), 0);
//! assert_eq!(ledger.verify_balance(), BalanceResult::Balanced);
//! ```

pub mod balance;
pub mod ledger;
pub mod snapshot;

// Re-export primary types at crate root.
pub use balance::BalanceResult;
pub use ledger::Ledger;
pub use snapshot::StockSource;

use std::collections::BTreeMap;

use autocraft_types::ResourceKey;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A seeded quantity was negative.
    #[error("ledger quantity for {key} must not be negative, got {amount}")]
    NegativeQuantity {
        /// The offending key.
        key: ResourceKey,
        /// The invalid quantity.
        amount: i64,
    },

    /// A pool counter would overflow `u64`.
    #[error("arithmetic overflow in ledger: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },

    /// A reservation would take more than is available. This indicates a
    /// bookkeeping bug and is never recoverable.
    #[error("over-reservation of {key}: requested {requested}, available {available}")]
    Overdraw {
        /// The key being reserved.
        key: ResourceKey,
        /// Amount the caller tried to remove.
        requested: u64,
        /// Amount actually stored.
        available: u64,
    },

    /// An emission was recorded for a key that was never declared emitable.
    #[error("resource {0} is not declared emitable")]
    NotEmitable(ResourceKey),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A balance violation detected by [`Ledger::verify_balance`] or by the
/// resolver's claim audit.
///
/// Carries, per key, the pair (`expected`, `actual`) that failed to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// Per-key mismatch: (`expected`, `actual`).
    pub imbalances: BTreeMap<ResourceKey, (u64, u64)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
