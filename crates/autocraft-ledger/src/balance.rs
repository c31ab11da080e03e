//! Balance verification for the per-run ledger.
//!
//! Reservations move units from the stored pool to the reserved pool and
//! nothing else touches either pool after seeding. For every key K the
//! balance law is therefore:
//!
//! ```text
//! opening[K] == stored[K] + reserved[K]
//! ```
//!
//! The law holds by construction for a correct ledger. A violation is a
//! [`LedgerAnomaly`]: a bookkeeping bug that callers must surface rather
//! than swallow.

use std::collections::{BTreeMap, BTreeSet};

use autocraft_types::ResourceKey;

use crate::{Ledger, LedgerAnomaly};

/// The result of a balance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceResult {
    /// Every key balances.
    Balanced,
    /// One or more keys do not balance.
    Anomaly(LedgerAnomaly),
}

impl BalanceResult {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Verify `opening == stored + reserved` for every key the ledger knows.
pub fn verify_balance(ledger: &Ledger) -> BalanceResult {
    let keys: BTreeSet<&ResourceKey> = ledger
        .opening_pool()
        .keys()
        .chain(ledger.stored_pool().keys())
        .chain(ledger.reserved_pool().keys())
        .collect();

    let mut imbalances: BTreeMap<ResourceKey, (u64, u64)> = BTreeMap::new();
    for key in keys {
        let expected = ledger.opening(key);
        // A sum that overflows can never equal a u64 opening quantity.
        let actual = ledger
            .available(key)
            .checked_add(ledger.reserved(key))
            .unwrap_or(u64::MAX);
        if expected != actual {
            imbalances.insert(key.clone(), (expected, actual));
        }
    }

    if imbalances.is_empty() {
        BalanceResult::Balanced
    } else {
        let message = format!(
            "ledger imbalance for {} key(s): opening != stored + reserved",
            imbalances.len()
        );
        BalanceResult::Anomaly(LedgerAnomaly {
            imbalances,
            message,
        })
    }
}
