//! Seeding a ledger from external stock.
//!
//! The resolver never reads live inventory mid-run. Instead the host
//! exposes a [`StockSource`] whose only stock query is a *simulated*
//! extraction: "how much of `key` would you hand over if asked for
//! `amount`?" The answer never mutates the source. [`snapshot`] asks that
//! question once per stored key at run start and seeds a fresh [`Ledger`].

use std::collections::BTreeMap;

use tracing::debug;

use autocraft_types::ResourceKey;

use crate::{Ledger, LedgerError};

/// A read-only view of external stock.
pub trait StockSource {
    /// Keys the source currently holds any amount of.
    fn stored_keys(&self) -> Vec<ResourceKey>;

    /// How much of `key` an extraction of `amount` would yield, without
    /// performing it.
    fn simulate_extract(&self, key: &ResourceKey, amount: u64) -> u64;
}

impl StockSource for BTreeMap<ResourceKey, u64> {
    fn stored_keys(&self) -> Vec<ResourceKey> {
        self.iter()
            .filter(|(_, qty)| **qty > 0)
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn simulate_extract(&self, key: &ResourceKey, amount: u64) -> u64 {
        self.get(key).copied().unwrap_or(0).min(amount)
    }
}

/// Build a fresh ledger holding everything `source` would currently yield,
/// with the given emitable declarations.
pub fn snapshot<I>(source: &dyn StockSource, emitable: I) -> Result<Ledger, LedgerError>
where
    I: IntoIterator<Item = ResourceKey>,
{
    let mut ledger = Ledger::new();
    for key in source.stored_keys() {
        let amount = source.simulate_extract(&key, u64::MAX);
        ledger.seed(&key, amount)?;
    }
    for key in emitable {
        ledger.declare_emitable(key);
    }
    debug!(
        keys = ledger.stored_pool().len(),
        emitable = ledger.emitable_keys().len(),
        "ledger snapshot taken"
    );
    Ok(ledger)
}
