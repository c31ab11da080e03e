//! The per-run ledger: arithmetic bookkeeping over resource pools.
//!
//! # Design
//!
//! - **Monotone stock**: the stored pool only ever decreases after seeding,
//!   and only through [`Ledger::reserve`].
//! - **No rollback**: reservations are irreversible. The resolver decides
//!   whether to commit a branch before touching the live ledger, using a
//!   scratch [`Clone`] for trial runs.
//! - **Never negative**: all pools are `u64` and every update is checked.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use autocraft_types::{ResourceKey, ResourceStack};

use crate::balance::{verify_balance, BalanceResult};
use crate::LedgerError;

/// Bookkeeping for a single resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    /// Quantities as seeded, before any reservation.
    opening: BTreeMap<ResourceKey, u64>,
    /// Quantities still available.
    stored: BTreeMap<ResourceKey, u64>,
    /// Quantities claimed from stock.
    reserved: BTreeMap<ResourceKey, u64>,
    /// Quantities required but unobtainable.
    missing: BTreeMap<ResourceKey, u64>,
    /// Quantities satisfied by emitable declarations.
    emitted: BTreeMap<ResourceKey, u64>,
    /// Quantities produced by pattern invocations.
    crafted: BTreeMap<ResourceKey, u64>,
    /// Keys that may be treated as infinitely available.
    emitable: BTreeSet<ResourceKey>,
}

impl Ledger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            opening: BTreeMap::new(),
            stored: BTreeMap::new(),
            reserved: BTreeMap::new(),
            missing: BTreeMap::new(),
            emitted: BTreeMap::new(),
            crafted: BTreeMap::new(),
            emitable: BTreeSet::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    /// Add `amount` units of `key` to the opening stock.
    ///
    /// Seeding is meant to happen before resolution starts; it raises both
    /// the opening and stored quantities so the ledger stays balanced.
    pub fn seed(&mut self, key: &ResourceKey, amount: u64) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        add_to(&mut self.opening, key, amount, "opening stock overflow")?;
        add_to(&mut self.stored, key, amount, "stored stock overflow")
    }

    /// Seed from a signed stack, rejecting negative amounts.
    pub fn seed_stack(&mut self, stack: &ResourceStack) -> Result<(), LedgerError> {
        let amount = stack.quantity().ok_or_else(|| LedgerError::NegativeQuantity {
            key: stack.key.clone(),
            amount: stack.amount,
        })?;
        self.seed(&stack.key, amount)
    }

    /// Declare `key` emitable: requests for it may be satisfied without
    /// decrementing any pool.
    pub fn declare_emitable(&mut self, key: ResourceKey) {
        self.emitable.insert(key);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Units of `key` still available for reservation.
    pub fn available(&self, key: &ResourceKey) -> u64 {
        self.stored.get(key).copied().unwrap_or(0)
    }

    /// Whether `key` was declared emitable.
    pub fn is_emitable(&self, key: &ResourceKey) -> bool {
        self.emitable.contains(key)
    }

    /// Units of `key` present when the ledger was seeded.
    pub fn opening(&self, key: &ResourceKey) -> u64 {
        self.opening.get(key).copied().unwrap_or(0)
    }

    /// Units of `key` reserved so far.
    pub fn reserved(&self, key: &ResourceKey) -> u64 {
        self.reserved.get(key).copied().unwrap_or(0)
    }

    /// Units of `key` recorded as missing.
    pub fn missing(&self, key: &ResourceKey) -> u64 {
        self.missing.get(key).copied().unwrap_or(0)
    }

    /// Units of `key` satisfied by emission.
    pub fn emitted(&self, key: &ResourceKey) -> u64 {
        self.emitted.get(key).copied().unwrap_or(0)
    }

    /// Units of `key` produced by patterns.
    pub fn crafted(&self, key: &ResourceKey) -> u64 {
        self.crafted.get(key).copied().unwrap_or(0)
    }

    /// The opening pool.
    pub const fn opening_pool(&self) -> &BTreeMap<ResourceKey, u64> {
        &self.opening
    }

    /// The stored pool.
    pub const fn stored_pool(&self) -> &BTreeMap<ResourceKey, u64> {
        &self.stored
    }

    /// The reserved pool.
    pub const fn reserved_pool(&self) -> &BTreeMap<ResourceKey, u64> {
        &self.reserved
    }

    /// The missing pool.
    pub const fn missing_pool(&self) -> &BTreeMap<ResourceKey, u64> {
        &self.missing
    }

    /// The emitted pool.
    pub const fn emitted_pool(&self) -> &BTreeMap<ResourceKey, u64> {
        &self.emitted
    }

    /// The crafted pool.
    pub const fn crafted_pool(&self) -> &BTreeMap<ResourceKey, u64> {
        &self.crafted
    }

    /// All emitable declarations.
    pub const fn emitable_keys(&self) -> &BTreeSet<ResourceKey> {
        &self.emitable
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Reserve up to `amount` units of `key`.
    ///
    /// Returns the amount actually reserved: never more than requested and
    /// never more than available. The reserved units move from the stored
    /// pool to the reserved pool.
    pub fn reserve(&mut self, key: &ResourceKey, amount: u64) -> Result<u64, LedgerError> {
        let take = self.available(key).min(amount);
        if take == 0 {
            return Ok(0);
        }
        self.debit(key, take)?;
        add_to(&mut self.reserved, key, take, "reserved pool overflow")?;
        Ok(take)
    }

    /// Record that `amount` units of an emitable `key` were synthesised.
    pub fn record_emitted(&mut self, key: &ResourceKey, amount: u64) -> Result<(), LedgerError> {
        if !self.is_emitable(key) {
            return Err(LedgerError::NotEmitable(key.clone()));
        }
        add_to(&mut self.emitted, key, amount, "emitted pool overflow")
    }

    /// Record that `amount` units of `key` could not be obtained.
    pub fn record_missing(&mut self, key: &ResourceKey, amount: u64) -> Result<(), LedgerError> {
        add_to(&mut self.missing, key, amount, "missing pool overflow")
    }

    /// Record that `amount` units of `key` will be produced by patterns.
    pub fn record_crafted(&mut self, key: &ResourceKey, amount: u64) -> Result<(), LedgerError> {
        add_to(&mut self.crafted, key, amount, "crafted pool overflow")
    }

    /// Check `opening == stored + reserved` for every key.
    pub fn verify_balance(&self) -> BalanceResult {
        verify_balance(self)
    }

    /// Remove exactly `amount` from the stored pool.
    fn debit(&mut self, key: &ResourceKey, amount: u64) -> Result<(), LedgerError> {
        let available = self.available(key);
        let Some(remaining) = available.checked_sub(amount) else {
            warn!(%key, requested = amount, available, "ledger over-reservation");
            return Err(LedgerError::Overdraw {
                key: key.clone(),
                requested: amount,
                available,
            });
        };
        if remaining == 0 {
            self.stored.remove(key);
        } else {
            self.stored.insert(key.clone(), remaining);
        }
        Ok(())
    }
}

/// Add `amount` to `pool[key]` with overflow checking. Zero amounts leave
/// the pool untouched so empty entries never appear.
fn add_to(
    pool: &mut BTreeMap<ResourceKey, u64>,
    key: &ResourceKey,
    amount: u64,
    context: &'static str,
) -> Result<(), LedgerError> {
    if amount == 0 {
        return Ok(());
    }
    let current = pool.get(key).copied().unwrap_or(0);
    let updated = current
        .checked_add(amount)
        .ok_or(LedgerError::ArithmeticOverflow { context })?;
    pool.insert(key.clone(), updated);
    Ok(())
}
