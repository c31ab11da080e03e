//! A resource key paired with a signed quantity.
//!
//! Positive amounts mean produced or needed; negative amounts mean surplus
//! or to-be-consumed, depending on context. Pattern construction rejects
//! non-positive amounts, so every stack inside a [`Pattern`] is positive.
//!
//! [`Pattern`]: crate::Pattern

use serde::{Deserialize, Serialize};

use crate::key::ResourceKey;

/// A quantity of one kind of resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceStack {
    /// What the stack holds.
    pub key: ResourceKey,
    /// Signed quantity.
    pub amount: i64,
}

impl ResourceStack {
    /// Create a stack of `amount` units of `key`.
    pub const fn new(key: ResourceKey, amount: i64) -> Self {
        Self { key, amount }
    }

    /// Whether the amount is strictly positive.
    pub const fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// The amount as an unsigned quantity, or `None` if it is negative.
    pub fn quantity(&self) -> Option<u64> {
        u64::try_from(self.amount).ok()
    }

    /// The same key with the amount negated, or `None` on overflow
    /// (`i64::MIN`).
    #[must_use]
    pub fn negated(&self) -> Option<Self> {
        Some(Self {
            key: self.key.clone(),
            amount: self.amount.checked_neg()?,
        })
    }
}

impl core::fmt::Display for ResourceStack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}x {}", self.amount, self.key)
    }
}
