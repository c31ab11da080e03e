//! Resource identity with exact and fuzzy equality.
//!
//! A [`ResourceKey`] names "a kind of resource" independent of quantity:
//! an item type with its damage value and variant tag, or a fluid type.
//! Exact equality (`==`, `Ord`, `Hash`) compares every attribute. Fuzzy
//! equality ([`ResourceKey::fuzzy_eq`]) ignores the variant tag and,
//! depending on the [`FuzzyMode`], some or all of the damage value. Fuzzy
//! equality is used only for substitute lookup at the pattern index
//! boundary; the resolver itself always matches exactly.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// The storage channel a resource travels through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Discrete, countable items.
    Item,
    /// Fluids, counted in the host's base fluid unit.
    Fluid,
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Item => write!(f, "item"),
            Self::Fluid => write!(f, "fluid"),
        }
    }
}

// ---------------------------------------------------------------------------
// FuzzyMode
// ---------------------------------------------------------------------------

/// How much of a key's damage state fuzzy comparison ignores.
///
/// Percent modes split the durability range of a damageable item at a
/// break point; two keys match when both fall on the same side of it.
/// Non-damageable keys have no durability and therefore always match on
/// the damage axis.
///
/// | Mode | Break point (percent of max damage) |
/// |------|-------------------------------------|
/// | `Percent99` | 0 |
/// | `Percent75` | 25 |
/// | `Percent50` | 50 |
/// | `Percent25` | 75 |
/// | `IgnoreAll` | -- |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FuzzyMode {
    /// Ignore damage entirely.
    IgnoreAll,
    /// Split pristine items from any damaged item.
    Percent99,
    /// Split at 25% of max damage.
    Percent75,
    /// Split at 50% of max damage.
    Percent50,
    /// Split at 75% of max damage.
    Percent25,
}

impl FuzzyMode {
    /// Break point as a percentage of max damage, or `None` for
    /// [`FuzzyMode::IgnoreAll`].
    pub const fn break_percent(self) -> Option<u64> {
        match self {
            Self::IgnoreAll => None,
            Self::Percent99 => Some(0),
            Self::Percent75 => Some(25),
            Self::Percent50 => Some(50),
            Self::Percent25 => Some(75),
        }
    }

    /// Compute the absolute damage break point for an item whose maximum
    /// damage is `max_damage`. Returns `None` for [`FuzzyMode::IgnoreAll`].
    pub fn break_point(self, max_damage: u32) -> Option<u64> {
        let percent = self.break_percent()?;
        u64::from(max_damage)
            .checked_mul(percent)
            .and_then(|scaled| scaled.checked_div(100))
    }
}

// ---------------------------------------------------------------------------
// ResourceKey
// ---------------------------------------------------------------------------

/// Identity of a kind of resource.
///
/// Keys are immutable; the `with_*` builders consume and return a new key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Storage channel.
    kind: ResourceKind,
    /// Registry name, e.g. `"iron_ingot"`.
    id: String,
    /// Current damage (0 = pristine).
    #[serde(default)]
    damage: u32,
    /// Maximum damage; 0 means the resource is not damageable.
    #[serde(default)]
    max_damage: u32,
    /// Optional variant tag (metadata, NBT digest, etc.).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

impl ResourceKey {
    /// Create a pristine, untagged item key.
    pub fn item(id: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Item,
            id: id.into(),
            damage: 0,
            max_damage: 0,
            tag: None,
        }
    }

    /// Create an untagged fluid key.
    pub fn fluid(id: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Fluid,
            id: id.into(),
            damage: 0,
            max_damage: 0,
            tag: None,
        }
    }

    /// Return a copy of this key with the given damage state.
    ///
    /// `damage` is clamped to `max_damage`.
    #[must_use]
    pub fn with_damage(mut self, damage: u32, max_damage: u32) -> Self {
        self.max_damage = max_damage;
        self.damage = damage.min(max_damage);
        self
    }

    /// Return a copy of this key with the given variant tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The storage channel.
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The registry name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current damage value.
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Maximum damage value (0 when not damageable).
    pub const fn max_damage(&self) -> u32 {
        self.max_damage
    }

    /// The variant tag, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Whether this resource carries durability.
    pub const fn is_damageable(&self) -> bool {
        self.max_damage > 0
    }

    /// Compare two keys ignoring the variant tag and, per `mode`, the
    /// damage value.
    ///
    /// Kind and registry name must always match exactly.
    pub fn fuzzy_eq(&self, other: &Self, mode: FuzzyMode) -> bool {
        if self.kind != other.kind || self.id != other.id {
            return false;
        }
        if !self.is_damageable() || !other.is_damageable() {
            return true;
        }
        match mode.break_point(self.max_damage) {
            None => true,
            Some(bp) => (u64::from(self.damage) <= bp) == (u64::from(other.damage) <= bp),
        }
    }

    /// The fuzzy-equivalence base of this key: same kind and id, pristine,
    /// untagged. Every key is [`FuzzyMode::IgnoreAll`]-equal to its base.
    #[must_use]
    pub fn fuzzy_base(&self) -> Self {
        Self {
            kind: self.kind,
            id: self.id.clone(),
            damage: 0,
            max_damage: self.max_damage,
            tag: None,
        }
    }
}

impl core::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)?;
        if self.is_damageable() {
            write!(f, "@{}/{}", self.damage, self.max_damage)?;
        }
        if let Some(tag) = &self.tag {
            write!(f, "#{tag}")?;
        }
        Ok(())
    }
}
