//! Registration-ordered pattern index for the Autocraft plan resolver.
//!
//! The index maps each craftable key to the patterns whose primary output
//! is that key. Registration order is preserved and is the authoritative
//! tie-break: when several patterns produce the same key, the one
//! registered first is tried first.
//!
//! The index is read-only during resolution. It also answers fuzzy
//! substitute queries ("is there a craftable key that is fuzzy-equal to
//! this one and acceptable to the caller?") for callers that want to fall
//! back to an approximate match before submitting a request.

pub mod index;

pub use index::PatternIndex;

use autocraft_types::PatternId;

/// Errors raised while building a pattern index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// The same pattern was registered twice.
    #[error("pattern {0} is already registered")]
    DuplicatePattern(PatternId),
}
