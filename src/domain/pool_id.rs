//! Type-safe pool identifier.
//!
//! [`PoolId`] wraps the zero-based position of a pool in the append-only
//! [`super::PoolRegistry`], so that pool indices cannot be confused with
//! amounts or other integers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sequential identifier of a settlement pool.
///
/// Assigned once at creation in arrival order (`0, 1, 2, ...`) and
/// immutable thereafter. Used as the registry index, the event
/// discriminator, and the WebSocket subscription target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(u64);

impl PoolId {
    /// Creates a `PoolId` from a raw index.
    #[must_use]
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the index as a `usize` for registry lookups, or `None` if it
    /// does not fit on this platform.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PoolId {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

impl From<PoolId> for u64 {
    fn from(id: PoolId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_is_plain_index() {
        assert_eq!(PoolId::new(7).to_string(), "7");
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&PoolId::new(42)).ok();
        assert_eq!(json.as_deref(), Some("42"));
        let Ok(back) = serde_json::from_str::<PoolId>("42") else {
            panic!("deserialization failed");
        };
        assert_eq!(back, PoolId::new(42));
    }

    #[test]
    fn as_index_matches_raw_value() {
        assert_eq!(PoolId::new(3).as_index(), Some(3));
    }

    #[test]
    fn ordering_follows_creation_order() {
        assert!(PoolId::new(0) < PoolId::new(1));
    }
}
