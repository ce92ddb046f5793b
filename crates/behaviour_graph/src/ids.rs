//! Session-local identities.
//!
//! A [`ShallowId`] names a live canvas item inside one [`crate::ContainerSchema`].
//! Ids are minted by the schema's own [`IdAllocator`], never by a global, so two
//! editor sessions in one process never observe each other's counters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShallowId(u64);

impl ShallowId {
    /// Placeholder for link endpoints that have not been resolved yet. Never minted.
    pub(crate) const UNRESOLVED: ShallowId = ShallowId(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShallowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id generator owned by a schema. Ids are never reissued, so an item
/// removed and later restored can keep its id without colliding.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn mint(&mut self) -> ShallowId {
        let id = ShallowId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn minted(&self) -> u64 {
        self.next - 1
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of an external resource (asset, group) as known to the resource service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocators_are_independent() {
        let mut a = IdAllocator::new();
        let mut b = IdAllocator::new();

        let first = a.mint();
        let second = a.mint();
        assert_ne!(first, second);
        assert!(second > first);

        // A second session starts from its own counter
        assert_eq!(b.mint(), first);
        assert_eq!(a.minted(), 2);
        assert_eq!(b.minted(), 1);
    }
}
