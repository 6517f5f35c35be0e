use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier assigned to each node at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The last id cannot be reserved past, so it is never accepted from a file.
    pub fn is_exhausted(&self) -> bool {
        self.0 == u64::MAX
    }

    /// Makes sure ids handed out later in the process never collide with `self`.
    /// Called for every id that enters the process from a persisted document.
    pub(crate) fn reserve(self) {
        NEXT_NODE_ID.fetch_max(self.0.saturating_add(1), Ordering::Relaxed);
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = NodeId::new();
        let b = NodeId::new();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn reserve_skips_past_imported_ids() {
        let imported = NodeId(NodeId::new().as_u64() + 1_000);
        imported.reserve();
        assert!(NodeId::new() > imported);
    }

    #[test]
    fn display_is_fixed_width_hex() {
        assert_eq!(NodeId(255).to_string(), "00000000000000ff");
    }
}
