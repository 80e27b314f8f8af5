//! Stable node identity.
//!
//! The AST is a pure syntax tree (§9: "avoid multi-level inheritance",
//! modeled as a tagged union per syntactic category). Type annotations
//! produced by the checker, suspension-state numbers produced by the
//! await-point analyzer (C3), and hoisted-field assignments produced by
//! the state-machine builder (C4) are all kept in side tables keyed by
//! `NodeId` rather than embedded in the node — this is what lets the same
//! immutable tree be annotated independently by unrelated passes.

use std::sync::atomic::{AtomicU32, Ordering};

/// A stable identifier for an AST node, unique within one compilation unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const DUMMY: NodeId = NodeId(u32::MAX);
}

/// Hands out monotonically increasing `NodeId`s while building or
/// deserializing a tree.
#[derive(Debug, Default)]
pub struct NodeIdGen(AtomicU32);

impl NodeIdGen {
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn next(&self) -> NodeId {
        NodeId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let gen = NodeIdGen::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }
}
