//! Stable identifiers used throughout the arena.
//!
//! `NodeId` is the slab index of a node inside one [`crate::arena::Arena`].
//! It also serves as the node's `uhdmId` (§3.1, invariant 2 in §3.4): ids are
//! assigned by a monotonic counter and are never reused, even after
//! [`crate::arena::Arena::collect_garbage`] frees the backing slot. This
//! differs from the host interpreter's `HeapId`, which recycles freed slots
//! for `id()` reuse -- see `DESIGN.md`.

use std::fmt;

/// Index into the arena's node slab. Doubles as the node's public `uhdmId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("arena exceeded u32 node capacity"))
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interned string index (§4.1.2 `makeSymbol`/`getSymbol`).
///
/// Mirrors the host crate's `StringId` (`intern.rs`): a small `u32` index
/// into a flat interner rather than a ref-counted string, so comparisons and
/// copies are cheap and the symbol table round-trips byte-for-byte through
/// the serializer (§4.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize)]
pub struct SymbolId(u32);

/// Sentinel for "no file" / "no symbol", matching the source's `BadSymbolId`.
pub const BAD_SYMBOL_ID: SymbolId = SymbolId(u32::MAX);

impl SymbolId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("interner exceeded u32 capacity"))
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub fn is_bad(self) -> bool {
        self == BAD_SYMBOL_ID
    }
}

/// Opaque handle kept alive across a `collect_garbage` pass (§4.1.2) and
/// used as the unit of root-ness for save/restore (§4.2.2 "handle roster").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Handle {
    pub(crate) id: NodeId,
}

impl Handle {
    #[must_use]
    pub fn node_id(self) -> NodeId {
        self.id
    }
}
