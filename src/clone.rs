//! Clone Engine (C3, §4.3).
//!
//! Produces a deep copy of a subgraph, rewriting internal ref-one edges to
//! point at clones rather than originals (§4.3.2). Grounded on
//! `templates/Elaborator.cpp`'s `deepCopy`/`CloneContext` split: a
//! mechanical default that copies every field (here: `NodeData::clone()`,
//! since every payload derives `Clone`) plus a second pass that retargets
//! cross-references through the context's visited map -- the host crate has
//! no direct analogue (its `Value`s are refcounted, not deep-cloned by an
//! explicit engine), so this module follows the original source's shape
//! directly rather than adapting a host-crate pattern.

use ahash::AHashMap;

use crate::arena::Arena;
use crate::ids::NodeId;

/// Carries the serializer (here: the arena) newly-made clones go into, plus
/// the identity map used to rewrite cross-references and to cache already-
/// cloned nodes reachable by more than one path (§4.3.2, §9.7 "clone-then-
/// mutate").
pub struct CloneContext<'a> {
    pub arena: &'a mut Arena,
    pub visited: AHashMap<NodeId, NodeId>,
}

impl<'a> CloneContext<'a> {
    pub fn new(arena: &'a mut Arena) -> Self {
        Self {
            arena,
            visited: AHashMap::default(),
        }
    }

    /// `clone(root, context) -> root'` (§4.3.2).
    ///
    /// Every node reachable by own-edges from `root` is recreated fresh in
    /// the same arena with new ids. The clone of `root` gets `parent` as its
    /// parent (not `root`'s original parent). Ref-one edges among the
    /// cloned set are rewritten to point at the clones; ref-one edges to
    /// nodes outside the cloned set are left pointing at the originals.
    pub fn clone_subgraph(&mut self, root: NodeId, parent: NodeId) -> NodeId {
        let new_root = self.clone_own(root, parent);
        self.rewrite_refs_in_clones();
        new_root
    }

    fn clone_own(&mut self, root: NodeId, parent: NodeId) -> NodeId {
        if let Some(&existing) = self.visited.get(&root) {
            return existing;
        }
        // §4.3.3: a ref-typespec (or any ref field) that resolves to
        // nothing propagates null through the clone; we never promote a
        // missing node to an error here.
        let Some(slot) = self.arena.get(root) else {
            return root;
        };
        let mut data = slot.data.clone();
        let new_id = self.arena.make(data.clone(), Some(parent));
        self.visited.insert(root, new_id);
        data.rewrite_own_children(|child| self.clone_own(child, new_id));
        if let Some(new_slot) = self.arena.get_mut(new_id) {
            new_slot.data = data;
        }
        new_id
    }

    fn rewrite_refs_in_clones(&mut self) {
        let new_ids: Vec<NodeId> = self.visited.values().copied().collect();
        for id in new_ids {
            if let Some(slot) = self.arena.get_mut(id) {
                crate::arena::rewrite_refs(&mut slot.data, &self.visited);
            }
        }
    }
}

/// Convenience wrapper matching §4.3.2's free-function signature.
pub fn clone(arena: &mut Arena, root: NodeId, parent: NodeId) -> NodeId {
    CloneContext::new(arena).clone_subgraph(root, parent)
}
