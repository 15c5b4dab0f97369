//! Arena & Node Graph (C1, §4.1).
//!
//! One flat slab of nodes (see the representation note added to
//! `SPEC_FULL.md` §3) plus a string interner, grounded on the host crate's
//! `Heap<T>` (`heap.rs`) and `Interns` (`intern.rs`). Every node in a graph
//! belongs to exactly one `Arena` -- invariant 1 in §3.4 ("every node knows
//! its owning serializer") holds structurally here because a `NodeId` is
//! only ever dereferenced against the `Arena` that produced it; there is no
//! cross-arena aliasing to guard against at runtime.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{default_error_handler, ErrorHandler};
use crate::ids::{Handle, NodeId, SymbolId, BAD_SYMBOL_ID};
use crate::node::{NodeData, NodeHeader, NodeSlot, SourceLoc};

/// String interner backing `makeSymbol`/`getSymbol` (§4.1.2).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Interner {
    strings: Vec<String>,
    #[serde(skip)]
    index: AHashMap<String, SymbolId>,
}

impl Interner {
    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, s) in self.strings.iter().enumerate() {
            self.index.insert(s.clone(), SymbolId::from_index(i));
        }
    }

    pub fn intern(&mut self, s: &str) -> SymbolId {
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = SymbolId::from_index(self.strings.len());
        self.strings.push(s.to_owned());
        self.index.insert(s.to_owned(), id);
        id
    }

    #[must_use]
    pub fn get(&self, id: SymbolId) -> &str {
        if id.is_bad() {
            return "";
        }
        &self.strings[id.index()]
    }

    #[must_use]
    pub(crate) fn strings(&self) -> &[String] {
        &self.strings
    }

    pub(crate) fn from_strings(strings: Vec<String>) -> Self {
        let mut this = Self { strings, index: AHashMap::new() };
        this.rebuild_index();
        this
    }
}

/// Owns every node instance, hands out monotonically increasing ids, and
/// provides bulk teardown (§4.1.1).
#[derive(Default)]
pub struct Arena {
    slab: Vec<Option<NodeSlot>>,
    pub interner: Interner,
    /// The single `Design` root, if one has been created. Treated as an
    /// always-live GC root alongside any outstanding `Handle` (§4.1.3).
    pub design_root: Option<NodeId>,
    #[allow(clippy::type_complexity)]
    error_handler: Option<ErrorHandler>,
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("node_count", &self.slab.iter().filter(|s| s.is_some()).count())
            .field("design_root", &self.design_root)
            .finish()
    }
}

impl Arena {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slab: Vec::new(),
            interner: Interner::default(),
            design_root: None,
            error_handler: Some(default_error_handler()),
        }
    }

    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = Some(handler);
    }

    pub(crate) fn report(
        &self,
        kind: crate::error::ErrorKind,
        message: &str,
        primary: Option<NodeId>,
        secondary: Option<NodeId>,
    ) {
        if let Some(handler) = &self.error_handler {
            handler(kind, message, primary, secondary);
        }
    }

    /// `make<K>()` (§4.1.2): allocate a node of kind `K`, parented under
    /// `parent` (or a root if `None`). Ids are assigned by a monotonic
    /// counter equal to the slab length -- never recycled, see `SPEC_FULL.md`.
    pub fn make(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::from_index(self.slab.len());
        if matches!(data, NodeData::Design(_)) {
            self.design_root.get_or_insert(id);
        }
        self.slab.push(Some(NodeSlot {
            header: NodeHeader {
                parent,
                loc: SourceLoc::default(),
                client_data: None,
            },
            data,
        }));
        id
    }

    /// `makeSymbol`/`getSymbol` (§4.1.2).
    pub fn make_symbol(&mut self, s: &str) -> SymbolId {
        self.interner.intern(s)
    }

    #[must_use]
    pub fn get_symbol(&self, id: SymbolId) -> &str {
        self.interner.get(id)
    }

    /// `makeHandle` (§4.1.2): an opaque stable handle keeping `id` alive
    /// across a `collectGarbage` pass.
    #[must_use]
    pub fn make_handle(&self, id: NodeId) -> Handle {
        Handle { id }
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeSlot> {
        self.slab.get(id.index()).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        self.slab.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(slot) = self.get_mut(id) {
            slot.header.parent = parent;
        }
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|s| s.header.parent)
    }

    /// Total slab length, including dead (GC'd) slots. Used by the
    /// serializer to size its per-kind sections.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slab.len()
    }

    /// Iterate all live nodes in arena order (§4.2.3 save algorithm step 1).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeSlot)> {
        self.slab
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|slot| (NodeId::from_index(i), slot)))
    }

    #[must_use]
    pub(crate) fn raw_slots(&self) -> &[Option<NodeSlot>] {
        &self.slab
    }

    /// Replace the arena's contents wholesale (§4.2.4 restore algorithm).
    pub(crate) fn restore_raw(&mut self, symbols: Vec<String>, slots: Vec<Option<NodeSlot>>, design_root: Option<NodeId>) {
        self.interner = Interner::from_strings(symbols);
        self.slab = slots;
        self.design_root = design_root;
    }

    /// `purge()` (§4.1.2): destroy every node and collection. After purge,
    /// all ids and references are invalid.
    pub fn purge(&mut self) {
        self.slab.clear();
        self.interner = Interner::default();
        self.design_root = None;
    }

    /// `collectGarbage()` (§4.1.2, §4.1.3): retain exactly nodes reachable
    /// by own-edges, ref-edges, and the supplied `roots` (the handles the
    /// caller still holds) from either those roots or the design root. All
    /// other nodes are destroyed; ids are never renumbered.
    pub fn collect_garbage(&mut self, roots: &[Handle]) {
        let mut visited: ahash::AHashSet<NodeId> = ahash::AHashSet::default();
        let mut stack: Vec<NodeId> = roots.iter().map(|h| h.id).collect();
        if let Some(d) = self.design_root {
            stack.push(d);
        }
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(slot) = self.get(id) {
                for child in slot.data.own_children() {
                    if !visited.contains(&child) {
                        stack.push(child);
                    }
                }
                for child in slot.data.ref_children() {
                    if !visited.contains(&child) {
                        stack.push(child);
                    }
                }
            }
        }
        for (i, slot) in self.slab.iter_mut().enumerate() {
            let id = NodeId::from_index(i);
            if slot.is_some() && !visited.contains(&id) {
                *slot = None;
            }
        }
    }

    /// `swap(old, new)` (§4.2.5): rewrite every ref-one field pointing to
    /// `old` so it points to `new` instead, graph-wide. Ownership is
    /// unchanged.
    pub fn swap(&mut self, old: NodeId, new: NodeId) {
        let mut map = AHashMap::default();
        map.insert(old, new);
        self.swap_many(&map);
    }

    /// `swap(map)` (§4.2.5): batched form of `swap`.
    pub fn swap_many(&mut self, map: &AHashMap<NodeId, NodeId>) {
        for slot in self.slab.iter_mut().flatten() {
            rewrite_refs(&mut slot.data, map);
        }
    }
}

fn rewrite_one(id: &mut Option<NodeId>, map: &AHashMap<NodeId, NodeId>) {
    if let Some(cur) = id {
        if let Some(&repl) = map.get(cur) {
            *cur = repl;
        }
    }
}

fn rewrite_many(ids: &mut [NodeId], map: &AHashMap<NodeId, NodeId>) {
    for id in ids {
        if let Some(&repl) = map.get(id) {
            *id = repl;
        }
    }
}

pub(crate) fn rewrite_refs(data: &mut NodeData, map: &AHashMap<NodeId, NodeId>) {
    match data {
        NodeData::Port(p) => rewrite_one(&mut p.low_conn, map),
        NodeData::RefObj(r) => rewrite_one(&mut r.actual, map),
        NodeData::RefTypespec(r) => rewrite_one(&mut r.actual, map),
        NodeData::BitSelect(b) => rewrite_one(&mut b.actual, map),
        NodeData::PartSelect(p) => rewrite_one(&mut p.actual, map),
        NodeData::IndexedPartSelect(p) => rewrite_one(&mut p.actual, map),
        NodeData::VarSelect(v) => {
            rewrite_one(&mut v.actual, map);
            rewrite_many(&mut v.selects, map);
        }
        NodeData::FuncCall(f) => rewrite_one(&mut f.actual, map),
        NodeData::ClassDefn(c) => rewrite_one(&mut c.extends, map),
        NodeData::ClassTypespec(c) => rewrite_one(&mut c.class_defn, map),
        NodeData::ImportTypespec(i) => rewrite_one(&mut i.actual_package, map),
        _ => {}
    }
}
