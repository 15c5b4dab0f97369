//! Listener pattern -> visitor function (§9.3).
//!
//! The source expresses walks as class hierarchies with `enterX`/`leaveX`
//! virtuals. This crate exposes a trait with two callbacks and a shared
//! mutable context instead, matching the host crate's closure/trait-based
//! dispatch style (`bytecode/vm/mod.rs`'s opcode dispatch) rather than a
//! virtual-call hierarchy. `m_visited` becomes a `HashSet<NodeId>` and
//! `m_callstack` a `Vec<NodeId>`, per §9.3.

use ahash::AHashSet;

use crate::arena::Arena;
use crate::ids::NodeId;

/// Shared mutable state threaded through one walk.
#[derive(Debug, Default)]
pub struct WalkContext {
    pub visited: AHashSet<NodeId>,
    pub call_stack: Vec<NodeId>,
    /// Halts traversal at the next enter/leave boundary (§5 "Cancellation").
    /// No partial-completion contract is defined beyond "no corruption of
    /// already-updated nodes" (§5).
    pub abort_requested: bool,
}

/// Pre-order `enter` / post-order `leave` listener over own-edges (§5,
/// "Ordering": "strictly pre-order (enter) and post-order (leave) over the
/// own-edges, in declared order within each collection").
pub trait Listener {
    fn enter(&mut self, arena: &Arena, id: NodeId, ctx: &mut WalkContext);
    fn leave(&mut self, arena: &Arena, id: NodeId, ctx: &mut WalkContext);
}

/// Walk the own-edge subtree rooted at `root`, calling `listener` in strict
/// pre/post order. Recursion through a node already on `call_stack` is
/// skipped (mirrors the elaborator's "entering a module whose elaboration
/// is already in progress ... is a no-op", §4.5.4).
pub fn walk(arena: &Arena, root: NodeId, listener: &mut dyn Listener) {
    let mut ctx = WalkContext::default();
    walk_inner(arena, root, listener, &mut ctx);
}

fn walk_inner(arena: &Arena, id: NodeId, listener: &mut dyn Listener, ctx: &mut WalkContext) {
    if ctx.abort_requested || ctx.call_stack.contains(&id) {
        return;
    }
    ctx.call_stack.push(id);
    ctx.visited.insert(id);
    listener.enter(arena, id, ctx);
    if !ctx.abort_requested {
        if let Some(slot) = arena.get(id) {
            for child in slot.data.own_children() {
                if ctx.abort_requested {
                    break;
                }
                walk_inner(arena, child, listener, ctx);
            }
        }
    }
    listener.leave(arena, id, ctx);
    ctx.call_stack.pop();
}
