//! Expression Evaluator (C6, §4.6): partial evaluation of expressions
//! against an enclosing instance/expression scope.
//!
//! Grounded on `examples/original_source/include/uhdm/ExprEval.h`: the
//! `ObjectProvider` three-method seam (§9.4, §4.7), `reduceExpr` as the main
//! recursive driver, and the `get_value`/`get_uvalue`/`get_double`/
//! `toBinary` family for reading tagged constants (§9.6, `constant.rs`).
//! Where the original threads `bool& invalidValue` as an out-parameter, this
//! crate returns `Reduction` (§9.5: "return `(ExprRef, bool)`").

mod constant;
mod func;
mod hierpath;
mod pattern;
mod reduce;

pub use constant::{get_double, get_uvalue, get_value, to_binary};

use crate::arena::Arena;
use crate::error::ErrorKind;
use crate::ids::NodeId;
use crate::node::NodeData;
use crate::resolver::UhdmFinder;

/// Outcome of a reduction attempt (§9.5). `invalid` mirrors the original's
/// `invalidValue` out-parameter; `expr` is always present, either the new
/// constant or (on failure) the original expression unchanged (§4.6.1).
#[derive(Debug, Clone, Copy)]
pub struct Reduction {
    pub expr: NodeId,
    pub invalid: bool,
}

impl Reduction {
    #[must_use]
    pub fn ok(expr: NodeId) -> Self {
        Self { expr, invalid: false }
    }

    #[must_use]
    pub fn failed(expr: NodeId) -> Self {
        Self { expr, invalid: true }
    }
}

/// Pluggable identifier resolution (§9.4, §4.7): three read methods so that
/// front-ends may inject their own binding logic without forking the
/// evaluator, plus a write hook (default: instance param-assign mutation,
/// §4.6.6) that `evalFunc`'s local-variable frame overrides so compound
/// assigns and inc/dec inside a function body land in its own scope rather
/// than the enclosing instance's.
pub trait ObjectProvider {
    fn get_object(&self, arena: &Arena, name: &str, inst: NodeId, pexpr: Option<NodeId>) -> Option<NodeId>;
    fn get_task_func(&self, arena: &Arena, name: &str, inst: NodeId) -> Option<NodeId>;
    fn get_value(&self, arena: &Arena, name: &str, inst: NodeId, pexpr: Option<NodeId>) -> Option<NodeId>;

    fn set_value(&self, arena: &mut Arena, name: &str, value: NodeId, inst: NodeId) {
        func::default_set_value_in_instance(arena, name, value, inst);
    }
}

/// The in-tree default: walks the instance declarations and the scope chain
/// via [`UhdmFinder`] (§9.4 "default in-tree implementation").
#[derive(Debug, Default)]
pub struct DefaultProvider;

impl ObjectProvider for DefaultProvider {
    fn get_object(&self, arena: &Arena, name: &str, inst: NodeId, pexpr: Option<NodeId>) -> Option<NodeId> {
        let scope = pexpr.and_then(|p| arena.parent(p)).unwrap_or(inst);
        UhdmFinder::new().find_object(arena, name, scope)
    }

    fn get_task_func(&self, arena: &Arena, name: &str, inst: NodeId) -> Option<NodeId> {
        let id = UhdmFinder::new().find_object(arena, name, inst)?;
        matches!(arena.get(id).map(|s| s.data.kind()), Some(crate::kind::Kind::Function | crate::kind::Kind::Task)).then_some(id)
    }

    fn get_value(&self, arena: &Arena, name: &str, inst: NodeId, pexpr: Option<NodeId>) -> Option<NodeId> {
        let scope = pexpr.and_then(|p| arena.parent(p)).unwrap_or(inst);
        param_assign_value(arena, name, scope).or_else(|| self.get_object(arena, name, inst, pexpr))
    }
}

/// Walk up from `scope` through `param_assigns`/parameter collections
/// looking for a binding named `name`, returning the bound value node
/// (§4.4.4's "param-assigns before parameters" table order, reused here).
fn param_assign_value(arena: &Arena, name: &str, scope: NodeId) -> Option<NodeId> {
    let mut cur = Some(scope);
    while let Some(id) = cur {
        let Some(slot) = arena.get(id) else { break };
        let param_assigns: &[NodeId] = match &slot.data {
            NodeData::Module(i) | NodeData::Interface(i) | NodeData::Program(i) => &i.param_assigns,
            NodeData::Package(p) => &p.param_assigns,
            NodeData::ClassDefn(c) => &c.param_assigns,
            NodeData::GenScope(g) => &g.param_assigns,
            _ => &[],
        };
        for &pa_id in param_assigns {
            if let Some(NodeData::ParamAssign(pa)) = arena.get(pa_id).map(|s| &s.data) {
                if let Some(lhs) = pa.lhs {
                    if let Some(NodeData::RefObj(r)) = arena.get(lhs).map(|s| &s.data) {
                        if r.name.is_some_and(|n| arena.get_symbol(n) == name) {
                            return pa.rhs;
                        }
                    }
                }
            }
        }
        cur = slot.header.parent;
    }
    None
}

/// `ExprEval` (§4.6.1, §6.2): owns nothing but a provider reference and the
/// mute-errors flag; every call takes the arena and scope context fresh.
pub struct ExprEval<'p> {
    provider: &'p dyn ObjectProvider,
    mute_errors: bool,
}

impl<'p> ExprEval<'p> {
    #[must_use]
    pub fn new(provider: &'p dyn ObjectProvider, mute_errors: bool) -> Self {
        Self { provider, mute_errors }
    }

    fn report(&self, arena: &Arena, kind: ErrorKind, message: &str, primary: NodeId) {
        if !self.mute_errors {
            arena.report(kind, message, Some(primary), None);
        }
    }

    /// `reduceExpr` (§4.6.2): the main recursive driver.
    pub fn reduce_expr(&self, arena: &mut Arena, expr: NodeId, inst: NodeId, pexpr: Option<NodeId>) -> Reduction {
        reduce::reduce_expr(self, arena, expr, inst, pexpr)
    }

    /// `reduceCompOp` (§4.6.2): comparisons, isolated since they also fall
    /// back to floating-point then string comparison (§4.6.4).
    pub fn reduce_comp_op(&self, arena: &mut Arena, op: NodeId, inst: NodeId, pexpr: Option<NodeId>) -> Reduction {
        reduce::reduce_comp_op(self, arena, op, inst, pexpr)
    }

    /// `reduceBitSelect` (§4.6.2).
    pub fn reduce_bit_select(&self, arena: &mut Arena, expr: NodeId, index: u64, inst: NodeId, pexpr: Option<NodeId>) -> Reduction {
        reduce::reduce_bit_select(self, arena, expr, index, inst, pexpr)
    }

    /// `size` (§4.6.2): bit-width of any typespec-bearing node.
    pub fn size(&self, arena: &mut Arena, node: NodeId, inst: NodeId, pexpr: Option<NodeId>, full: bool) -> Option<u64> {
        reduce::size_of(self, arena, node, inst, pexpr, full)
    }

    /// `getObject` (§4.6.2).
    #[must_use]
    pub fn get_object(&self, arena: &Arena, name: &str, inst: NodeId, pexpr: Option<NodeId>) -> Option<NodeId> {
        self.provider.get_object(arena, name, inst, pexpr)
    }

    /// `getValue` (§4.6.2).
    #[must_use]
    pub fn get_value(&self, arena: &Arena, name: &str, inst: NodeId, pexpr: Option<NodeId>) -> Option<NodeId> {
        self.provider.get_value(arena, name, inst, pexpr)
    }

    /// `getTaskFunc`.
    #[must_use]
    pub fn get_task_func(&self, arena: &Arena, name: &str, inst: NodeId) -> Option<NodeId> {
        self.provider.get_task_func(arena, name, inst)
    }

    /// `evalFunc` (§4.6.7).
    pub fn eval_func(&self, arena: &mut Arena, func: NodeId, args: &[NodeId], inst: NodeId) -> Reduction {
        func::eval_func(self, arena, func, args, inst)
    }

    /// `flattenPatternAssignments` (§4.6.5).
    pub fn flatten_pattern_assignments(&self, arena: &mut Arena, typespec: NodeId, expr: NodeId) -> NodeId {
        pattern::flatten_pattern_assignments(self, arena, typespec, expr)
    }

    /// `decodeHierPath` (§4.6.8).
    pub fn decode_hier_path(&self, arena: &mut Arena, path: NodeId, inst: NodeId, pexpr: Option<NodeId>, return_typespec: bool) -> Reduction {
        hierpath::decode_hier_path(self, arena, path, inst, pexpr, return_typespec)
    }

    /// `setValueInInstance` (§4.6.6): routed through the provider so a
    /// function's local frame can intercept writes to its own variables.
    pub fn set_value_in_instance(&self, arena: &mut Arena, lhs_name: &str, rhs: NodeId, inst: NodeId) {
        self.provider.set_value(arena, lhs_name, rhs, inst);
    }

    /// `prettyPrint` (§4.6.2): source-like rendering for diagnostics.
    #[must_use]
    pub fn pretty_print(&self, arena: &Arena, expr: NodeId) -> String {
        pretty_print(arena, expr)
    }
}

fn pretty_print(arena: &Arena, expr: NodeId) -> String {
    let Some(slot) = arena.get(expr) else {
        return "<null>".to_owned();
    };
    match &slot.data {
        NodeData::Constant(c) => c.value.clone(),
        NodeData::RefObj(r) => r.name.map_or_else(|| "<ref>".to_owned(), |n| arena.get_symbol(n).to_owned()),
        NodeData::Operation(o) => {
            let op: &str = o.op_type.map_or("op", Into::into);
            let parts: Vec<String> = o.operands.iter().map(|&id| pretty_print(arena, id)).collect();
            format!("({op} {})", parts.join(" "))
        }
        NodeData::HierPath(h) => {
            let parts: Vec<String> = h.elements.iter().map(|&id| pretty_print(arena, id)).collect();
            parts.join(".")
        }
        NodeData::BitSelect(b) => {
            let base = b.name.map_or_else(|| "<expr>".to_owned(), |n| arena.get_symbol(n).to_owned());
            let idx = b.index.map_or_else(|| "?".to_owned(), |id| pretty_print(arena, id));
            format!("{base}[{idx}]")
        }
        _ => format!("<{:?}>", slot.data.kind()),
    }
}
