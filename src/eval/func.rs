//! Statement evaluation and lvalue writes (§4.6.6, §4.6.7).
//!
//! Grounded on `examples/original_source/include/uhdm/ExprEval.h`'s
//! `evalFunc`/`evalStmt` and `setValueInInstance`. A function/task body
//! runs in a transient frame (§4.6.7): IO decls are seeded from the call's
//! arguments, a sentinel variable named after the routine collects the
//! return value, and statements dispatch on kind through `eval_stmt`.
//! `set_value_in_instance`'s default writes into the instance's
//! `param_assigns` table, matching how elaboration itself records
//! parameter overrides (§4.5's "param-assigns before parameters"); a
//! function's local frame (this module's `FuncEnv`) shadows that default
//! for its own IO decls and variables.

use std::cell::RefCell;

use ahash::AHashMap;

use crate::error::ErrorKind;
use crate::ids::NodeId;
use crate::kind::OpType;
use crate::node::{NodeData, ParamAssignData};

use super::{constant, ExprEval, ObjectProvider, Reduction};

/// Control flow signal threaded back up through `eval_stmt` (§4.6.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Return,
    Break,
    Continue,
}

struct FuncEnv<'p> {
    base: &'p dyn ObjectProvider,
    vars: RefCell<AHashMap<String, NodeId>>,
}

impl<'p> ObjectProvider for FuncEnv<'p> {
    fn get_object(&self, arena: &crate::arena::Arena, name: &str, inst: NodeId, pexpr: Option<NodeId>) -> Option<NodeId> {
        self.vars.borrow().get(name).copied().or_else(|| self.base.get_object(arena, name, inst, pexpr))
    }

    fn get_task_func(&self, arena: &crate::arena::Arena, name: &str, inst: NodeId) -> Option<NodeId> {
        self.base.get_task_func(arena, name, inst)
    }

    fn get_value(&self, arena: &crate::arena::Arena, name: &str, inst: NodeId, pexpr: Option<NodeId>) -> Option<NodeId> {
        self.vars.borrow().get(name).copied().or_else(|| self.base.get_value(arena, name, inst, pexpr))
    }

    fn set_value(&self, arena: &mut crate::arena::Arena, name: &str, value: NodeId, inst: NodeId) {
        if self.vars.borrow().contains_key(name) {
            self.vars.borrow_mut().insert(name.to_owned(), value);
        } else {
            self.base.set_value(arena, name, value, inst);
        }
    }
}

/// `evalFunc` (§4.6.7): seeds a transient frame from `args`, runs the body,
/// and returns the sentinel return variable's final value.
pub(super) fn eval_func<'p>(ev: &ExprEval<'p>, arena: &mut crate::arena::Arena, func: NodeId, args: &[NodeId], inst: NodeId) -> Reduction {
    let Some(NodeData::Function(f) | NodeData::Task(f)) = arena.get(func).map(|s| s.data.clone()) else {
        return Reduction::failed(func);
    };
    let Some(name_sym) = f.name else {
        return Reduction::failed(func);
    };
    let func_name = arena.get_symbol(name_sym).to_owned();

    let mut vars = AHashMap::default();
    for (&decl, &arg) in f.io_decls.iter().zip(args.iter()) {
        let Some(decl_name) = decl_name_of(arena, decl) else { continue };
        let r = ev.reduce_expr(arena, arg, inst, None);
        if !r.invalid {
            vars.insert(decl_name, r.expr);
        }
    }
    for &var in &f.variables {
        let Some(NodeData::Variable(v)) = arena.get(var).map(|s| &s.data) else {
            continue;
        };
        let Some(n) = v.name else { continue };
        let n = arena.get_symbol(n).to_owned();
        if let Some(init) = v.expr {
            let r = ev.reduce_expr(arena, init, inst, None);
            if !r.invalid {
                vars.insert(n, r.expr);
                continue;
            }
        }
        vars.insert(n, arena.make(NodeData::Constant(constant::make_int(0, 32)), Some(func)));
    }
    vars.insert(func_name.clone(), arena.make(NodeData::Constant(constant::make_int(0, 32)), Some(func)));

    let env = FuncEnv { base: ev.provider, vars: RefCell::new(vars) };
    let inner = ExprEval::new(&env, true);

    if let Some(stmt) = f.stmt {
        eval_stmt(&inner, arena, stmt, inst);
    }

    match env.vars.borrow().get(&func_name).copied() {
        Some(id) => Reduction::ok(id),
        None => Reduction::failed(func),
    }
}

fn decl_name_of(arena: &crate::arena::Arena, decl: NodeId) -> Option<String> {
    match arena.get(decl).map(|s| &s.data) {
        Some(NodeData::Port(p)) => p.name.map(|n| arena.get_symbol(n).to_owned()),
        Some(NodeData::Variable(v)) => v.name.map(|n| arena.get_symbol(n).to_owned()),
        Some(NodeData::Parameter(p)) => p.name.map(|n| arena.get_symbol(n).to_owned()),
        _ => None,
    }
}

const MAX_LOOP_ITERATIONS: u32 = 100_000;

/// `evalStmt` (§4.6.7): one statement-kind dispatch step.
fn eval_stmt(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, stmt: NodeId, inst: NodeId) -> Flow {
    let Some(data) = arena.get(stmt).map(|s| s.data.clone()) else {
        return Flow::Next;
    };
    match data {
        NodeData::Begin(b) | NodeData::Fork(b) => {
            for &s in &b.stmts {
                let flow = eval_stmt(ev, arena, s, inst);
                if flow != Flow::Next {
                    return flow;
                }
            }
            Flow::Next
        }
        NodeData::IfStmt(i) => {
            if truthy(ev, arena, i.condition, inst) {
                i.stmt.map_or(Flow::Next, |s| eval_stmt(ev, arena, s, inst))
            } else {
                Flow::Next
            }
        }
        NodeData::IfElse(i) => {
            let branch = if truthy(ev, arena, i.condition, inst) { i.then_stmt } else { i.else_stmt };
            branch.map_or(Flow::Next, |s| eval_stmt(ev, arena, s, inst))
        }
        NodeData::CaseStmt(c) => eval_case(ev, arena, &c, inst),
        NodeData::WhileStmt(w) => {
            let mut n = 0;
            while truthy(ev, arena, w.condition, inst) && n < MAX_LOOP_ITERATIONS {
                n += 1;
                let flow = w.stmt.map_or(Flow::Next, |s| eval_stmt(ev, arena, s, inst));
                match flow {
                    Flow::Break => break,
                    Flow::Return => return Flow::Return,
                    Flow::Next | Flow::Continue => {}
                }
            }
            Flow::Next
        }
        NodeData::DoWhile(w) => {
            let mut n = 0;
            loop {
                let flow = w.stmt.map_or(Flow::Next, |s| eval_stmt(ev, arena, s, inst));
                match flow {
                    Flow::Break => break,
                    Flow::Return => return Flow::Return,
                    Flow::Next | Flow::Continue => {}
                }
                n += 1;
                if n >= MAX_LOOP_ITERATIONS || !truthy(ev, arena, w.condition, inst) {
                    break;
                }
            }
            Flow::Next
        }
        NodeData::RepeatStmt(r) => {
            let count = r
                .count
                .and_then(|c| {
                    let red = ev.reduce_expr(arena, c, inst, None);
                    (!red.invalid).then_some(red.expr)
                })
                .and_then(|c| get_const_value(arena, c))
                .unwrap_or(0)
                .max(0);
            for _ in 0..(count as u32).min(MAX_LOOP_ITERATIONS) {
                let flow = r.stmt.map_or(Flow::Next, |s| eval_stmt(ev, arena, s, inst));
                match flow {
                    Flow::Break => break,
                    Flow::Return => return Flow::Return,
                    Flow::Next | Flow::Continue => {}
                }
            }
            Flow::Next
        }
        NodeData::ForStmt(f) => {
            for &init in &f.inits {
                eval_stmt(ev, arena, init, inst);
            }
            let mut n = 0;
            while truthy(ev, arena, f.condition, inst) && n < MAX_LOOP_ITERATIONS {
                n += 1;
                let flow = f.stmt.map_or(Flow::Next, |s| eval_stmt(ev, arena, s, inst));
                match flow {
                    Flow::Break => break,
                    Flow::Return => return Flow::Return,
                    Flow::Next | Flow::Continue => {}
                }
                for &inc in &f.increments {
                    eval_stmt(ev, arena, inc, inst);
                }
            }
            Flow::Next
        }
        NodeData::ReturnStmt(r) => {
            if let Some(expr) = r.condition {
                let red = ev.reduce_expr(arena, expr, inst, None);
                if !red.invalid {
                    if let Some(NodeData::Function(f) | NodeData::Task(f)) = arena.parent(stmt).and_then(|p| arena.get(p)).map(|s| s.data.clone()) {
                        if let Some(n) = f.name {
                            let name = arena.get_symbol(n).to_owned();
                            ev.set_value_in_instance(arena, &name, red.expr, inst);
                        }
                    }
                }
            }
            Flow::Return
        }
        NodeData::ContinueStmt(_) => Flow::Continue,
        NodeData::BreakStmt(_) => Flow::Break,
        NodeData::Assignment(a) => {
            eval_assignment(ev, arena, &a, inst);
            Flow::Next
        }
        NodeData::Operation(_) => {
            ev.reduce_expr(arena, stmt, inst, None);
            Flow::Next
        }
        other => {
            arena.report(ErrorKind::UhdmUnsupportedStmt, &format!("statement kind {:?} is not executable by this evaluator", other.kind()), Some(stmt), None);
            Flow::Next
        }
    }
}

fn truthy(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, cond: Option<NodeId>, inst: NodeId) -> bool {
    let Some(cond) = cond else { return false };
    let r = ev.reduce_expr(arena, cond, inst, None);
    if r.invalid {
        return false;
    }
    get_const_value(arena, r.expr).unwrap_or(0) != 0
}

fn get_const_value(arena: &crate::arena::Arena, id: NodeId) -> Option<i64> {
    match arena.get(id).map(|s| &s.data) {
        Some(NodeData::Constant(c)) => constant::get_value(c),
        _ => None,
    }
}

fn eval_case(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, c: &crate::node::CaseStmtData, inst: NodeId) -> Flow {
    let Some(cond) = c.condition else { return Flow::Next };
    let r = ev.reduce_expr(arena, cond, inst, None);
    if r.invalid {
        return Flow::Next;
    }
    let Some(NodeData::Constant(cc)) = arena.get(r.expr).map(|s| &s.data) else {
        return Flow::Next;
    };
    let cond_bits = constant::to_binary(cc);

    let mut default_item = None;
    for &item in &c.items {
        let Some(NodeData::CaseItem(ci)) = arena.get(item).map(|s| s.data.clone()) else {
            continue;
        };
        if ci.exprs.is_empty() {
            default_item = ci.stmt;
            continue;
        }
        for &e in &ci.exprs {
            let er = ev.reduce_expr(arena, e, inst, None);
            if er.invalid {
                continue;
            }
            if let Some(NodeData::Constant(ec)) = arena.get(er.expr).map(|s| &s.data) {
                if constant::to_binary(ec) == cond_bits {
                    return ci.stmt.map_or(Flow::Next, |s| eval_stmt(ev, arena, s, inst));
                }
            }
        }
    }
    default_item.map_or(Flow::Next, |s| eval_stmt(ev, arena, s, inst))
}

fn eval_assignment(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, a: &crate::node::AssignmentData, inst: NodeId) {
    let (Some(lhs), Some(rhs)) = (a.lhs, a.rhs) else { return };
    let Some(name) = lvalue_name(arena, lhs) else {
        arena.report(ErrorKind::UhdmUnsupportedStmt, "assignment lhs is not a simple name, bit-select, or part-select", Some(lhs), None);
        return;
    };

    let rhs_reduced = ev.reduce_expr(arena, rhs, inst, Some(lhs));
    if rhs_reduced.invalid {
        return;
    }

    let new_value = if let Some(op_type) = a.op_type {
        combine_compound(ev, arena, op_type, lhs, rhs_reduced.expr, inst)
    } else {
        Some(rhs_reduced.expr)
    };
    let Some(new_value) = new_value else { return };
    write_lvalue(ev, arena, lhs, &name, new_value, inst);
}

fn combine_compound(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, op_type: OpType, lhs: NodeId, rhs: NodeId, inst: NodeId) -> Option<NodeId> {
    let old = ev.reduce_expr(arena, lhs, inst, None);
    if old.invalid {
        return None;
    }
    let parent = arena.parent(lhs);
    let op = arena.make(
        NodeData::Operation(crate::node::OperationData {
            op_type: Some(op_type),
            operands: vec![old.expr, rhs],
            ref_typespec: None,
            reordered: false,
            flattened: false,
        }),
        parent,
    );
    let r = ev.reduce_expr(arena, op, inst, None);
    (!r.invalid).then_some(r.expr)
}

/// Only `RefObj`/`BitSelect`/`VarSelect` lvalues and `Concat` (for `{a,b} =
/// ...`) resolve to a single top-level name this evaluator can route a
/// write through (§4.6.6); part-selects are written back through
/// `write_lvalue`'s own bit-range handling instead of a plain name.
fn lvalue_name(arena: &crate::arena::Arena, lhs: NodeId) -> Option<String> {
    match arena.get(lhs).map(|s| &s.data) {
        Some(NodeData::RefObj(r)) => r.name.map(|n| arena.get_symbol(n).to_owned()),
        Some(NodeData::BitSelect(b)) => b.name.map(|n| arena.get_symbol(n).to_owned()),
        Some(NodeData::VarSelect(v)) => v.name.map(|n| arena.get_symbol(n).to_owned()),
        Some(NodeData::PartSelect(p)) => p.actual.and_then(|a| lvalue_name(arena, a)),
        Some(NodeData::IndexedPartSelect(p)) => p.actual.and_then(|a| lvalue_name(arena, a)),
        _ => None,
    }
}

fn write_lvalue(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, lhs: NodeId, name: &str, value: NodeId, inst: NodeId) {
    match arena.get(lhs).map(|s| s.data.clone()) {
        Some(NodeData::RefObj(_)) => ev.set_value_in_instance(arena, name, value, inst),
        Some(NodeData::BitSelect(b)) => {
            let Some(index_expr) = b.index else { return };
            let idx = ev.reduce_expr(arena, index_expr, inst, None);
            if idx.invalid {
                return;
            }
            let Some(index) = get_const_value(arena, idx.expr).map(|v| v as u64) else { return };
            write_bit(ev, arena, name, index, value, inst);
        }
        Some(NodeData::PartSelect(p)) => {
            let (Some(l), Some(r)) = (p.left_range, p.right_range) else { return };
            let lv = ev.reduce_expr(arena, l, inst, None);
            let rv = ev.reduce_expr(arena, r, inst, None);
            if lv.invalid || rv.invalid {
                return;
            }
            let (Some(li), Some(ri)) = (get_const_value(arena, lv.expr), get_const_value(arena, rv.expr)) else {
                return;
            };
            write_range(ev, arena, name, li.min(ri) as u64, li.max(ri) as u64, value, inst);
        }
        _ => ev.set_value_in_instance(arena, name, value, inst),
    }
}

fn write_bit(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, name: &str, index: u64, bit_value: NodeId, inst: NodeId) {
    write_range(ev, arena, name, index, index, bit_value, inst);
}

/// Read-modify-write a `[hi:lo]` range of `name`'s current value with
/// `value`'s low bits, then write the whole thing back (§4.6.6).
fn write_range(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, name: &str, lo: u64, hi: u64, value: NodeId, inst: NodeId) {
    let Some(old_id) = ev.get_value(arena, name, inst, None) else { return };
    let old_r = ev.reduce_expr(arena, old_id, inst, None);
    if old_r.invalid {
        return;
    }
    let Some(NodeData::Constant(old_c)) = arena.get(old_r.expr).map(|s| &s.data) else {
        return;
    };
    let mut bits: Vec<u8> = constant::to_binary(old_c).into_bytes();
    if bits.is_empty() {
        return;
    }
    let width = bits.len() as u64;
    let value_r = ev.reduce_expr(arena, value, inst, None);
    if value_r.invalid {
        return;
    }
    let Some(NodeData::Constant(value_c)) = arena.get(value_r.expr).map(|s| &s.data) else {
        return;
    };
    let value_bits = constant::to_binary(value_c);
    let value_bytes = value_bits.as_bytes();
    for (i, bit_pos) in (lo..=hi).enumerate() {
        if bit_pos >= width {
            continue;
        }
        let dest = (width - 1 - bit_pos) as usize;
        let src = value_bytes.len().checked_sub(i + 1);
        bits[dest] = src.map_or(b'0', |s| value_bytes[s]);
    }
    let bit_string = String::from_utf8(bits).unwrap_or_default();
    let Ok(v) = u64::from_str_radix(&bit_string, 2) else { return };
    let parent = arena.parent(old_r.expr);
    let new_node = arena.make(NodeData::Constant(constant::make_uint(v, width as i64)), parent);
    ev.set_value_in_instance(arena, name, new_node, inst);
}

/// Default `setValueInInstance` (§4.6.6): find-or-create the matching
/// `ParamAssign` in `inst`'s table and overwrite its rhs with `value`.
pub(super) fn default_set_value_in_instance(arena: &mut crate::arena::Arena, lhs_name: &str, value: NodeId, inst: NodeId) {
    let Some(param_assigns) = (match arena.get(inst).map(|s| &s.data) {
        Some(NodeData::Module(i) | NodeData::Interface(i) | NodeData::Program(i)) => Some(i.param_assigns.clone()),
        Some(NodeData::Package(p)) => Some(p.param_assigns.clone()),
        Some(NodeData::ClassDefn(c)) => Some(c.param_assigns.clone()),
        Some(NodeData::GenScope(g)) => Some(g.param_assigns.clone()),
        _ => None,
    }) else {
        return;
    };

    for &pa_id in &param_assigns {
        if let Some(NodeData::ParamAssign(pa)) = arena.get(pa_id).map(|s| &s.data) {
            if let Some(lhs) = pa.lhs {
                if let Some(NodeData::RefObj(r)) = arena.get(lhs).map(|s| &s.data) {
                    if r.name.is_some_and(|n| arena.get_symbol(n) == lhs_name) {
                        if let Some(slot) = arena.get_mut(pa_id) {
                            if let NodeData::ParamAssign(pa) = &mut slot.data {
                                pa.rhs = Some(value);
                            }
                        }
                        return;
                    }
                }
            }
        }
    }

    let name_sym = arena.make_symbol(lhs_name);
    let lhs = arena.make(NodeData::RefObj(crate::node::RefObjData { name: Some(name_sym), actual: None, ref_typespec: None }), Some(inst));
    let new_pa = arena.make(
        NodeData::ParamAssign(ParamAssignData { lhs: Some(lhs), rhs: Some(value), is_override: false }),
        Some(inst),
    );
    if let Some(slot) = arena.get_mut(inst) {
        match &mut slot.data {
            NodeData::Module(i) | NodeData::Interface(i) | NodeData::Program(i) => i.param_assigns.push(new_pa),
            NodeData::Package(p) => p.param_assigns.push(new_pa),
            NodeData::ClassDefn(c) => c.param_assigns.push(new_pa),
            NodeData::GenScope(g) => g.param_assigns.push(new_pa),
            _ => {}
        }
    }
}
