//! Assignment-pattern flattening (§4.6.5): turns a `'{a, b, c}`-shaped
//! `AssignmentPattern`/`MultiAssignmentPattern` operation into a single
//! concatenated constant sized and laid out by the target typespec.
//!
//! Grounded on `examples/original_source/include/uhdm/ExprEval.h`'s
//! `flattenPatternAssignments`/`recursiveFlattening` pair. This crate's
//! `OperationData` carries only positional operands (no distinct
//! named-key pattern node), so only positional (and `default:`-less)
//! patterns flatten; a count mismatch against the struct's member list is
//! the one case reported as `UhdmUnmatchedFieldInPatternAssign`.

use crate::error::ErrorKind;
use crate::ids::NodeId;
use crate::node::NodeData;

use super::{constant, reduce, ExprEval};

/// §4.6.5 steps: (1) read the target's member/element list, (2) walk the
/// pattern's operands in lockstep, (3) reduce and pad each to its member's
/// width, (4) concatenate msb-first, (5) stamp the result's `ref_typespec`
/// to `typespec`, (6) mark the source operation `flattened` so a second
/// pass is a no-op, (7) report a mismatch rather than guess.
pub(super) fn flatten_pattern_assignments(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, typespec: NodeId, expr: NodeId) -> NodeId {
    let Some(NodeData::Operation(op)) = arena.get(expr).map(|s| s.data.clone()) else {
        return expr;
    };
    if op.flattened {
        return expr;
    }
    let inst = arena.parent(expr).unwrap_or(expr);

    let members = member_typespecs(arena, typespec);
    if members.is_empty() {
        return expr;
    }

    if op.op_type == Some(crate::kind::OpType::MultiAssignmentPattern) {
        return flatten_multi(ev, arena, &members, &op.operands, expr);
    }

    if op.operands.len() != members.len() {
        arena.report(
            ErrorKind::UhdmUnmatchedFieldInPatternAssign,
            &format!("pattern has {} members, typespec expects {}", op.operands.len(), members.len()),
            Some(expr),
            Some(typespec),
        );
        return expr;
    }

    let mut bits = String::new();
    for (&operand, member_ts) in op.operands.iter().zip(members.iter()) {
        let width = member_ts
            .and_then(|ts| reduce::typespec_width(ev, arena, ts, inst, Some(expr), true))
            .unwrap_or(32);
        let r = ev.reduce_expr(arena, operand, inst, Some(expr));
        let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else {
            arena.report(ErrorKind::UhdmUndefinedPatternKey, "pattern element did not reduce to a constant", Some(operand), Some(expr));
            return expr;
        };
        let bin = constant::to_binary(c);
        bits.push_str(&pad_or_truncate(&bin, width as usize));
    }

    finish(arena, expr, typespec, &bits)
}

fn flatten_multi(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, members: &[Option<NodeId>], operands: &[NodeId], expr: NodeId) -> NodeId {
    let inst = arena.parent(expr).unwrap_or(expr);
    let mut bits = String::new();
    for (i, member_ts) in members.iter().enumerate() {
        let Some(&source) = operands.get(i % operands.len().max(1)) else {
            break;
        };
        let width = member_ts
            .and_then(|ts| reduce::typespec_width(ev, arena, ts, inst, Some(expr), true))
            .unwrap_or(32);
        let r = ev.reduce_expr(arena, source, inst, Some(expr));
        let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else {
            return expr;
        };
        bits.push_str(&pad_or_truncate(&constant::to_binary(c), width as usize));
    }
    let ts = member_typespecs_owner(arena, expr);
    finish(arena, expr, ts.unwrap_or(expr), &bits)
}

fn finish(arena: &mut crate::arena::Arena, expr: NodeId, typespec: NodeId, bits: &str) -> NodeId {
    let size = bits.len() as i64;
    let v = if bits.is_empty() { 0 } else { u64::from_str_radix(bits, 2).unwrap_or(0) };
    if let Some(slot) = arena.get_mut(expr) {
        if let NodeData::Operation(op) = &mut slot.data {
            op.flattened = true;
        }
    }
    let parent = arena.parent(expr);
    let mut c = constant::make_uint(v, size);
    c.ref_typespec = Some(typespec);
    arena.make(NodeData::Constant(c), parent)
}

fn pad_or_truncate(bin: &str, width: usize) -> String {
    if bin.len() >= width {
        bin[bin.len() - width..].to_owned()
    } else {
        format!("{}{bin}", "0".repeat(width - bin.len()))
    }
}

/// Per-member (or per-element) `RefTypespec` targets, in declared order.
fn member_typespecs(arena: &crate::arena::Arena, typespec: NodeId) -> Vec<Option<NodeId>> {
    match arena.get(typespec).map(|s| &s.data) {
        Some(NodeData::StructTypespec(t) | NodeData::UnionTypespec(t)) => t
            .members
            .iter()
            .map(|&m| match arena.get(m).map(|s| &s.data) {
                Some(NodeData::TypespecMember(member)) => member.ref_typespec,
                _ => None,
            })
            .collect(),
        Some(NodeData::ArrayTypespec(t) | NodeData::PackedArrayTypespec(t)) => {
            let count = t.ranges.len().max(1);
            vec![t.element_ref_typespec; count]
        }
        _ => Vec::new(),
    }
}

fn member_typespecs_owner(arena: &crate::arena::Arena, expr: NodeId) -> Option<NodeId> {
    match arena.get(expr).map(|s| &s.data) {
        Some(NodeData::Operation(o)) => o.ref_typespec,
        _ => None,
    }
}
