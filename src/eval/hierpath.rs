//! Hierarchical path decoding (§4.6.8): `a.b.c` / `a.b[2]`, walked one
//! `HierPathData` element at a time.
//!
//! Grounded on `examples/original_source/include/uhdm/ExprEval.h`'s
//! `decodeHierPath`/`hierarchicalSelector`. Step 1 resolves the first
//! element as an ordinary name in the enclosing instance; every later
//! element either descends into a nested scope (another instance/package/
//! generate block) by name, or -- once the walk has reached a plain value
//! -- narrows a bit range out of that value's `toBinary` using the
//! preceding struct typespec's member layout (§4.6.8 step 3's "member-name
//! matching on struct typespecs in typespec/value mode").

use crate::error::ErrorKind;
use crate::ids::NodeId;
use crate::node::NodeData;

use super::{constant, reduce, ExprEval, Reduction};

enum Cursor {
    /// Still inside declaration space: a scope, or an unreduced decl node.
    Node(NodeId),
    /// Already reduced to a bit pattern, plus the struct/array typespec it
    /// came from (so the next element can keep navigating by member name).
    Value(String, Option<NodeId>),
}

pub(super) fn decode_hier_path(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, path: NodeId, inst: NodeId, pexpr: Option<NodeId>, return_typespec: bool) -> Reduction {
    let Some(NodeData::HierPath(hp)) = arena.get(path).map(|s| s.data.clone()) else {
        return Reduction::failed(path);
    };
    if hp.elements.is_empty() {
        return Reduction::failed(path);
    }

    let Some(first_name) = element_name(arena, hp.elements[0]) else {
        return Reduction::failed(path);
    };
    let Some(mut cur) = ev
        .get_object(arena, &first_name, inst, pexpr)
        .map(Cursor::Node)
        .or_else(|| ev.get_value(arena, &first_name, inst, pexpr).map(Cursor::Node))
    else {
        arena.report(ErrorKind::UhdmUnsupportedExpr, &format!("unresolved hierarchical path root '{first_name}'"), Some(path), None);
        return Reduction::failed(path);
    };
    cur = apply_index(ev, arena, cur, hp.elements[0], inst, pexpr, path);

    for &elem in &hp.elements[1..] {
        let Some(name) = element_name(arena, elem) else {
            return Reduction::failed(path);
        };
        cur = match cur {
            Cursor::Node(scope) if is_scope_like(arena, scope) => match crate::resolver::UhdmFinder::new().find_object(arena, &name, scope) {
                Some(next) => Cursor::Node(next),
                None => {
                    arena.report(ErrorKind::UhdmUnsupportedExpr, &format!("no member '{name}' in hierarchical path"), Some(path), None);
                    return Reduction::failed(path);
                }
            },
            Cursor::Node(decl) => descend_member(ev, arena, decl, &name, inst, pexpr, path),
            Cursor::Value(bits, ts) => descend_member_value(arena, &bits, ts, &name, path),
        };
        cur = apply_index(ev, arena, cur, elem, inst, pexpr, path);
    }

    let parent = arena.parent(path);
    match cur {
        Cursor::Node(decl) if return_typespec => Reduction::ok(decl),
        Cursor::Node(decl) => ev.reduce_expr(arena, decl, inst, Some(path)),
        Cursor::Value(_, Some(ts)) if return_typespec => Reduction::ok(ts),
        Cursor::Value(bits, ts) => {
            let size = bits.len() as i64;
            let v = if bits.is_empty() { 0 } else { u64::from_str_radix(&bits, 2).unwrap_or(0) };
            let mut c = constant::make_uint(v, size);
            c.ref_typespec = ts;
            Reduction::ok(arena.make(NodeData::Constant(c), parent))
        }
    }
}

/// If `elem` is a `BitSelect` carrying an index expression, narrow `cur` by
/// that one bit (§4.6.8 step 4's "bit-select reduction").
fn apply_index(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, cur: Cursor, elem: NodeId, inst: NodeId, pexpr: Option<NodeId>, path: NodeId) -> Cursor {
    let Some(index_expr) = index_of(arena, elem) else {
        return cur;
    };
    let r = ev.reduce_expr(arena, index_expr, inst, pexpr);
    if r.invalid {
        return cur;
    }
    let Some(NodeData::Constant(ic)) = arena.get(r.expr).map(|s| &s.data) else {
        return cur;
    };
    let Some(index) = constant::get_uvalue(ic) else {
        return cur;
    };
    descend_index(ev, arena, cur, index, inst, Some(path))
}

fn is_scope_like(arena: &crate::arena::Arena, id: NodeId) -> bool {
    matches!(
        arena.get(id).map(|s| s.data.kind()),
        Some(crate::kind::Kind::Module | crate::kind::Kind::Interface | crate::kind::Kind::Program | crate::kind::Kind::Package | crate::kind::Kind::ClassDefn | crate::kind::Kind::GenScope)
    )
}

fn element_name(arena: &crate::arena::Arena, elem: NodeId) -> Option<String> {
    match arena.get(elem).map(|s| &s.data) {
        Some(NodeData::RefObj(r)) => r.name.map(|n| arena.get_symbol(n).to_owned()),
        Some(NodeData::BitSelect(b)) => b.name.map(|n| arena.get_symbol(n).to_owned()),
        _ => None,
    }
}

fn index_of(arena: &crate::arena::Arena, elem: NodeId) -> Option<NodeId> {
    match arena.get(elem).map(|s| &s.data) {
        Some(NodeData::BitSelect(b)) => b.index,
        _ => None,
    }
}

fn descend_index(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, cur: Cursor, index: u64, inst: NodeId, pexpr: Option<NodeId>) -> Cursor {
    match cur {
        Cursor::Value(bits, ts) => {
            if bits.is_empty() {
                return Cursor::Value(bits, ts);
            }
            let width = bits.len() as u64;
            if index >= width {
                return Cursor::Value(String::new(), ts);
            }
            let pos = (width - 1 - index) as usize;
            Cursor::Value(bits[pos..=pos].to_owned(), ts)
        }
        Cursor::Node(decl) => {
            let r = ev.reduce_bit_select(arena, decl, index, inst, pexpr);
            if r.invalid {
                Cursor::Node(decl)
            } else {
                let bits = arena
                    .get(r.expr)
                    .and_then(|s| match &s.data {
                        NodeData::Constant(c) => Some(constant::to_binary(c)),
                        _ => None,
                    })
                    .unwrap_or_default();
                Cursor::Value(bits, None)
            }
        }
    }
}

fn descend_member(ev: &ExprEval<'_>, arena: &mut crate::arena::Arena, decl: NodeId, name: &str, inst: NodeId, _pexpr: Option<NodeId>, path: NodeId) -> Cursor {
    let ts = reduce::ref_typespec_of_pub(arena, decl);
    let r = ev.reduce_expr(arena, decl, inst, Some(path));
    let bits = if r.invalid {
        String::new()
    } else {
        arena
            .get(r.expr)
            .and_then(|s| match &s.data {
                NodeData::Constant(c) => Some(constant::to_binary(c)),
                _ => None,
            })
            .unwrap_or_default()
    };
    descend_member_value(arena, &bits, ts, name, path)
}

fn descend_member_value(arena: &mut crate::arena::Arena, bits: &str, ts: Option<NodeId>, name: &str, path: NodeId) -> Cursor {
    let Some(ts) = ts else {
        arena.report(ErrorKind::UhdmUnsupportedExpr, &format!("member '{name}' has no struct typespec to resolve against"), Some(path), None);
        return Cursor::Value(String::new(), None);
    };
    let Some(NodeData::StructTypespec(st) | NodeData::UnionTypespec(st)) = arena.get(ts).map(|s| s.data.clone()) else {
        arena.report(ErrorKind::UhdmUnsupportedExpr, &format!("member '{name}' target is not a struct/union"), Some(path), Some(ts));
        return Cursor::Value(String::new(), None);
    };

    let mut offset_from_msb = 0usize;
    for &m in &st.members {
        let Some(NodeData::TypespecMember(member)) = arena.get(m).map(|s| &s.data) else {
            continue;
        };
        let width = member.ref_typespec.map_or(0, |mt| typespec_bit_width(arena, mt));
        if member.name.is_some_and(|n| arena.get_symbol(n) == name) {
            if offset_from_msb + width <= bits.len() {
                let slice = bits[offset_from_msb..offset_from_msb + width].to_owned();
                return Cursor::Value(slice, member.ref_typespec);
            }
            arena.report(ErrorKind::UhdmInternalErrorOutOfBound, &format!("member '{name}' overruns its value's declared width"), Some(path), Some(m));
            return Cursor::Value(String::new(), member.ref_typespec);
        }
        offset_from_msb += width;
    }
    arena.report(ErrorKind::UhdmUnsupportedExpr, &format!("no member named '{name}'"), Some(path), Some(ts));
    Cursor::Value(String::new(), None)
}

fn typespec_bit_width(arena: &crate::arena::Arena, ts: NodeId) -> usize {
    match arena.get(ts).map(|s| &s.data) {
        Some(NodeData::LogicTypespec(t) | NodeData::BitTypespec(t)) => ranges_width(arena, &t.ranges).max(1),
        Some(NodeData::IntTypespec(_) | NodeData::IntegerTypespec(_)) => 32,
        Some(NodeData::StructTypespec(t) | NodeData::UnionTypespec(t)) => t
            .members
            .iter()
            .filter_map(|&m| match arena.get(m).map(|s| &s.data) {
                Some(NodeData::TypespecMember(member)) => member.ref_typespec.map(|mt| typespec_bit_width(arena, mt)),
                _ => None,
            })
            .sum(),
        _ => 0,
    }
}

fn ranges_width(arena: &crate::arena::Arena, ranges: &[NodeId]) -> usize {
    let mut total = 0usize;
    for &r in ranges {
        let Some(NodeData::Range(range)) = arena.get(r).map(|s| &s.data) else {
            continue;
        };
        let (Some(l), Some(rt)) = (range.left_expr, range.right_expr) else {
            continue;
        };
        if let (Some(lv), Some(rv)) = (constant_int(arena, l), constant_int(arena, rt)) {
            total += ((lv - rv).unsigned_abs() + 1) as usize;
        }
    }
    total
}

fn constant_int(arena: &crate::arena::Arena, id: NodeId) -> Option<i64> {
    match arena.get(id).map(|s| &s.data) {
        Some(NodeData::Constant(c)) => constant::get_value(c),
        _ => None,
    }
}
