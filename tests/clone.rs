//! Clone Engine tests (C3, §4.3): deep copy with ref-one edges retargeted
//! to the cloned set, and untouched originals.

use uhdm::node::{ConstType, ConstantData, NodeData, OperationData, RefObjData};
use uhdm::{kind::OpType, Arena};

fn make_const(arena: &mut Arena, parent: Option<uhdm::NodeId>, v: i64) -> uhdm::NodeId {
    arena.make(
        NodeData::Constant(ConstantData { value: format!("INT:{v}"), const_type: Some(ConstType::Int), size: 32, ref_typespec: None }),
        parent,
    )
}

#[test]
fn clone_subgraph_produces_fresh_ids_for_every_own_child() {
    let mut arena = Arena::new();
    let root_parent = make_const(&mut arena, None, 0);
    let a = make_const(&mut arena, Some(root_parent), 1);
    let b = make_const(&mut arena, Some(root_parent), 2);
    let op = arena.make(
        NodeData::Operation(OperationData { op_type: Some(OpType::Add), operands: vec![a, b], ref_typespec: None, reordered: false, flattened: false }),
        Some(root_parent),
    );

    let new_parent = make_const(&mut arena, None, 99);
    let cloned_op = uhdm::clone::clone(&mut arena, op, new_parent);

    assert_ne!(cloned_op, op);
    assert_eq!(arena.parent(cloned_op), Some(new_parent));

    let Some(NodeData::Operation(cloned_data)) = arena.get(cloned_op).map(|s| &s.data) else {
        panic!("expected Operation");
    };
    assert_eq!(cloned_data.operands.len(), 2);
    assert_ne!(cloned_data.operands[0], a);
    assert_ne!(cloned_data.operands[1], b);

    // originals are untouched
    let Some(NodeData::Constant(orig_a)) = arena.get(a).map(|s| &s.data) else { panic!() };
    assert_eq!(orig_a.value, "INT:1");
}

#[test]
fn clone_rewrites_internal_ref_one_edges_to_point_at_clones() {
    let mut arena = Arena::new();
    let target = make_const(&mut arena, None, 5);
    let name = arena.make_symbol("x");
    let r = arena.make(NodeData::RefObj(RefObjData { name: Some(name), actual: Some(target), ref_typespec: None }), None);
    let op = arena.make(
        NodeData::Operation(OperationData { op_type: Some(OpType::Plus), operands: vec![r], ref_typespec: None, reordered: false, flattened: false }),
        None,
    );

    let new_parent = make_const(&mut arena, None, 0);
    let cloned_op = uhdm::clone::clone(&mut arena, op, new_parent);

    let Some(NodeData::Operation(cloned_op_data)) = arena.get(cloned_op).map(|s| &s.data) else { panic!() };
    let cloned_r = cloned_op_data.operands[0];
    assert_ne!(cloned_r, r);

    let Some(NodeData::RefObj(cloned_r_data)) = arena.get(cloned_r).map(|s| &s.data) else { panic!() };
    let cloned_target = cloned_r_data.actual.expect("actual should still be set");
    assert_ne!(cloned_target, target, "ref-one edges inside the cloned set must retarget to the clone");

    // the original ref still points at the original target
    let Some(NodeData::RefObj(orig_r_data)) = arena.get(r).map(|s| &s.data) else { panic!() };
    assert_eq!(orig_r_data.actual, Some(target));
}

#[test]
fn clone_leaves_ref_edges_outside_the_cloned_set_pointing_at_the_original() {
    let mut arena = Arena::new();
    let outside_target = make_const(&mut arena, None, 42);
    let name = arena.make_symbol("y");
    let r = arena.make(NodeData::RefObj(RefObjData { name: Some(name), actual: Some(outside_target), ref_typespec: None }), None);

    let new_parent = make_const(&mut arena, None, 0);
    let cloned_r = uhdm::clone::clone(&mut arena, r, new_parent);

    let Some(NodeData::RefObj(cloned_data)) = arena.get(cloned_r).map(|s| &s.data) else { panic!() };
    assert_eq!(cloned_data.actual, Some(outside_target), "a ref to a node outside the cloned subgraph is left as-is");
}
