//! Expression reduction tests (C6, §4.6.4): arithmetic, shifts, concat,
//! conditional, cast, and increment/decrement write-back.

use uhdm::kind::OpType;
use uhdm::node::{ConstType, ConstantData, InstanceData, LogicTypespecData, NodeData, OperationData, ParamAssignData, ParameterData, RangeData, RefObjData};
use uhdm::{Arena, DefaultProvider, ExprEval, NodeId};

fn uint(arena: &mut Arena, parent: Option<NodeId>, v: u64, size: i64) -> NodeId {
    arena.make(NodeData::Constant(ConstantData { value: format!("UINT:{v}"), const_type: Some(ConstType::UInt), size, ref_typespec: None }), parent)
}

fn sint(arena: &mut Arena, parent: Option<NodeId>, v: i64, size: i64) -> NodeId {
    arena.make(NodeData::Constant(ConstantData { value: format!("INT:{v}"), const_type: Some(ConstType::Int), size, ref_typespec: None }), parent)
}

fn binop(arena: &mut Arena, op: OpType, a: NodeId, b: NodeId) -> NodeId {
    arena.make(NodeData::Operation(OperationData { op_type: Some(op), operands: vec![a, b], ref_typespec: None, reordered: false, flattened: false }), None)
}

fn empty_module(arena: &mut Arena) -> NodeId {
    arena.make(
        NodeData::Module(InstanceData {
            def_name: None,
            name: None,
            ports: Vec::new(),
            nets: Vec::new(),
            variables: Vec::new(),
            parameters: Vec::new(),
            param_assigns: Vec::new(),
            processes: Vec::new(),
            cont_assigns: Vec::new(),
            task_funcs: Vec::new(),
            gen_scopes: Vec::new(),
            sub_instances: Vec::new(),
            typespecs: Vec::new(),
            elaborated: false,
        }),
        None,
    )
}

#[test]
fn addition_of_two_uints_yields_their_sum() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);
    let a = uint(&mut arena, None, 10, 32);
    let b = uint(&mut arena, None, 20, 32);
    let op = binop(&mut arena, OpType::Add, a, b);

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(!r.invalid);
    let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else { panic!() };
    assert_eq!(uhdm::eval::get_value(c), Some(30));
}

#[test]
fn division_by_zero_fails_and_reports_an_error() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);
    let a = uint(&mut arena, None, 5, 32);
    let zero = uint(&mut arena, None, 0, 32);
    let op = binop(&mut arena, OpType::Div, a, zero);

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(r.invalid);
}

#[test]
fn arithmetic_right_shift_sign_extends_from_declared_width() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);
    // -8 in 8 bits is 0b11111000; >>> 2 should stay negative: 0b11111110 = -2
    let a = sint(&mut arena, None, -8, 8);
    let amount = uint(&mut arena, None, 2, 32);
    let op = binop(&mut arena, OpType::ArithRShift, a, amount);

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(!r.invalid);
    let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else { panic!() };
    assert_eq!(uhdm::eval::get_value(c), Some(-2));
}

#[test]
fn logical_right_shift_does_not_sign_extend() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);
    let a = sint(&mut arena, None, -8, 8);
    let amount = uint(&mut arena, None, 2, 32);
    let op = binop(&mut arena, OpType::RShift, a, amount);

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(!r.invalid);
    let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else { panic!() };
    assert_eq!(uhdm::eval::get_uvalue(c), Some(0xf8u64 >> 2));
}

#[test]
fn concat_packs_operands_msb_first() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);
    let a = uint(&mut arena, None, 0b10, 2);
    let b = uint(&mut arena, None, 0b011, 3);
    let op = arena.make(NodeData::Operation(OperationData { op_type: Some(OpType::Concat), operands: vec![a, b], ref_typespec: None, reordered: false, flattened: false }), None);

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(!r.invalid);
    let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else { panic!() };
    assert_eq!(uhdm::eval::to_binary(c), "10011");
}

#[test]
fn multi_concat_repeats_the_pattern_n_times() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);
    let count = uint(&mut arena, None, 3, 32);
    let value = uint(&mut arena, None, 0b10, 2);
    let op = arena.make(NodeData::Operation(OperationData { op_type: Some(OpType::MultiConcat), operands: vec![count, value], ref_typespec: None, reordered: false, flattened: false }), None);

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(!r.invalid);
    let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else { panic!() };
    assert_eq!(uhdm::eval::to_binary(c), "101010");
}

#[test]
fn multi_concat_rejects_a_repeat_count_over_the_cap() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);
    let count = uint(&mut arena, None, 1001, 32);
    let value = uint(&mut arena, None, 1, 1);
    let op = arena.make(NodeData::Operation(OperationData { op_type: Some(OpType::MultiConcat), operands: vec![count, value], ref_typespec: None, reordered: false, flattened: false }), None);

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(r.invalid);
}

#[test]
fn conditional_picks_the_then_branch_when_condition_is_nonzero() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);
    let cond = uint(&mut arena, None, 1, 1);
    let then_v = uint(&mut arena, None, 11, 32);
    let else_v = uint(&mut arena, None, 22, 32);
    let op = arena.make(
        NodeData::Operation(OperationData { op_type: Some(OpType::Conditional), operands: vec![cond, then_v, else_v], ref_typespec: None, reordered: false, flattened: false }),
        None,
    );

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(!r.invalid);
    let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else { panic!() };
    assert_eq!(uhdm::eval::get_value(c), Some(11));
}

#[test]
fn cast_reinterprets_the_operand_at_the_operations_own_typespec_width() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);
    let l = uint(&mut arena, None, 3, 32);
    let rr = uint(&mut arena, None, 0, 32);
    let range = arena.make(NodeData::Range(RangeData { left_expr: Some(l), right_expr: Some(rr) }), None);
    let ts = arena.make(NodeData::LogicTypespec(LogicTypespecData { ranges: vec![range], signed: false }), None);

    let value = uint(&mut arena, None, 0b1111_1111, 8);
    let op = arena.make(
        NodeData::Operation(OperationData { op_type: Some(OpType::Cast), operands: vec![value], ref_typespec: Some(ts), reordered: false, flattened: false }),
        None,
    );

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(!r.invalid);
    let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else { panic!() };
    assert_eq!(c.size, 4);
}

#[test]
fn pre_increment_writes_back_through_the_default_provider() {
    let mut arena = Arena::new();
    let inst = empty_module(&mut arena);

    let x_sym = arena.make_symbol("x");
    let param = arena.make(NodeData::Parameter(ParameterData { name: Some(x_sym), ref_typespec: None, is_local_param: false }), Some(inst));
    let lhs = arena.make(NodeData::RefObj(RefObjData { name: Some(x_sym), actual: None, ref_typespec: None }), Some(inst));
    let init = uint(&mut arena, Some(inst), 5, 32);
    let pa = arena.make(NodeData::ParamAssign(ParamAssignData { lhs: Some(lhs), rhs: Some(init), is_override: false }), Some(inst));
    if let Some(NodeData::Module(i)) = arena.get_mut(inst).map(|s| &mut s.data) {
        i.parameters.push(param);
        i.param_assigns.push(pa);
    }

    let target = arena.make(NodeData::RefObj(RefObjData { name: Some(x_sym), actual: None, ref_typespec: None }), Some(inst));
    let op = arena.make(NodeData::Operation(OperationData { op_type: Some(OpType::PreInc), operands: vec![target], ref_typespec: None, reordered: false, flattened: false }), Some(inst));

    let provider = DefaultProvider;
    let ev = ExprEval::new(&provider, true);
    let r = ev.reduce_expr(&mut arena, op, inst, None);
    assert!(!r.invalid);
    let Some(NodeData::Constant(c)) = arena.get(r.expr).map(|s| &s.data) else { panic!() };
    assert_eq!(uhdm::eval::get_value(c), Some(6), "pre-increment yields the new value");

    // the instance's param-assign should now carry the new value too
    let Some(NodeData::Module(i)) = arena.get(inst).map(|s| &s.data) else { panic!() };
    let Some(NodeData::ParamAssign(pa_after)) = arena.get(i.param_assigns[0]).map(|s| &s.data) else { panic!() };
    let Some(NodeData::Constant(stored)) = arena.get(pa_after.rhs.unwrap()).map(|s| &s.data) else { panic!() };
    assert_eq!(uhdm::eval::get_value(stored), Some(6));
}
