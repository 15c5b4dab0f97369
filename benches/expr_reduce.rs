#[cfg(codspeed)]
use codspeed_criterion_compat::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
#[cfg(not(codspeed))]
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use uhdm::kind::OpType;
use uhdm::node::{ConstType, ConstantData, InstanceData, NodeData, OperationData};
use uhdm::{Arena, DefaultProvider, ExprEval, NodeId};

fn uint(arena: &mut Arena, v: u64, size: i64) -> NodeId {
    arena.make(NodeData::Constant(ConstantData { value: format!("UINT:{v}"), const_type: Some(ConstType::UInt), size, ref_typespec: None }), None)
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

/// A single `a + b` reduction, the cheapest possible non-trivial expr.
fn shallow_add(arena: &mut Arena) -> NodeId {
    let a = uint(arena, 7, 32);
    let b = uint(arena, 35, 32);
    arena.make(NodeData::Operation(OperationData { op_type: Some(OpType::Add), operands: vec![a, b], ref_typespec: None, reordered: false, flattened: false }), None)
}

/// A balanced binary tree of additions, `depth` levels deep, so
/// `reduce_expr`'s recursion has real work to do per call.
fn deep_add_tree(arena: &mut Arena, depth: u32) -> NodeId {
    if depth == 0 {
        return uint(arena, 1, 32);
    }
    let l = deep_add_tree(arena, depth - 1);
    let r = deep_add_tree(arena, depth - 1);
    arena.make(NodeData::Operation(OperationData { op_type: Some(OpType::Add), operands: vec![l, r], ref_typespec: None, reordered: false, flattened: false }), None)
}

fn bench_shallow_add(c: &mut Criterion) {
    c.bench_function("reduce_expr/shallow_add", |b| {
        b.iter_batched(
            || {
                let mut arena = Arena::new();
                let inst = empty_module(&mut arena);
                let expr = shallow_add(&mut arena);
                (arena, inst, expr)
            },
            |(mut arena, inst, expr)| {
                let provider = DefaultProvider;
                let ev = ExprEval::new(&provider, true);
                black_box(ev.reduce_expr(&mut arena, expr, inst, None));
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_deep_add_tree(c: &mut Criterion) {
    c.bench_function("reduce_expr/deep_add_tree_depth10", |b| {
        b.iter_batched(
            || {
                let mut arena = Arena::new();
                let inst = empty_module(&mut arena);
                let expr = deep_add_tree(&mut arena, 10);
                (arena, inst, expr)
            },
            |(mut arena, inst, expr)| {
                let provider = DefaultProvider;
                let ev = ExprEval::new(&provider, true);
                black_box(ev.reduce_expr(&mut arena, expr, inst, None));
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_shallow_add, bench_deep_add_tree);
criterion_main!(benches);
