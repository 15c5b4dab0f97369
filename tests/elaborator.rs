//! Elaborator tests (C5, §4.5): cloning a definition's body into each
//! instance and binding references against the instance scope chain.

use uhdm::node::{
    ConstType, ConstantData, ContAssignData, DesignData, InstanceData, NetData, NodeData, ParamAssignData, ParameterData, RefObjData,
};
use uhdm::{Arena, Elaborator, NodeId};

fn bare_instance(arena: &mut Arena, def_name: &str, inst_name: &str) -> NodeId {
    let def_sym = arena.make_symbol(def_name);
    let inst_sym = arena.make_symbol(inst_name);
    arena.make(
        NodeData::Module(InstanceData {
            def_name: Some(def_sym),
            name: Some(inst_sym),
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

/// Builds a folded design: definition `leaf` (one net `w`, one param `P`
/// with a constant param-assign), a flat top `top` with two sub-instances of
/// `leaf` named `u1`/`u2`, whose continuous assigns reference `w` by name
/// only (no `actual` set yet -- elaboration must bind it).
fn folded_design_with_one_nested_instance() -> (Arena, NodeId, NodeId, NodeId) {
    let mut arena = Arena::new();

    let leaf_def = bare_instance(&mut arena, "leaf", "leaf");
    let w_name = arena.make_symbol("w");
    let w = arena.make(NodeData::Net(NetData { name: Some(w_name), ref_typespec: None }), Some(leaf_def));
    let p_name = arena.make_symbol("P");
    let param = arena.make(NodeData::Parameter(ParameterData { name: Some(p_name), ref_typespec: None, is_local_param: false }), Some(leaf_def));
    let lhs = arena.make(NodeData::RefObj(RefObjData { name: Some(p_name), actual: None, ref_typespec: None }), Some(leaf_def));
    let rhs = arena.make(NodeData::Constant(ConstantData { value: "UINT:4".to_owned(), const_type: Some(ConstType::UInt), size: 32, ref_typespec: None }), Some(leaf_def));
    let pa = arena.make(NodeData::ParamAssign(ParamAssignData { lhs: Some(lhs), rhs: Some(rhs), is_override: false }), Some(leaf_def));
    let w_ref = arena.make(NodeData::RefObj(RefObjData { name: Some(w_name), actual: None, ref_typespec: None }), Some(leaf_def));
    let one = arena.make(NodeData::Constant(ConstantData { value: "UINT:1".to_owned(), const_type: Some(ConstType::UInt), size: 1, ref_typespec: None }), Some(leaf_def));
    let cont = arena.make(NodeData::ContAssign(ContAssignData { lhs: Some(w_ref), rhs: Some(one) }), Some(leaf_def));
    if let Some(NodeData::Module(i)) = arena.get_mut(leaf_def).map(|s| &mut s.data) {
        i.nets.push(w);
        i.parameters.push(param);
        i.param_assigns.push(pa);
        i.cont_assigns.push(cont);
    }

    let top = bare_instance(&mut arena, "top", "top");
    let u1 = bare_instance(&mut arena, "leaf", "u1");
    let u2 = bare_instance(&mut arena, "leaf", "u2");
    arena.set_parent(u1, Some(top));
    arena.set_parent(u2, Some(top));
    if let Some(NodeData::Module(i)) = arena.get_mut(top).map(|s| &mut s.data) {
        i.sub_instances.push(u1);
        i.sub_instances.push(u2);
    }

    let design = arena.make(
        NodeData::Design(DesignData {
            name: None,
            all_modules: vec![leaf_def, top, u1, u2],
            top_modules: vec![top],
            all_packages: Vec::new(),
            all_classes: Vec::new(),
            all_interfaces: Vec::new(),
            all_programs: Vec::new(),
            all_udps: Vec::new(),
            param_assigns: Vec::new(),
            elaborated: false,
        }),
        None,
    );
    arena.set_parent(leaf_def, Some(design));
    arena.set_parent(top, Some(design));

    (arena, design, u1, u2)
}

#[test]
fn elaborate_clones_definition_body_into_each_instance() {
    let (mut arena, design, u1, _u2) = folded_design_with_one_nested_instance();
    let mut elab = Elaborator::new();
    elab.elaborate(&mut arena, design);

    let Some(NodeData::Module(u1_data)) = arena.get(u1).map(|s| &s.data) else { panic!() };
    assert_eq!(u1_data.nets.len(), 1, "the instance should have its own cloned net, not share the definition's");
    assert_eq!(u1_data.cont_assigns.len(), 1);
    assert!(u1_data.elaborated);
}

#[test]
fn elaborate_binds_unresolved_refobj_to_the_cloned_net() {
    let (mut arena, design, u1, _u2) = folded_design_with_one_nested_instance();
    let mut elab = Elaborator::new();
    elab.elaborate(&mut arena, design);

    let Some(NodeData::Module(u1_data)) = arena.get(u1).map(|s| &s.data) else { panic!() };
    let cont_id = u1_data.cont_assigns[0];
    let net_id = u1_data.nets[0];
    let Some(NodeData::ContAssign(cont)) = arena.get(cont_id).map(|s| &s.data) else { panic!() };
    let Some(NodeData::RefObj(lhs)) = arena.get(cont.lhs.unwrap()).map(|s| &s.data) else { panic!() };
    assert_eq!(lhs.actual, Some(net_id), "the lhs RefObj inside the cloned instance must bind to the instance's own net");
}

#[test]
fn elaborate_is_idempotent_once_the_design_is_marked_elaborated() {
    let (mut arena, design, u1, _u2) = folded_design_with_one_nested_instance();
    let mut elab = Elaborator::new();
    elab.elaborate(&mut arena, design);

    let Some(NodeData::Module(u1_before)) = arena.get(u1).map(|s| &s.data) else { panic!() };
    let net_count_before = u1_before.nets.len();

    elab.elaborate(&mut arena, design);

    let Some(NodeData::Module(u1_after)) = arena.get(u1).map(|s| &s.data) else { panic!() };
    assert_eq!(u1_after.nets.len(), net_count_before, "a second elaborate() on an already-elaborated design is a no-op");
}

#[test]
fn two_instances_of_the_same_definition_get_distinct_param_assign_nodes() {
    let (mut arena, design, u1, u2) = folded_design_with_one_nested_instance();
    let mut elab = Elaborator::new();
    elab.elaborate(&mut arena, design);

    let Some(NodeData::Module(u1_data)) = arena.get(u1).map(|s| &s.data) else { panic!() };
    let Some(NodeData::Module(u2_data)) = arena.get(u2).map(|s| &s.data) else { panic!() };
    assert_eq!(u1_data.param_assigns.len(), 1);
    assert_eq!(u2_data.param_assigns.len(), 1);
    assert_ne!(u1_data.param_assigns[0], u2_data.param_assigns[0], "each instance must own its own ParamAssign node");

    let Some(NodeData::ParamAssign(u1_pa)) = arena.get(u1_data.param_assigns[0]).map(|s| &s.data) else { panic!() };
    let Some(NodeData::ParamAssign(u2_pa)) = arena.get(u2_data.param_assigns[0]).map(|s| &s.data) else { panic!() };
    assert_ne!(u1_pa.lhs, u2_pa.lhs, "each instance's ParamAssign.lhs must be its own cloned RefObj");
    assert_ne!(u1_pa.rhs, u2_pa.rhs, "each instance's ParamAssign.rhs must be its own cloned Constant");
}

#[test]
fn flat_definition_referencing_itself_is_not_recursively_cloned() {
    let mut arena = Arena::new();
    let leaf = bare_instance(&mut arena, "solo", "solo");
    let design = arena.make(
        NodeData::Design(DesignData {
            name: None,
            all_modules: vec![leaf],
            top_modules: vec![leaf],
            all_packages: Vec::new(),
            all_classes: Vec::new(),
            all_interfaces: Vec::new(),
            all_programs: Vec::new(),
            all_udps: Vec::new(),
            param_assigns: Vec::new(),
            elaborated: false,
        }),
        None,
    );
    arena.set_parent(leaf, Some(design));

    let mut elab = Elaborator::new();
    elab.elaborate(&mut arena, design);

    let Some(NodeData::Module(data)) = arena.get(leaf).map(|s| &s.data) else { panic!() };
    assert!(data.elaborated);
    assert!(data.nets.is_empty());
}
