//! Name Resolver (C4, §4.4): `UhdmFinder`.
//!
//! Scope-aware lookup over the IR, read-only with respect to C1. Grounded
//! directly on `examples/original_source/include/uhdm/UhdmFinder.h` and
//! `src/UhdmFinder.cpp` -- one `find_in_*` method per scope kind, walking up
//! through `parent` when the current scope has no match, exactly mirroring
//! the original's method list (`findInModule`, `findInClassDefn`,
//! `findInForStmt`, ...). The per-scope table order below implements the
//! representative subset named in §4.4.4 for the node kinds this crate
//! models; entity categories the reduced schema doesn't carry as distinct
//! kinds (array-nets, named-events, gen-vars as a table separate from
//! variables) fold into the nearest table that exists here (documented in
//! `DESIGN.md`).

use ahash::AHashSet;

use crate::arena::Arena;
use crate::ids::NodeId;
use crate::node::{
    BeginData, ClassDefnData, ForStmtData, ForeachStmtData, FunctionData, GenScopeData, InstanceData, NodeData,
    PackageData, UdpDefnData,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    Object,
    Type,
}

/// Scope-aware resolver (§4.4.1). One instance is reusable across calls;
/// each `find_object`/`find_type` call resets the per-call visited set
/// (§4.4.3 rule 9: "within one `find` call, a scope is searched at most
/// once").
#[derive(Debug, Default)]
pub struct UhdmFinder {
    searched: AHashSet<NodeId>,
    tried_builtin: bool,
}

impl UhdmFinder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `findObject(name, scope)` (§4.4.2): value-world bindings (variables,
    /// nets, parameters, functions, tasks, gen-scopes, sub-instances).
    pub fn find_object(&mut self, arena: &Arena, name: &str, scope: NodeId) -> Option<NodeId> {
        self.searched.clear();
        self.tried_builtin = false;
        self.find(arena, name, RefKind::Object, scope)
    }

    /// `findType(name, scope)` (§4.4.2): type-world bindings (typespecs,
    /// class typespecs, interface typespecs).
    pub fn find_type(&mut self, arena: &Arena, name: &str, scope: NodeId) -> Option<NodeId> {
        self.searched.clear();
        self.tried_builtin = false;
        self.find(arena, name, RefKind::Type, scope)
    }

    fn find(&mut self, arena: &Arena, raw_name: &str, refkind: RefKind, scope: NodeId) -> Option<NodeId> {
        // Rule 1: strip a leading "work@" library prefix.
        let name = raw_name.strip_prefix("work@").unwrap_or(raw_name);

        // Rule 2: a qualified name `A::B` resolves `A` first (package, then
        // class, then type) and recurses into the resolved scope with `B`.
        if let Some((prefix, rest)) = name.split_once("::") {
            let resolved = self.find_qualifier(arena, prefix, scope)?;
            return self.find(arena, rest, refkind, resolved);
        }

        if !self.searched.insert(scope) {
            return None;
        }
        let Some(slot) = arena.get(scope) else {
            return None;
        };

        let found = match &slot.data {
            NodeData::Design(d) => match refkind {
                RefKind::Object => find_by_name(arena, &d.top_modules, name)
                    .or_else(|| find_by_name(arena, &d.all_modules, name))
                    .or_else(|| find_by_name(arena, &d.all_packages, name)),
                RefKind::Type => None,
            },
            NodeData::Module(i) | NodeData::Interface(i) | NodeData::Program(i) => {
                self.find_in_instance(arena, name, refkind, i)
            }
            NodeData::Package(p) => self.find_in_package(arena, name, refkind, scope, p),
            NodeData::ClassDefn(c) => self.find_in_class_defn(arena, name, refkind, scope, c),
            NodeData::UdpDefn(u) => self.find_in_udp_defn(arena, name, refkind, u),
            NodeData::Function(f) | NodeData::Task(f) => self.find_in_function(arena, name, refkind, f),
            NodeData::Begin(b) | NodeData::Fork(b) => self.find_in_begin(arena, name, refkind, scope, b),
            NodeData::ForStmt(f) => self.find_in_for_stmt(arena, name, refkind, f),
            NodeData::ForeachStmt(f) => self.find_in_foreach_stmt(arena, name, refkind, f),
            NodeData::GenScope(g) => self.find_in_gen_scope(arena, name, refkind, g),
            _ => None,
        };
        if found.is_some() {
            return found;
        }

        if let Some(parent) = slot.header.parent {
            if let Some(found) = self.find(arena, name, refkind, parent) {
                return Some(found);
            }
        }

        // Rule 8: try the built-in package named "builtin" exactly once.
        if !self.tried_builtin {
            self.tried_builtin = true;
            if let Some(design_id) = arena.design_root {
                if let Some(NodeData::Design(d)) = arena.get(design_id).map(|s| &s.data) {
                    if let Some(builtin) = find_by_name(arena, &d.all_packages, "builtin") {
                        if builtin != scope {
                            return self.find(arena, name, refkind, builtin);
                        }
                    }
                }
            }
        }
        None
    }

    fn find_qualifier(&mut self, arena: &Arena, name: &str, scope: NodeId) -> Option<NodeId> {
        let design_id = arena.design_root?;
        let NodeData::Design(d) = &arena.get(design_id)?.data else {
            return None;
        };
        find_by_name(arena, &d.all_packages, name)
            .or_else(|| find_by_name(arena, &d.all_classes, name))
            .or_else(|| self.find_type(arena, name, scope))
    }

    fn find_in_instance(&mut self, arena: &Arena, name: &str, refkind: RefKind, inst: &InstanceData) -> Option<NodeId> {
        match refkind {
            RefKind::Object => find_by_name(arena, &inst.sub_instances, name)
                .or_else(|| find_by_name(arena, &inst.nets, name))
                .or_else(|| find_by_name(arena, &inst.task_funcs, name))
                .or_else(|| find_by_name(arena, &inst.variables, name))
                .or_else(|| find_param_assign_by_name(arena, &inst.param_assigns, name))
                .or_else(|| find_by_name(arena, &inst.parameters, name))
                .or_else(|| find_by_name(arena, &inst.gen_scopes, name))
                .or_else(|| find_by_name(arena, &inst.ports, name)),
            RefKind::Type => find_by_name(arena, &inst.typespecs, name),
        }
    }

    fn find_in_package(
        &mut self,
        arena: &Arena,
        name: &str,
        refkind: RefKind,
        scope: NodeId,
        pkg: &PackageData,
    ) -> Option<NodeId> {
        let own = match refkind {
            RefKind::Object => find_param_assign_by_name(arena, &pkg.param_assigns, name)
                .or_else(|| find_by_name(arena, &pkg.parameters, name))
                .or_else(|| find_by_name(arena, &pkg.variables, name))
                .or_else(|| find_by_name(arena, &pkg.task_funcs, name)),
            RefKind::Type => find_by_name(arena, &pkg.typespecs, name),
        };
        if own.is_some() {
            return own;
        }
        // Rule 7: package imports, followed when explicit-match or wildcard.
        for &import_id in &pkg.imports {
            let Some(NodeData::ImportTypespec(imp)) = arena.get(import_id).map(|s| &s.data) else {
                continue;
            };
            let item_matches = imp
                .item_name
                .is_some_and(|item| arena.get_symbol(item) == name);
            if item_matches || imp.item_name.is_none() {
                if let Some(package) = imp.actual_package {
                    if package != scope {
                        if let Some(found) = self.find(arena, name, refkind, package) {
                            return Some(found);
                        }
                    }
                }
            }
        }
        None
    }

    fn find_in_class_defn(
        &mut self,
        arena: &Arena,
        name: &str,
        refkind: RefKind,
        scope: NodeId,
        class: &ClassDefnData,
    ) -> Option<NodeId> {
        // Rule 4: `this` resolves to the innermost enclosing ClassDefn,
        // `super` to its `extends`.
        if refkind == RefKind::Object && name == "this" {
            return Some(scope);
        }
        if name == "super" {
            return class.extends;
        }
        match refkind {
            RefKind::Object => find_by_name(arena, &class.variables, name)
                .or_else(|| find_param_assign_by_name(arena, &class.param_assigns, name))
                .or_else(|| find_by_name(arena, &class.parameters, name))
                .or_else(|| find_by_name(arena, &class.methods, name))
                .or_else(|| self.find_in_extends(arena, name, refkind, class)),
            RefKind::Type => self.find_in_extends(arena, name, refkind, class),
        }
    }

    fn find_in_extends(&mut self, arena: &Arena, name: &str, refkind: RefKind, class: &ClassDefnData) -> Option<NodeId> {
        let base_id = class.extends?;
        let NodeData::ClassDefn(base) = &arena.get(base_id)?.data else {
            return None;
        };
        self.find_in_class_defn(arena, name, refkind, base_id, base)
    }

    fn find_in_udp_defn(&self, arena: &Arena, name: &str, refkind: RefKind, udp: &UdpDefnData) -> Option<NodeId> {
        match refkind {
            RefKind::Object => find_by_name(arena, &udp.ports, name),
            RefKind::Type => None,
        }
    }

    fn find_in_function(&mut self, arena: &Arena, name: &str, refkind: RefKind, func: &FunctionData) -> Option<NodeId> {
        match refkind {
            RefKind::Object => find_by_name(arena, &func.io_decls, name).or_else(|| find_by_name(arena, &func.variables, name)),
            RefKind::Type => find_by_name(arena, &func.parameters, name),
        }
    }

    fn find_in_begin(
        &mut self,
        arena: &Arena,
        name: &str,
        refkind: RefKind,
        scope: NodeId,
        begin: &BeginData,
    ) -> Option<NodeId> {
        if refkind == RefKind::Object
            && begin
                .name
                .is_some_and(|sym| arena.get_symbol(sym) == name)
        {
            return Some(scope);
        }
        match refkind {
            RefKind::Object => find_by_name(arena, &begin.variables, name),
            RefKind::Type => find_by_name(arena, &begin.parameters, name),
        }
    }

    fn find_in_for_stmt(&mut self, arena: &Arena, name: &str, refkind: RefKind, f: &ForStmtData) -> Option<NodeId> {
        if refkind != RefKind::Object {
            return None;
        }
        find_by_name(arena, &f.init_lhs, name).or_else(|| find_by_name(arena, &f.variables, name))
    }

    fn find_in_foreach_stmt(&mut self, arena: &Arena, name: &str, refkind: RefKind, f: &ForeachStmtData) -> Option<NodeId> {
        if refkind != RefKind::Object {
            return None;
        }
        find_by_name(arena, &f.loop_vars, name)
    }

    fn find_in_gen_scope(&mut self, arena: &Arena, name: &str, refkind: RefKind, g: &GenScopeData) -> Option<NodeId> {
        match refkind {
            RefKind::Object => find_by_name(arena, &g.sub_instances, name)
                .or_else(|| find_by_name(arena, &g.variables, name))
                .or_else(|| find_param_assign_by_name(arena, &g.param_assigns, name))
                .or_else(|| find_by_name(arena, &g.parameters, name)),
            RefKind::Type => None,
        }
    }
}

/// The "declared name" of a node, for the kinds that carry one (§3.1 "has
/// name" capability).
fn decl_name(data: &NodeData) -> Option<crate::ids::SymbolId> {
    match data {
        NodeData::Module(i) | NodeData::Interface(i) | NodeData::Program(i) => i.name.or(i.def_name),
        NodeData::Package(p) => p.name,
        NodeData::ClassDefn(c) => c.name,
        NodeData::UdpDefn(u) => u.name,
        NodeData::Function(f) | NodeData::Task(f) => f.name,
        NodeData::Begin(b) | NodeData::Fork(b) => b.name,
        NodeData::GenScope(g) => g.name,
        NodeData::Port(p) => p.name,
        NodeData::Net(n) => n.name,
        NodeData::Variable(v) => v.name,
        NodeData::Parameter(p) => p.name,
        NodeData::RefObj(r) => r.name,
        NodeData::TypespecMember(m) => m.name,
        NodeData::StructTypespec(t) => t.name,
        NodeData::UnionTypespec(t) => t.name,
        NodeData::EnumTypespec(t) => t.name,
        NodeData::ClassTypespec(t) => t.name,
        NodeData::TypedefTypespec(t) => t.name,
        _ => None,
    }
}

fn find_by_name(arena: &Arena, ids: &[NodeId], name: &str) -> Option<NodeId> {
    ids.iter().copied().find(|&id| {
        arena
            .get(id)
            .and_then(|slot| decl_name(&slot.data))
            .is_some_and(|sym| arena.get_symbol(sym) == name)
    })
}

fn find_param_assign_by_name(arena: &Arena, ids: &[NodeId], name: &str) -> Option<NodeId> {
    ids.iter().copied().find(|&id| {
        let Some(NodeData::ParamAssign(pa)) = arena.get(id).map(|s| &s.data) else {
            return false;
        };
        pa.lhs
            .and_then(|lhs| arena.get(lhs))
            .and_then(|s| decl_name(&s.data))
            .is_some_and(|sym| arena.get_symbol(sym) == name)
    })
}
