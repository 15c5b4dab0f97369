//! Per-kind node payloads (§3.3) plus the common header every node carries
//! (§3.1: id, source location, parent back-ref, client data).
//!
//! Field layout mirrors the host crate's per-variant payload structs inside
//! `HeapData` (`heap.rs`) -- one `struct` per kind holding typed `NodeId`
//! references for own/ref edges and `Vec<NodeId>` for own-many/ref-many
//! collections. Declaration order inside a `Vec<NodeId>` is semantically
//! significant exactly where §3.2 says it is (struct members, operands, port
//! order) and is preserved verbatim by clone (§4.3) and serialize (§4.2).

use serde::{Deserialize, Serialize};

use crate::ids::{NodeId, SymbolId};
use crate::kind::OpType;

/// Source-location attributes every node carries (§3.1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLoc {
    pub file: Option<SymbolId>,
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

/// Fields common to every node (§3.1).
///
/// `client_data` is a scratch opaque payload (§3.1) that a host tool may
/// attach; it is never persisted by the serializer (§4.2) and is dropped by
/// clone (§4.3) -- a fresh clone starts with `client_data = None`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NodeHeader {
    pub parent: Option<NodeId>,
    pub loc: SourceLoc,
    #[serde(skip)]
    pub client_data: Option<Box<dyn std::any::Any>>,
}

impl Clone for NodeHeader {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent,
            loc: self.loc,
            client_data: None,
        }
    }
}

/// One slot in the arena: the common header plus the kind-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSlot {
    pub header: NodeHeader,
    pub data: NodeData,
}

// ---------------------------------------------------------------------
// Scopes / instances
// ---------------------------------------------------------------------

/// Root of the graph (§3.3). Holds the ordered top-level collections and
/// the `elaborated` flag that guards elaboration idempotence (§3.4 inv. 6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignData {
    pub name: Option<SymbolId>,
    pub all_modules: Vec<NodeId>,
    pub top_modules: Vec<NodeId>,
    pub all_packages: Vec<NodeId>,
    pub all_classes: Vec<NodeId>,
    pub all_interfaces: Vec<NodeId>,
    pub all_programs: Vec<NodeId>,
    pub all_udps: Vec<NodeId>,
    pub param_assigns: Vec<NodeId>,
    pub elaborated: bool,
}

/// Capability shared by `Module`/`Interface`/`Program` (§3.3 `Instance`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceData {
    /// Name of the definition this instance instantiates (folded form).
    pub def_name: Option<SymbolId>,
    /// This instance's own name (empty for a definition, not an instance).
    pub name: Option<SymbolId>,
    pub ports: Vec<NodeId>,
    pub nets: Vec<NodeId>,
    pub variables: Vec<NodeId>,
    pub parameters: Vec<NodeId>,
    pub param_assigns: Vec<NodeId>,
    pub processes: Vec<NodeId>,
    pub cont_assigns: Vec<NodeId>,
    pub task_funcs: Vec<NodeId>,
    pub gen_scopes: Vec<NodeId>,
    pub sub_instances: Vec<NodeId>,
    pub typespecs: Vec<NodeId>,
    /// True once C5 has cloned this instance's content from its definition.
    pub elaborated: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageData {
    pub name: Option<SymbolId>,
    pub parameters: Vec<NodeId>,
    pub param_assigns: Vec<NodeId>,
    pub variables: Vec<NodeId>,
    pub typespecs: Vec<NodeId>,
    pub task_funcs: Vec<NodeId>,
    /// `ImportTypespec` nodes naming what this package pulls in (§4.4.3 7).
    pub imports: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassDefnData {
    pub name: Option<SymbolId>,
    /// The base class, if this `extends` one (§4.4.3, §4.4.5).
    pub extends: Option<NodeId>,
    pub variables: Vec<NodeId>,
    pub parameters: Vec<NodeId>,
    pub param_assigns: Vec<NodeId>,
    pub methods: Vec<NodeId>,
    pub constraints: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UdpDefnData {
    pub name: Option<SymbolId>,
    pub ports: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionData {
    pub name: Option<SymbolId>,
    pub io_decls: Vec<NodeId>,
    pub variables: Vec<NodeId>,
    pub parameters: Vec<NodeId>,
    /// `RefTypespec` to the declared return type.
    pub return_typespec: Option<NodeId>,
    pub stmt: Option<NodeId>,
    pub is_task: bool,
}

pub type TaskData = FunctionData;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeginData {
    pub name: Option<SymbolId>,
    pub variables: Vec<NodeId>,
    pub parameters: Vec<NodeId>,
    pub stmts: Vec<NodeId>,
}

pub type ForkData = BeginData;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForStmtData {
    /// Left-hand-sides of the for-init assignments (§4.4.4 table).
    pub init_lhs: Vec<NodeId>,
    pub inits: Vec<NodeId>,
    pub condition: Option<NodeId>,
    pub increments: Vec<NodeId>,
    pub variables: Vec<NodeId>,
    pub stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForeachStmtData {
    pub array: Option<NodeId>,
    pub loop_vars: Vec<NodeId>,
    pub stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenScopeData {
    pub name: Option<SymbolId>,
    pub variables: Vec<NodeId>,
    pub parameters: Vec<NodeId>,
    pub param_assigns: Vec<NodeId>,
    pub sub_instances: Vec<NodeId>,
    pub stmts: Vec<NodeId>,
}

// ---------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortData {
    pub name: Option<SymbolId>,
    pub ref_typespec: Option<NodeId>,
    /// Ref-one into the net/variable this port connects to inside the
    /// instance (§3.3 `Port.lowConn.actual`).
    pub low_conn: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetData {
    pub name: Option<SymbolId>,
    pub ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableData {
    pub name: Option<SymbolId>,
    pub ref_typespec: Option<NodeId>,
    /// Initial-value expression, if any.
    pub expr: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterData {
    pub name: Option<SymbolId>,
    pub ref_typespec: Option<NodeId>,
    pub is_local_param: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamAssignData {
    pub lhs: Option<NodeId>,
    pub rhs: Option<NodeId>,
    /// True for the `#(...)` override form, false for the declaration's own
    /// default-value assign.
    pub is_override: bool,
}

// ---------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------

/// VPI constant-type code (§4.6.3). Kept distinct from `OpType` since it
/// tags a *value representation*, not an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ConstType {
    Bin,
    Dec,
    Hex,
    Oct,
    Int,
    UInt,
    Scalar,
    String,
    Real,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstantData {
    /// Tagged value, e.g. `"UINT:30"` (§4.6.3). The prefix must agree with
    /// `const_type` (§3.4 invariant 5).
    pub value: String,
    pub const_type: Option<ConstType>,
    /// Declared bit size; `-1` means unsized/elastic (§3.3, §4.6.3).
    pub size: i64,
    pub ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationData {
    pub op_type: Option<OpType>,
    pub operands: Vec<NodeId>,
    pub ref_typespec: Option<NodeId>,
    /// Concat bit-order already flipped (§3.3).
    pub reordered: bool,
    /// Assignment-pattern already normalized against its typespec (§3.3, §4.6.5).
    pub flattened: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefObjData {
    pub name: Option<SymbolId>,
    /// Bound defining node, set by name resolution (§3.3, §4.5.5).
    pub actual: Option<NodeId>,
    pub ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefTypespecData {
    /// The `Typespec` this indirection denotes (§3.3).
    pub actual: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HierPathData {
    /// Ordered sequence of path elements: `RefObj` or `BitSelect` (§3.3).
    pub elements: Vec<NodeId>,
    pub ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BitSelectData {
    pub name: Option<SymbolId>,
    pub actual: Option<NodeId>,
    pub index: Option<NodeId>,
    pub ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartSelectData {
    pub actual: Option<NodeId>,
    pub left_range: Option<NodeId>,
    pub right_range: Option<NodeId>,
    pub ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexedPartSelectData {
    pub actual: Option<NodeId>,
    pub base_expr: Option<NodeId>,
    pub width_expr: Option<NodeId>,
    /// `+:` if true, `-:` if false.
    pub is_up_down: bool,
    pub ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarSelectData {
    pub name: Option<SymbolId>,
    pub actual: Option<NodeId>,
    pub selects: Vec<NodeId>,
    pub ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SysFuncCallData {
    pub name: Option<SymbolId>,
    pub args: Vec<NodeId>,
    pub ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FuncCallData {
    pub name: Option<SymbolId>,
    pub actual: Option<NodeId>,
    pub args: Vec<NodeId>,
    pub ref_typespec: Option<NodeId>,
}

// ---------------------------------------------------------------------
// Statements / processes
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentData {
    pub lhs: Option<NodeId>,
    pub rhs: Option<NodeId>,
    /// Non-`None` for compound assigns (`+=`, ...) (§4.6.6).
    pub op_type: Option<OpType>,
    pub blocking: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContAssignData {
    pub lhs: Option<NodeId>,
    pub rhs: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlwaysKind {
    Comb,
    Ff,
    Latch,
    Plain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlwaysData {
    pub kind: AlwaysKind,
    pub stmt: Option<NodeId>,
}

impl Default for AlwaysData {
    fn default() -> Self {
        Self {
            kind: AlwaysKind::Plain,
            stmt: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitialData {
    pub stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventControlData {
    pub condition: Option<NodeId>,
    pub stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IfStmtData {
    pub condition: Option<NodeId>,
    pub stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IfElseData {
    pub condition: Option<NodeId>,
    pub then_stmt: Option<NodeId>,
    pub else_stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseStmtData {
    pub condition: Option<NodeId>,
    pub items: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseItemData {
    /// Empty means `default`.
    pub exprs: Vec<NodeId>,
    pub stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhileStmtData {
    pub condition: Option<NodeId>,
    pub stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoWhileData {
    pub condition: Option<NodeId>,
    pub stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepeatStmtData {
    pub count: Option<NodeId>,
    pub stmt: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnStmtData {
    pub condition: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContinueStmtData;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakStmtData;

// ---------------------------------------------------------------------
// Typespecs
// ---------------------------------------------------------------------

/// A `[msb:lsb]` pair, own-one under any ranged declaration/typespec (§3.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeData {
    pub left_expr: Option<NodeId>,
    pub right_expr: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicTypespecData {
    pub ranges: Vec<NodeId>,
    pub signed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BitTypespecData {
    pub ranges: Vec<NodeId>,
    pub signed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntTypespecData {
    pub signed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegerTypespecData {
    pub signed: bool,
}

/// A struct/union member declaration: name + its own `RefTypespec` (§4.6.5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypespecMemberData {
    pub name: Option<SymbolId>,
    pub ref_typespec: Option<NodeId>,
    pub default_value: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructTypespecData {
    pub name: Option<SymbolId>,
    /// Members in declaration order (§4.6.5 step 1).
    pub members: Vec<NodeId>,
    pub packed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnionTypespecData {
    pub name: Option<SymbolId>,
    pub members: Vec<NodeId>,
    pub packed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumConstData {
    pub name: Option<SymbolId>,
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumTypespecData {
    pub name: Option<SymbolId>,
    pub base_ref_typespec: Option<NodeId>,
    pub enum_consts: Vec<EnumConstData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArrayTypespecData {
    pub element_ref_typespec: Option<NodeId>,
    pub ranges: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackedArrayTypespecData {
    pub element_ref_typespec: Option<NodeId>,
    pub ranges: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassTypespecData {
    pub name: Option<SymbolId>,
    /// Ref-one to the class definition this typespec names (§3.2 cycle example).
    pub class_defn: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypedefTypespecData {
    pub name: Option<SymbolId>,
    pub actual_ref_typespec: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportTypespecData {
    pub package_name: Option<SymbolId>,
    /// `None` means the wildcard `*` import (§4.4.3 rule 7).
    pub item_name: Option<SymbolId>,
    pub actual_package: Option<NodeId>,
}

// ---------------------------------------------------------------------
// The closed union
// ---------------------------------------------------------------------

/// The kind-tagged payload union (§3.1). One variant per [`crate::kind::Kind`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeData {
    Design(DesignData),
    Module(InstanceData),
    Interface(InstanceData),
    Program(InstanceData),
    Package(PackageData),
    ClassDefn(ClassDefnData),
    UdpDefn(UdpDefnData),
    Function(FunctionData),
    Task(TaskData),
    Begin(BeginData),
    Fork(ForkData),
    ForStmt(ForStmtData),
    ForeachStmt(ForeachStmtData),
    GenScope(GenScopeData),
    Port(PortData),
    Net(NetData),
    Variable(VariableData),
    Parameter(ParameterData),
    ParamAssign(ParamAssignData),
    Constant(ConstantData),
    Operation(OperationData),
    RefObj(RefObjData),
    RefTypespec(RefTypespecData),
    HierPath(HierPathData),
    BitSelect(BitSelectData),
    PartSelect(PartSelectData),
    IndexedPartSelect(IndexedPartSelectData),
    VarSelect(VarSelectData),
    SysFuncCall(SysFuncCallData),
    FuncCall(FuncCallData),
    Assignment(AssignmentData),
    ContAssign(ContAssignData),
    Always(AlwaysData),
    Initial(InitialData),
    EventControl(EventControlData),
    IfStmt(IfStmtData),
    IfElse(IfElseData),
    CaseStmt(CaseStmtData),
    CaseItem(CaseItemData),
    WhileStmt(WhileStmtData),
    DoWhile(DoWhileData),
    RepeatStmt(RepeatStmtData),
    ReturnStmt(ReturnStmtData),
    ContinueStmt(ContinueStmtData),
    BreakStmt(BreakStmtData),
    LogicTypespec(LogicTypespecData),
    BitTypespec(BitTypespecData),
    IntTypespec(IntTypespecData),
    IntegerTypespec(IntegerTypespecData),
    StructTypespec(StructTypespecData),
    UnionTypespec(UnionTypespecData),
    EnumTypespec(EnumTypespecData),
    ArrayTypespec(ArrayTypespecData),
    PackedArrayTypespec(PackedArrayTypespecData),
    ClassTypespec(ClassTypespecData),
    TypedefTypespec(TypedefTypespecData),
    ImportTypespec(ImportTypespecData),
    TypespecMember(TypespecMemberData),
    Range(RangeData),
}

impl NodeData {
    #[must_use]
    pub fn kind(&self) -> crate::kind::Kind {
        use crate::kind::Kind as K;
        match self {
            Self::Design(_) => K::Design,
            Self::Module(_) => K::Module,
            Self::Interface(_) => K::Interface,
            Self::Program(_) => K::Program,
            Self::Package(_) => K::Package,
            Self::ClassDefn(_) => K::ClassDefn,
            Self::UdpDefn(_) => K::UdpDefn,
            Self::Function(_) => K::Function,
            Self::Task(_) => K::Task,
            Self::Begin(_) => K::Begin,
            Self::Fork(_) => K::Fork,
            Self::ForStmt(_) => K::ForStmt,
            Self::ForeachStmt(_) => K::ForeachStmt,
            Self::GenScope(_) => K::GenScope,
            Self::Port(_) => K::Port,
            Self::Net(_) => K::Net,
            Self::Variable(_) => K::Variable,
            Self::Parameter(_) => K::Parameter,
            Self::ParamAssign(_) => K::ParamAssign,
            Self::Constant(_) => K::Constant,
            Self::Operation(_) => K::Operation,
            Self::RefObj(_) => K::RefObj,
            Self::RefTypespec(_) => K::RefTypespec,
            Self::HierPath(_) => K::HierPath,
            Self::BitSelect(_) => K::BitSelect,
            Self::PartSelect(_) => K::PartSelect,
            Self::IndexedPartSelect(_) => K::IndexedPartSelect,
            Self::VarSelect(_) => K::VarSelect,
            Self::SysFuncCall(_) => K::SysFuncCall,
            Self::FuncCall(_) => K::FuncCall,
            Self::Assignment(_) => K::Assignment,
            Self::ContAssign(_) => K::ContAssign,
            Self::Always(_) => K::Always,
            Self::Initial(_) => K::Initial,
            Self::EventControl(_) => K::EventControl,
            Self::IfStmt(_) => K::IfStmt,
            Self::IfElse(_) => K::IfElse,
            Self::CaseStmt(_) => K::CaseStmt,
            Self::CaseItem(_) => K::CaseItem,
            Self::WhileStmt(_) => K::WhileStmt,
            Self::DoWhile(_) => K::DoWhile,
            Self::RepeatStmt(_) => K::RepeatStmt,
            Self::ReturnStmt(_) => K::ReturnStmt,
            Self::ContinueStmt(_) => K::ContinueStmt,
            Self::BreakStmt(_) => K::BreakStmt,
            Self::LogicTypespec(_) => K::LogicTypespec,
            Self::BitTypespec(_) => K::BitTypespec,
            Self::IntTypespec(_) => K::IntTypespec,
            Self::IntegerTypespec(_) => K::IntegerTypespec,
            Self::StructTypespec(_) => K::StructTypespec,
            Self::UnionTypespec(_) => K::UnionTypespec,
            Self::EnumTypespec(_) => K::EnumTypespec,
            Self::ArrayTypespec(_) => K::ArrayTypespec,
            Self::PackedArrayTypespec(_) => K::PackedArrayTypespec,
            Self::ClassTypespec(_) => K::ClassTypespec,
            Self::TypedefTypespec(_) => K::TypedefTypespec,
            Self::ImportTypespec(_) => K::ImportTypespec,
            Self::TypespecMember(_) => K::TypespecMember,
            Self::Range(_) => K::Range,
        }
    }

    /// Children reachable by *own*-edges only (§4.1.3, §4.3.2): the set GC
    /// and clone traverse. Ref-one/ref-many edges are deliberately excluded.
    #[must_use]
    pub fn own_children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        macro_rules! push_opt {
            ($e:expr) => {
                if let Some(id) = $e {
                    out.push(id);
                }
            };
        }
        macro_rules! push_many {
            ($e:expr) => {
                out.extend($e.iter().copied());
            };
        }
        match self {
            Self::Design(d) => {
                push_many!(d.all_modules);
                push_many!(d.top_modules);
                push_many!(d.all_packages);
                push_many!(d.all_classes);
                push_many!(d.all_interfaces);
                push_many!(d.all_programs);
                push_many!(d.all_udps);
                push_many!(d.param_assigns);
            }
            Self::Module(i) | Self::Interface(i) | Self::Program(i) => {
                push_many!(i.ports);
                push_many!(i.nets);
                push_many!(i.variables);
                push_many!(i.parameters);
                push_many!(i.param_assigns);
                push_many!(i.processes);
                push_many!(i.cont_assigns);
                push_many!(i.task_funcs);
                push_many!(i.gen_scopes);
                push_many!(i.sub_instances);
                push_many!(i.typespecs);
            }
            Self::Package(p) => {
                push_many!(p.parameters);
                push_many!(p.param_assigns);
                push_many!(p.variables);
                push_many!(p.typespecs);
                push_many!(p.task_funcs);
                push_many!(p.imports);
            }
            Self::ClassDefn(c) => {
                push_many!(c.variables);
                push_many!(c.parameters);
                push_many!(c.param_assigns);
                push_many!(c.methods);
                push_many!(c.constraints);
            }
            Self::UdpDefn(u) => push_many!(u.ports),
            Self::Function(f) | Self::Task(f) => {
                push_many!(f.io_decls);
                push_many!(f.variables);
                push_many!(f.parameters);
                push_opt!(f.return_typespec);
                push_opt!(f.stmt);
            }
            Self::Begin(b) | Self::Fork(b) => {
                push_many!(b.variables);
                push_many!(b.parameters);
                push_many!(b.stmts);
            }
            Self::ForStmt(f) => {
                push_many!(f.inits);
                push_opt!(f.condition);
                push_many!(f.increments);
                push_many!(f.variables);
                push_opt!(f.stmt);
            }
            Self::ForeachStmt(f) => {
                push_many!(f.loop_vars);
                push_opt!(f.stmt);
            }
            Self::GenScope(g) => {
                push_many!(g.variables);
                push_many!(g.parameters);
                push_many!(g.param_assigns);
                push_many!(g.sub_instances);
                push_many!(g.stmts);
            }
            Self::Port(p) => push_opt!(p.ref_typespec),
            Self::Net(n) => push_opt!(n.ref_typespec),
            Self::Variable(v) => {
                push_opt!(v.ref_typespec);
                push_opt!(v.expr);
            }
            Self::Parameter(p) => push_opt!(p.ref_typespec),
            Self::ParamAssign(p) => {
                push_opt!(p.lhs);
                push_opt!(p.rhs);
            }
            Self::Constant(c) => push_opt!(c.ref_typespec),
            Self::Operation(o) => {
                push_many!(o.operands);
                push_opt!(o.ref_typespec);
            }
            Self::RefObj(r) => push_opt!(r.ref_typespec),
            Self::RefTypespec(_) => {}
            Self::HierPath(h) => {
                push_many!(h.elements);
                push_opt!(h.ref_typespec);
            }
            Self::BitSelect(b) => {
                push_opt!(b.index);
                push_opt!(b.ref_typespec);
            }
            Self::PartSelect(p) => {
                push_opt!(p.left_range);
                push_opt!(p.right_range);
                push_opt!(p.ref_typespec);
            }
            Self::IndexedPartSelect(p) => {
                push_opt!(p.base_expr);
                push_opt!(p.width_expr);
                push_opt!(p.ref_typespec);
            }
            Self::VarSelect(v) => {
                push_many!(v.selects);
                push_opt!(v.ref_typespec);
            }
            Self::SysFuncCall(s) => {
                push_many!(s.args);
                push_opt!(s.ref_typespec);
            }
            Self::FuncCall(f) => {
                push_many!(f.args);
                push_opt!(f.ref_typespec);
            }
            Self::Assignment(a) => {
                push_opt!(a.lhs);
                push_opt!(a.rhs);
            }
            Self::ContAssign(a) => {
                push_opt!(a.lhs);
                push_opt!(a.rhs);
            }
            Self::Always(a) => push_opt!(a.stmt),
            Self::Initial(i) => push_opt!(i.stmt),
            Self::EventControl(e) => {
                push_opt!(e.condition);
                push_opt!(e.stmt);
            }
            Self::IfStmt(i) => {
                push_opt!(i.condition);
                push_opt!(i.stmt);
            }
            Self::IfElse(i) => {
                push_opt!(i.condition);
                push_opt!(i.then_stmt);
                push_opt!(i.else_stmt);
            }
            Self::CaseStmt(c) => {
                push_opt!(c.condition);
                push_many!(c.items);
            }
            Self::CaseItem(c) => {
                push_many!(c.exprs);
                push_opt!(c.stmt);
            }
            Self::WhileStmt(w) => {
                push_opt!(w.condition);
                push_opt!(w.stmt);
            }
            Self::DoWhile(w) => {
                push_opt!(w.condition);
                push_opt!(w.stmt);
            }
            Self::RepeatStmt(r) => {
                push_opt!(r.count);
                push_opt!(r.stmt);
            }
            Self::ReturnStmt(r) => push_opt!(r.condition),
            Self::ContinueStmt(_) | Self::BreakStmt(_) => {}
            Self::LogicTypespec(t) => push_many!(t.ranges),
            Self::BitTypespec(t) => push_many!(t.ranges),
            Self::IntTypespec(_) | Self::IntegerTypespec(_) => {}
            Self::StructTypespec(t) => push_many!(t.members),
            Self::UnionTypespec(t) => push_many!(t.members),
            Self::EnumTypespec(t) => {
                push_opt!(t.base_ref_typespec);
                for ec in &t.enum_consts {
                    push_opt!(ec.value);
                }
            }
            Self::ArrayTypespec(t) => {
                push_opt!(t.element_ref_typespec);
                push_many!(t.ranges);
            }
            Self::PackedArrayTypespec(t) => {
                push_opt!(t.element_ref_typespec);
                push_many!(t.ranges);
            }
            Self::ClassTypespec(_) => {}
            Self::TypedefTypespec(t) => push_opt!(t.actual_ref_typespec),
            Self::ImportTypespec(_) => {}
            Self::TypespecMember(m) => {
                push_opt!(m.ref_typespec);
                push_opt!(m.default_value);
            }
            Self::Range(r) => {
                push_opt!(r.left_expr);
                push_opt!(r.right_expr);
            }
        }
        out
    }

    /// Nodes reachable by *ref*-edges (§3.2 ref-one/ref-many): never
    /// destroyed by own-edge teardown, but must be retained by GC if they
    /// are still reachable some other way, and must be rewritten by `swap`
    /// (§4.2.5) and by clone's internal-reference rewrite (§4.3.2).
    #[must_use]
    pub fn ref_children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        macro_rules! push_opt {
            ($e:expr) => {
                if let Some(id) = $e {
                    out.push(id);
                }
            };
        }
        match self {
            Self::Port(p) => push_opt!(p.low_conn),
            Self::RefObj(r) => push_opt!(r.actual),
            Self::RefTypespec(r) => push_opt!(r.actual),
            Self::BitSelect(b) => push_opt!(b.actual),
            Self::PartSelect(p) => push_opt!(p.actual),
            Self::IndexedPartSelect(p) => push_opt!(p.actual),
            Self::VarSelect(v) => push_opt!(v.actual),
            Self::FuncCall(f) => push_opt!(f.actual),
            Self::ClassDefn(c) => push_opt!(c.extends),
            Self::ClassTypespec(c) => push_opt!(c.class_defn),
            Self::ImportTypespec(i) => push_opt!(i.actual_package),
            _ => {}
        }
        out
    }

    /// Rewrite every own-edge `NodeId` in place via `f` (old child -> new
    /// child). Used by the clone engine (§4.3.2) to retarget a fresh
    /// top-level copy at its already-cloned children.
    pub(crate) fn rewrite_own_children(&mut self, mut f: impl FnMut(NodeId) -> NodeId) {
        macro_rules! fix_opt {
            ($e:expr) => {
                if let Some(id) = $e.as_mut() {
                    *id = f(*id);
                }
            };
        }
        macro_rules! fix_many {
            ($e:expr) => {
                for id in $e.iter_mut() {
                    *id = f(*id);
                }
            };
        }
        match self {
            Self::Design(d) => {
                fix_many!(d.all_modules);
                fix_many!(d.top_modules);
                fix_many!(d.all_packages);
                fix_many!(d.all_classes);
                fix_many!(d.all_interfaces);
                fix_many!(d.all_programs);
                fix_many!(d.all_udps);
                fix_many!(d.param_assigns);
            }
            Self::Module(i) | Self::Interface(i) | Self::Program(i) => {
                fix_many!(i.ports);
                fix_many!(i.nets);
                fix_many!(i.variables);
                fix_many!(i.parameters);
                fix_many!(i.param_assigns);
                fix_many!(i.processes);
                fix_many!(i.cont_assigns);
                fix_many!(i.task_funcs);
                fix_many!(i.gen_scopes);
                fix_many!(i.sub_instances);
                fix_many!(i.typespecs);
            }
            Self::Package(p) => {
                fix_many!(p.parameters);
                fix_many!(p.param_assigns);
                fix_many!(p.variables);
                fix_many!(p.typespecs);
                fix_many!(p.task_funcs);
                fix_many!(p.imports);
            }
            Self::ClassDefn(c) => {
                fix_many!(c.variables);
                fix_many!(c.parameters);
                fix_many!(c.param_assigns);
                fix_many!(c.methods);
                fix_many!(c.constraints);
            }
            Self::UdpDefn(u) => fix_many!(u.ports),
            Self::Function(f) | Self::Task(f) => {
                fix_many!(f.io_decls);
                fix_many!(f.variables);
                fix_many!(f.parameters);
                fix_opt!(f.return_typespec);
                fix_opt!(f.stmt);
            }
            Self::Begin(b) | Self::Fork(b) => {
                fix_many!(b.variables);
                fix_many!(b.parameters);
                fix_many!(b.stmts);
            }
            Self::ForStmt(fst) => {
                fix_many!(fst.inits);
                fix_opt!(fst.condition);
                fix_many!(fst.increments);
                fix_many!(fst.variables);
                fix_opt!(fst.stmt);
            }
            Self::ForeachStmt(fe) => {
                fix_many!(fe.loop_vars);
                fix_opt!(fe.stmt);
            }
            Self::GenScope(g) => {
                fix_many!(g.variables);
                fix_many!(g.parameters);
                fix_many!(g.param_assigns);
                fix_many!(g.sub_instances);
                fix_many!(g.stmts);
            }
            Self::Port(p) => fix_opt!(p.ref_typespec),
            Self::Net(n) => fix_opt!(n.ref_typespec),
            Self::Variable(v) => {
                fix_opt!(v.ref_typespec);
                fix_opt!(v.expr);
            }
            Self::Parameter(p) => fix_opt!(p.ref_typespec),
            Self::ParamAssign(p) => {
                fix_opt!(p.lhs);
                fix_opt!(p.rhs);
            }
            Self::Constant(c) => fix_opt!(c.ref_typespec),
            Self::Operation(o) => {
                fix_many!(o.operands);
                fix_opt!(o.ref_typespec);
            }
            Self::RefObj(r) => fix_opt!(r.ref_typespec),
            Self::RefTypespec(_) => {}
            Self::HierPath(h) => {
                fix_many!(h.elements);
                fix_opt!(h.ref_typespec);
            }
            Self::BitSelect(b) => {
                fix_opt!(b.index);
                fix_opt!(b.ref_typespec);
            }
            Self::PartSelect(p) => {
                fix_opt!(p.left_range);
                fix_opt!(p.right_range);
                fix_opt!(p.ref_typespec);
            }
            Self::IndexedPartSelect(p) => {
                fix_opt!(p.base_expr);
                fix_opt!(p.width_expr);
                fix_opt!(p.ref_typespec);
            }
            Self::VarSelect(v) => {
                fix_many!(v.selects);
                fix_opt!(v.ref_typespec);
            }
            Self::SysFuncCall(s) => {
                fix_many!(s.args);
                fix_opt!(s.ref_typespec);
            }
            Self::FuncCall(fc) => {
                fix_many!(fc.args);
                fix_opt!(fc.ref_typespec);
            }
            Self::Assignment(a) => {
                fix_opt!(a.lhs);
                fix_opt!(a.rhs);
            }
            Self::ContAssign(a) => {
                fix_opt!(a.lhs);
                fix_opt!(a.rhs);
            }
            Self::Always(a) => fix_opt!(a.stmt),
            Self::Initial(i) => fix_opt!(i.stmt),
            Self::EventControl(e) => {
                fix_opt!(e.condition);
                fix_opt!(e.stmt);
            }
            Self::IfStmt(i) => {
                fix_opt!(i.condition);
                fix_opt!(i.stmt);
            }
            Self::IfElse(i) => {
                fix_opt!(i.condition);
                fix_opt!(i.then_stmt);
                fix_opt!(i.else_stmt);
            }
            Self::CaseStmt(c) => {
                fix_opt!(c.condition);
                fix_many!(c.items);
            }
            Self::CaseItem(c) => {
                fix_many!(c.exprs);
                fix_opt!(c.stmt);
            }
            Self::WhileStmt(w) => {
                fix_opt!(w.condition);
                fix_opt!(w.stmt);
            }
            Self::DoWhile(w) => {
                fix_opt!(w.condition);
                fix_opt!(w.stmt);
            }
            Self::RepeatStmt(r) => {
                fix_opt!(r.count);
                fix_opt!(r.stmt);
            }
            Self::ReturnStmt(r) => fix_opt!(r.condition),
            Self::ContinueStmt(_) | Self::BreakStmt(_) => {}
            Self::LogicTypespec(t) => fix_many!(t.ranges),
            Self::BitTypespec(t) => fix_many!(t.ranges),
            Self::IntTypespec(_) | Self::IntegerTypespec(_) => {}
            Self::StructTypespec(t) => fix_many!(t.members),
            Self::UnionTypespec(t) => fix_many!(t.members),
            Self::EnumTypespec(t) => {
                fix_opt!(t.base_ref_typespec);
                for ec in &mut t.enum_consts {
                    fix_opt!(ec.value);
                }
            }
            Self::ArrayTypespec(t) => {
                fix_opt!(t.element_ref_typespec);
                fix_many!(t.ranges);
            }
            Self::PackedArrayTypespec(t) => {
                fix_opt!(t.element_ref_typespec);
                fix_many!(t.ranges);
            }
            Self::ClassTypespec(_) => {}
            Self::TypedefTypespec(t) => fix_opt!(t.actual_ref_typespec),
            Self::ImportTypespec(_) => {}
            Self::TypespecMember(m) => {
                fix_opt!(m.ref_typespec);
                fix_opt!(m.default_value);
            }
            Self::Range(r) => {
                fix_opt!(r.left_expr);
                fix_opt!(r.right_expr);
            }
        }
    }
}
