//! The closed node-kind taxonomy (§3.1) and the capability predicates the
//! rest of the CORE dispatches on.
//!
//! The full schema is ~400 mechanically generated kinds (out of scope, §1).
//! This crate implements the subset named in §3.1/§3.3 that is sufficient to
//! realize every operation in the spec. Kind checks are exhaustive `match`
//! arms rather than a generated `getByVpiType` table, matching the host
//! crate's closed-enum-plus-`match` style (`intern.rs::StaticStrings`,
//! `value.rs::Value`).

use serde::{Deserialize, Serialize};

/// Tag identifying which variant of [`crate::node::NodeData`] a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Kind {
    Design,
    Module,
    Interface,
    Program,
    Package,
    ClassDefn,
    UdpDefn,
    Function,
    Task,
    Begin,
    Fork,
    ForStmt,
    ForeachStmt,
    GenScope,
    Port,
    Net,
    Variable,
    Parameter,
    ParamAssign,
    Constant,
    Operation,
    RefObj,
    RefTypespec,
    HierPath,
    BitSelect,
    PartSelect,
    IndexedPartSelect,
    VarSelect,
    SysFuncCall,
    FuncCall,
    Assignment,
    ContAssign,
    Always,
    Initial,
    EventControl,
    IfStmt,
    IfElse,
    CaseStmt,
    CaseItem,
    WhileStmt,
    DoWhile,
    RepeatStmt,
    ReturnStmt,
    ContinueStmt,
    BreakStmt,
    LogicTypespec,
    BitTypespec,
    IntTypespec,
    IntegerTypespec,
    StructTypespec,
    UnionTypespec,
    EnumTypespec,
    ArrayTypespec,
    PackedArrayTypespec,
    ClassTypespec,
    TypedefTypespec,
    ImportTypespec,
    TypespecMember,
    Range,
}

impl Kind {
    /// "is an expression" capability (§3.1).
    #[must_use]
    pub fn is_expr(self) -> bool {
        matches!(
            self,
            Self::Constant
                | Self::Operation
                | Self::RefObj
                | Self::HierPath
                | Self::BitSelect
                | Self::PartSelect
                | Self::IndexedPartSelect
                | Self::VarSelect
                | Self::SysFuncCall
                | Self::FuncCall
        )
    }

    /// "is a statement" capability.
    #[must_use]
    pub fn is_stmt(self) -> bool {
        matches!(
            self,
            Self::Assignment
                | Self::ContAssign
                | Self::Always
                | Self::Initial
                | Self::EventControl
                | Self::IfStmt
                | Self::IfElse
                | Self::CaseStmt
                | Self::CaseItem
                | Self::WhileStmt
                | Self::DoWhile
                | Self::RepeatStmt
                | Self::ReturnStmt
                | Self::ContinueStmt
                | Self::BreakStmt
                | Self::ForStmt
                | Self::ForeachStmt
                | Self::Begin
                | Self::Fork
        )
    }

    /// "is a scope" capability (introduces a local name lookup frame, §3.3).
    #[must_use]
    pub fn is_scope(self) -> bool {
        matches!(
            self,
            Self::Design
                | Self::Module
                | Self::Interface
                | Self::Program
                | Self::Package
                | Self::ClassDefn
                | Self::UdpDefn
                | Self::Function
                | Self::Task
                | Self::Begin
                | Self::Fork
                | Self::ForStmt
                | Self::ForeachStmt
                | Self::GenScope
        )
    }

    /// "is an instance" capability shared by Module/Interface/Program (§3.3).
    #[must_use]
    pub fn is_instance(self) -> bool {
        matches!(self, Self::Module | Self::Interface | Self::Program)
    }

    /// "is a typespec" capability.
    #[must_use]
    pub fn is_typespec(self) -> bool {
        matches!(
            self,
            Self::LogicTypespec
                | Self::BitTypespec
                | Self::IntTypespec
                | Self::IntegerTypespec
                | Self::StructTypespec
                | Self::UnionTypespec
                | Self::EnumTypespec
                | Self::ArrayTypespec
                | Self::PackedArrayTypespec
                | Self::ClassTypespec
                | Self::TypedefTypespec
                | Self::ImportTypespec
        )
    }

    /// "has name" capability -- declarations, scopes, and task/funcs.
    #[must_use]
    pub fn has_name(self) -> bool {
        self.is_scope()
            || matches!(
                self,
                Self::Port | Self::Net | Self::Variable | Self::Parameter | Self::RefObj | Self::TypespecMember
            )
    }
}

/// VPI operation-type enumeration (§3.3 `Operation`).
///
/// Grounded on `original_source`'s `vpi_user.h` op-code space, trimmed to
/// the operations §4.6.4 names reduction rules for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum OpType {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    Minus,
    Plus,
    Not,
    BitNeg,
    BitAnd,
    BitOr,
    BitXor,
    BitXnor,
    LogAnd,
    LogOr,
    UnaryAnd,
    UnaryNand,
    UnaryOr,
    UnaryNor,
    UnaryXor,
    UnaryXnor,
    LShift,
    RShift,
    ArithLShift,
    ArithRShift,
    Eq,
    Neq,
    CaseEq,
    CaseNeq,
    Lt,
    Le,
    Gt,
    Ge,
    Concat,
    MultiConcat,
    Conditional,
    Assignment,
    AssignmentPattern,
    MultiAssignmentPattern,
    Cast,
    Inside,
    PostInc,
    PostDec,
    PreInc,
    PreDec,
    Posedge,
    Negedge,
    AnyEdge,
}

impl OpType {
    #[must_use]
    pub fn is_compound_assign(self) -> bool {
        // NOTE: compound-assign (+=, -=, ...) is represented as an
        // `Assignment` node carrying this `OpType` in the assignment's
        // `op_type` field (§4.6.6), not as a distinct operand-level op.
        matches!(self, Self::Add | Self::Sub | Self::Mult | Self::Div | Self::Mod)
    }
}
