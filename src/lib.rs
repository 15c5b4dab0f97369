//! In-memory IR, binary serializer, elaborator, expression evaluator, and
//! name resolver for elaborated hardware designs (§1).
//!
//! The arena (`arena`) owns every node; `node`/`kind`/`ids` describe what a
//! node is and how it is addressed; `clone` and `elaborator` build
//! elaborated instances out of folded definitions (C3, C5); `serializer`
//! persists a graph with identity preserved across a round trip (C2);
//! `resolver` answers scope-chain name lookups (C4); `eval` partially
//! evaluates expressions and statements against a scope (C6); `visitor`
//! walks a graph read-only.
#![expect(clippy::too_many_lines, reason = "per-kind dispatch tables read better flat")]
#![expect(clippy::missing_panics_doc, reason = "documented invariants, not public contracts")]

pub mod arena;
pub mod clone;
pub mod elaborator;
pub mod error;
pub mod eval;
pub mod ids;
pub mod kind;
pub mod node;
pub mod resolver;
pub mod serializer;
pub mod visitor;

pub use crate::arena::{Arena, Interner};
pub use crate::clone::CloneContext;
pub use crate::elaborator::Elaborator;
pub use crate::error::{default_error_handler, ErrorHandler, ErrorKind, UhdmError};
pub use crate::eval::{DefaultProvider, ExprEval, ObjectProvider, Reduction};
pub use crate::ids::{Handle, NodeId, SymbolId, BAD_SYMBOL_ID};
pub use crate::kind::{Kind, OpType};
pub use crate::node::{NodeData, NodeHeader, NodeSlot, SourceLoc};
pub use crate::resolver::UhdmFinder;
pub use crate::serializer::{Serializer, UHDM_VERSION};
pub use crate::visitor::{walk, Listener, WalkContext};
