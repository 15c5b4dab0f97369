//! Error taxonomy (§7) and the serializer's I/O/format error type.
//!
//! The CORE itself never throws: the evaluator sets `invalid_value` and
//! returns the input unchanged (§4.6.1, §9.5), the elaborator leaves
//! unresolved bindings `None` (§4.5.6), and save/restore failures collapse
//! to `Err(UhdmError)` with an empty handle list (§4.2.4 last paragraph).
//! Diagnostics that are advisory rather than fatal go through the installed
//! [`ErrorHandler`] callback instead of a `Result`, matching the host
//! crate's choice to report interpreter errors through a typed enum
//! (`repl_error.rs::ReplError`) rather than a logging crate.

use std::fmt;

use crate::ids::NodeId;

/// Bit-exact error kind list (§7, §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    UhdmUnsupportedExpr,
    UhdmUnsupportedStmt,
    UhdmUndefinedPatternKey,
    UhdmUnmatchedFieldInPatternAssign,
    UhdmDivideByZero,
    UhdmInternalErrorOutOfBound,
    UhdmUndefinedUserFunction,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        f.write_str(s)
    }
}

/// `(kind, message, primary-node, secondary-node)` -- §6.3.
pub type ErrorHandler = Box<dyn Fn(ErrorKind, &str, Option<NodeId>, Option<NodeId>)>;

/// Default handler: prints to stderr (§6.3 "Default handler prints to stderr").
#[must_use]
pub fn default_error_handler() -> ErrorHandler {
    Box::new(|kind, message, primary, secondary| {
        eprint!("[{kind}] {message}");
        if let Some(p) = primary {
            eprint!(" (at {p})");
        }
        if let Some(s) = secondary {
            eprint!(" (related {s})");
        }
        eprintln!();
    })
}

/// Failures from the serializer (§4.2.4): I/O errors or a version mismatch.
/// Both cases leave the arena "as if newly constructed" (§4.2.4).
#[derive(Debug)]
pub enum UhdmError {
    Io(std::io::Error),
    Encode(postcard::Error),
    Decode(postcard::Error),
    VersionMismatch { expected: u32, found: u32 },
}

impl fmt::Display for UhdmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::Encode(e) => write!(f, "encode error: {e}"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
            Self::VersionMismatch { expected, found } => {
                write!(f, "version mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for UhdmError {}

impl From<std::io::Error> for UhdmError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
