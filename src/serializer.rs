//! Serializer (C2, §4.2): binary save/restore of the full graph with
//! identity preservation.
//!
//! Grounded on the host crate's `repl.rs::save`/`load` and
//! `run.rs::Runner::dump`/`load`, which already do exactly this shape of
//! work (a versioned envelope, `postcard::to_allocvec`/`from_bytes`) for
//! whole-interpreter snapshots. The per-kind/per-record wire layout
//! described in §4.2.2 is realized here through `NodeData`'s tagged-enum
//! `Serialize` impl (the enum variant tag *is* the kind-tag) plus the
//! node's `NodeId` (its position in the flat slab) standing in for
//! "index-within-kind" -- equivalent in information content to grouping by
//! kind first, simpler to keep in lock-step with the in-memory arena.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::error::UhdmError;
use crate::ids::{Handle, NodeId};
use crate::node::NodeSlot;

/// Single 32-bit version number (§6.1). Restore rejects any mismatch --
/// no forward/backward compatibility guarantee within this format.
pub const UHDM_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    symbols: Vec<String>,
    slots: Vec<Option<NodeSlot>>,
    design_root: Option<NodeId>,
    /// Handle roster (§4.2.2): roots returned by `restore`, in original order.
    roots: Vec<NodeId>,
}

/// Owns an [`Arena`] and knows how to persist/reload it (§4.2.1).
#[derive(Default)]
pub struct Serializer {
    pub arena: Arena,
}

impl Serializer {
    #[must_use]
    pub fn new() -> Self {
        Self { arena: Arena::new() }
    }

    /// Save algorithm (§4.2.3): walk all live nodes, emit header, symbols,
    /// then per-node records. `roots` is the set of handles that should come
    /// back from `restore` (§4.2.2 "Handle roster").
    ///
    /// # Errors
    /// Returns `Err` on I/O failure or encode failure; no partial file is
    /// left in place other than what `std::fs::write` itself may leave on a
    /// failed write.
    pub fn save(&self, path: &Path, roots: &[Handle]) -> Result<(), UhdmError> {
        let envelope = Envelope {
            version: UHDM_VERSION,
            symbols: self.arena.interner.strings().to_vec(),
            slots: self.arena.raw_slots().to_vec(),
            design_root: self.arena.design_root,
            roots: roots.iter().map(|h| h.node_id()).collect(),
        };
        let bytes = postcard::to_allocvec(&envelope).map_err(UhdmError::Encode)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Restore algorithm (§4.2.4). Any I/O or decode error fails restore
    /// with an empty handle list and leaves the arena purged -- "as if
    /// newly constructed" (§4.2.4 last paragraph).
    ///
    /// # Errors
    /// Returns `Err` if the file cannot be read, the bytes do not decode,
    /// or the embedded version does not exactly match [`UHDM_VERSION`].
    pub fn restore(&mut self, path: &Path) -> Result<Vec<Handle>, UhdmError> {
        let result = self.try_restore(path);
        if result.is_err() {
            self.arena.purge();
        }
        result
    }

    fn try_restore(&mut self, path: &Path) -> Result<Vec<Handle>, UhdmError> {
        let bytes = std::fs::read(path)?;
        let envelope: Envelope = postcard::from_bytes(&bytes).map_err(UhdmError::Decode)?;
        if envelope.version != UHDM_VERSION {
            return Err(UhdmError::VersionMismatch {
                expected: UHDM_VERSION,
                found: envelope.version,
            });
        }
        self.arena.restore_raw(envelope.symbols, envelope.slots, envelope.design_root);
        Ok(envelope.roots.into_iter().map(|id| self.arena.make_handle(id)).collect())
    }

    /// Save directly to an in-memory buffer -- useful for round-trip tests
    /// and for hosts that manage their own storage (mirrors
    /// `Runner::dump`/`load` in the host crate).
    ///
    /// # Errors
    /// Returns `Err` on encode failure.
    pub fn dump(&self, roots: &[Handle]) -> Result<Vec<u8>, UhdmError> {
        let envelope = Envelope {
            version: UHDM_VERSION,
            symbols: self.arena.interner.strings().to_vec(),
            slots: self.arena.raw_slots().to_vec(),
            design_root: self.arena.design_root,
            roots: roots.iter().map(|h| h.node_id()).collect(),
        };
        postcard::to_allocvec(&envelope).map_err(UhdmError::Encode)
    }

    /// # Errors
    /// Returns `Err` on decode failure or version mismatch.
    pub fn load(&mut self, bytes: &[u8]) -> Result<Vec<Handle>, UhdmError> {
        let envelope: Envelope = match postcard::from_bytes(bytes) {
            Ok(e) => e,
            Err(e) => {
                self.arena.purge();
                return Err(UhdmError::Decode(e));
            }
        };
        if envelope.version != UHDM_VERSION {
            self.arena.purge();
            return Err(UhdmError::VersionMismatch {
                expected: UHDM_VERSION,
                found: envelope.version,
            });
        }
        self.arena.restore_raw(envelope.symbols, envelope.slots, envelope.design_root);
        Ok(envelope.roots.into_iter().map(|id| self.arena.make_handle(id)).collect())
    }
}
