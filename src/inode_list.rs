//! GC inode list (§3): the set of inodes currently pinned by an in-flight
//! data relocation, so the same inode is never double-`iget`'d across two
//! blocks being migrated in the same pass and every pin is released exactly
//! once.
//!
//! Grounded on the pin/release discipline in the teacher's
//! `clean_and_migrate_data` (`layers/5-disk/gc.rs`), generalized from its
//! single-disk HBA bookkeeping to the ordered ino-keyed list §3 describes.

use crate::collab::{InodeManager, InodeRef};
use crate::error::Result;
use crate::os::HashMap;
use crate::types::Ino;

/// Ordered set of pinned inodes, keyed by `ino`, preserving first-pin order
/// so release can walk them deterministically (§3, §4.5 "double iget"
/// avoidance, §9 release-completeness invariant).
pub struct GcInodeList {
    order: Vec<Ino>,
    pinned: HashMap<Ino, Box<dyn InodeRef>>,
}

impl GcInodeList {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            pinned: HashMap::new(),
        }
    }

    pub fn is_pinned(&self, ino: Ino) -> bool {
        self.pinned.contains_key(&ino)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Borrow the handle `pin` already fetched, so callers working through
    /// several blocks of the same inode never need a second `iget`.
    pub fn get(&self, ino: Ino) -> Option<&dyn InodeRef> {
        self.pinned.get(&ino).map(|b| b.as_ref())
    }

    /// Pin `ino`, fetching it via `iget` only if not already pinned
    /// (§4.5: never `iget` the same inode twice within one migration pass).
    pub fn pin(&mut self, inodes: &dyn InodeManager, ino: Ino) -> Result<()> {
        if self.pinned.contains_key(&ino) {
            return Ok(());
        }
        let inode = inodes.iget(ino)?;
        self.pinned.insert(ino, inode);
        self.order.push(ino);
        Ok(())
    }

    /// Release every pinned inode in pin order, via `put_inode`. Always
    /// drains fully even if an individual release panics-free path never
    /// exists here; the list's own state is left empty regardless (§9:
    /// the release must be complete, never leaving a stray pin behind).
    pub fn release_all(&mut self, inodes: &dyn InodeManager) {
        for ino in self.order.drain(..) {
            if let Some(inode) = self.pinned.remove(&ino) {
                inodes.put_inode(inode);
            }
        }
    }
}

impl Default for GcInodeList {
    fn default() -> Self {
        Self::new()
    }
}
