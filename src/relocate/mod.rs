//! Relocator (C4, §4.4, §4.5): moves the still-live contents of a victim
//! segment to new locations so the segment can be freed. Split into a node
//! path and a data path, since the two footer types need entirely
//! different revalidation and I/O shapes.

pub mod data;
pub mod node;

use crate::types::GcType;

/// Outcome of relocating one segment, reported back to the orchestrator
/// (§4.6): how many blocks were found live and how many were actually
/// migrated (the difference is blocks invalidated out from under the scan,
/// never an error).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocStats {
    pub blocks_scanned: usize,
    pub blocks_live: usize,
    pub blocks_migrated: usize,
    /// Success signal (§4.4/§4.5): true iff the victim segment has zero
    /// valid blocks left once this relocation pass (and, in the foreground,
    /// its write barrier) has completed.
    pub segment_freed: bool,
}

impl RelocStats {
    pub fn merge(&mut self, other: RelocStats) {
        self.blocks_scanned += other.blocks_scanned;
        self.blocks_live += other.blocks_live;
        self.blocks_migrated += other.blocks_migrated;
        self.segment_freed = other.segment_freed;
    }
}

/// Whether a GC call should keep going after this segment, used by the
/// background early-abort rule (§4.4: BG aborts once free sections clear
/// the threshold rather than finishing a whole batch).
pub fn should_continue(gc_type: GcType, free_secs_cleared_threshold: bool) -> bool {
    match gc_type {
        GcType::Foreground => true,
        GcType::Background => !free_secs_cleared_threshold,
    }
}
