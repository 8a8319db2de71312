//! Trait interfaces for every external collaborator named in §6
//! ("Consumed"). The GC core is generic over these; it never implements
//! the on-disk format, the NAT, the SIT, the page cache, the block I/O
//! layer, or the checkpoint writer. This mirrors how the rest of this
//! storage stack treats `TxLsmTree`/`TxLogStore`/`BlockSet` as
//! collaborators the GC layer calls into rather than reimplements.

use crate::error::Result;
use crate::types::{
    BlockAddr, CacheState, Ino, Nid, NatEntry, NodeOfs, Ofs, SegEntry, SegmentKind, SegmentType,
    Secno, Segno, SummaryEntry,
};

/// A segment's summary block: one entry per block offset (§3).
pub type SummaryBlock = Vec<SummaryEntry>;

/// Opaque handle to a locked node page. Collaborators hand these back and
/// forth opaquely; the GC core only ever passes them to other collaborator
/// methods, never inspects their contents directly (the real payload lives
/// on the other side of the §6 boundary).
pub trait NodePage: Send {
    fn nid(&self) -> Nid;
}

/// Opaque handle to a pinned inode reference, owned by the GC inode list
/// between `iget` and `put_inode` (§3: "GC inode list").
pub trait InodeRef: Send {
    fn ino(&self) -> Ino;
    fn is_encrypted_regular(&self) -> bool;
}

/// Opaque handle to a ciphertext page read for the `ENCRYPTED` relocation
/// path (§4.5).
pub trait CipherPage: Send {}

/// The segment information table: per-segment bitmaps, counts, mtime, and
/// the dirty-segment / victim-section bookkeeping (§3, §4.2).
pub trait SitProvider: Send + Sync {
    fn total_segs(&self) -> usize;
    fn segs_per_sec(&self) -> usize;
    fn blocks_per_seg(&self) -> usize;

    fn get_seg_entry(&self, segno: Segno) -> SegEntry;
    fn get_valid_blocks(&self, segno: Segno) -> usize {
        self.get_seg_entry(segno).valid_blocks
    }

    /// Cheap SIT-bitmap pre-filter (§4.3): is the block at `(segno, off)`
    /// currently marked valid? Taken under the SIT's own lock; the
    /// relocator re-runs this after acquiring the node page.
    fn check_valid_map(&self, segno: Segno, off: Ofs) -> bool;

    /// `dirty_segmap[kind]`: segment numbers currently dirty (§3).
    fn dirty_segnos(&self, kind: SegmentKind) -> Vec<Segno>;

    /// True if `secno` is currently in use (the current append target, or
    /// otherwise pinned) and must be excluded from victim selection (§4.2).
    fn sec_usage_check(&self, secno: Secno) -> bool;
}

/// The node address table: node id → (inode, block address, version).
pub trait NatProvider: Send + Sync {
    fn get_node_info(&self, nid: Nid) -> Result<NatEntry>;
}

/// Node page cache / node manager (§6: `get_node_page`, `ra_node_page`,
/// `get_sum_page`, `datablock_addr`, `ofs_of_node`, ...).
pub trait NodeManager: Send + Sync {
    fn get_sum_page(&self, segno: Segno) -> Result<SummaryBlock>;

    /// Best-effort readahead of a segment's summary block; failures are
    /// not reported (§4.6: warm every segment in a multi-segment section
    /// before the per-segment relocation loop touches any of them).
    fn ra_sum_page(&self, segno: Segno);

    /// Best-effort readahead; failures are not reported (§4.4 pass 1).
    fn ra_node_page(&self, nid: Nid);

    fn get_node_page(&self, nid: Nid) -> Result<Box<dyn NodePage>>;
    fn put_node_page(&self, page: Box<dyn NodePage>);

    fn datablock_addr(&self, page: &dyn NodePage, ofs_in_node: Ofs) -> BlockAddr;
    fn ofs_of_node(&self, page: &dyn NodePage) -> NodeOfs;

    fn is_writeback(&self, page: &dyn NodePage) -> bool;
    fn wait_on_page_writeback(&self, page: &dyn NodePage);
    fn mark_dirty(&self, page: &dyn NodePage);

    /// `sync_node_pages(SYNC_ALL)`: flush every dirty node page (§4.4).
    fn sync_node_pages(&self) -> Result<()>;
}

/// Inode manager (§6: `f2fs_iget`).
pub trait InodeManager: Send + Sync {
    fn iget(&self, ino: Ino) -> Result<Box<dyn InodeRef>>;
    fn put_inode(&self, inode: Box<dyn InodeRef>);

    fn get_inode_page(&self, ino: Ino) -> Result<Box<dyn NodePage>>;
    fn ra_inode_page(&self, ino: Ino);
}

/// Data-block relocation collaborator: page cache probing, allocation,
/// extent-cache update, and merged-I/O submission (§4.5, §6).
pub trait DataManager: Send + Sync {
    fn start_bidx(&self, inode: &dyn InodeRef, nofs: NodeOfs) -> BlockAddr;

    /// Probe the page cache for the block at `bidx` (§4.5 phase 2).
    fn probe_page_cache(&self, inode: &dyn InodeRef, bidx: BlockAddr) -> CacheState;

    fn allocate_data_block(&self, old_addr: BlockAddr, set_cold: bool) -> Result<BlockAddr>;
    fn update_dnode_addr(
        &self,
        inode: &dyn InodeRef,
        ofs_in_node: Ofs,
        new_addr: BlockAddr,
    ) -> Result<()>;
    fn update_extent_cache(&self, inode: &dyn InodeRef, bidx: BlockAddr, new_addr: BlockAddr);

    fn wait_on_block_writeback(&self, addr: BlockAddr);
    fn submit_page_bio(&self, addr: BlockAddr) -> Result<()>;
    fn submit_page_mbio(&self, addr: BlockAddr) -> Result<()>;
    fn submit_merged_bio(&self) -> Result<()>;

    fn read_ciphertext(&self, addr: BlockAddr) -> Result<Box<dyn CipherPage>>;
    fn submit_cipher_page(&self, page: Box<dyn CipherPage>, new_addr: BlockAddr) -> Result<()>;
}

/// Free-space pressure, idleness, and lifecycle state (§6: `has_not_enough_free_secs`,
/// `has_enough_invalid_blocks`, `is_idle`, `prefree_segments`, `free_segments`).
pub trait SpaceObserver: Send + Sync {
    fn has_not_enough_free_secs(&self, sec_freed: usize) -> bool;
    fn has_enough_invalid_blocks(&self) -> bool;
    fn is_idle(&self) -> bool;
    fn prefree_segments(&self) -> usize;
    fn free_segments(&self) -> usize;

    /// True at or above write-freeze (§4.1 step 2).
    fn is_write_frozen(&self) -> bool;
    /// False once the filesystem is shutting down or has hit a fatal error.
    fn is_active(&self) -> bool;
    fn checkpoint_error(&self) -> bool;
}

/// Checkpoint writer and background load-balancing hook (§6).
pub trait CheckpointWriter: Send + Sync {
    fn write_checkpoint(&self) -> Result<()>;
    fn balance_fs_bg(&self);
}

/// The full set of collaborators one GC call or worker tick needs. Bundled
/// so orchestrator/pacer signatures don't have to enumerate every trait.
pub trait Filesystem: Send + Sync {
    fn sit(&self) -> &dyn SitProvider;
    fn nat(&self) -> &dyn NatProvider;
    fn nodes(&self) -> &dyn NodeManager;
    fn inodes(&self) -> &dyn InodeManager;
    fn data(&self) -> &dyn DataManager;
    fn space(&self) -> &dyn SpaceObserver;
    fn checkpoint(&self) -> &dyn CheckpointWriter;

    /// Footer type of a segment's summary block (§4.6 step 3).
    fn segment_type(&self, segno: Segno) -> SegmentType;
}
