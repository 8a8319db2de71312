//! Core data types shared across the GC core (§3 DATA MODEL).

use static_assertions::const_assert;

/// Segment number: `segno ∈ [0, N_seg)`.
pub type Segno = usize;
/// Section number: `secno = segno / segs_per_sec`.
pub type Secno = usize;
/// Node id, as recorded in a summary entry and looked up in the NAT.
pub type Nid = u64;
/// Inode number.
pub type Ino = u64;
/// On-disk block address (host block address the log is written at).
pub type BlockAddr = u64;
/// Per-nid version counter, bumped whenever a node is rewritten.
pub type Version = u64;
/// A node's offset within its inode's node tree (as used by
/// [`crate::start_bidx_of_node`]).
pub type NodeOfs = usize;
/// Index (within a segment) of a block's summary entry / bitmap bit.
pub type Ofs = usize;

/// A sentinel meaning "no address" / "no such node", mirroring f2fs's
/// `NULL_ADDR`.
pub const NULL_ADDR: BlockAddr = 0;

/// Data-block pointer slots in one direct node page.
pub const ADDRS_PER_BLOCK: usize = 1018;
/// Data-block pointer slots held directly in an inode page.
pub const ADDRS_PER_INODE: usize = 923;
/// Node-id pointer slots in one indirect node page.
pub const NIDS_PER_BLOCK: usize = 1018;

const_assert!(ADDRS_PER_BLOCK > 0);
const_assert!(NIDS_PER_BLOCK > 0);

/// Node offsets `[0, indirect_blks]` are covered by the inode's direct data
/// and its two direct-node children plus the two single-indirect subtrees;
/// beyond that lies the double-indirect subtree.
pub const fn indirect_blks() -> usize {
    2 * NIDS_PER_BLOCK + 4
}

/// Kind of data a dirty-segment bitmap tracks (§3: `dirty_segmap[kind]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Dirty,
    DirtyHotNode,
    DirtyWarmNode,
    DirtyColdNode,
    DirtyHotData,
    DirtyWarmData,
    DirtyColdData,
}

/// Footer type recorded on a segment's summary block, used by the
/// orchestrator to dispatch to the node or data relocator (§4.6 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    Node,
    Data,
}

/// `gc_type ∈ {FG, BG}` (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcType {
    Foreground,
    Background,
}

impl GcType {
    pub fn is_foreground(self) -> bool {
        matches!(self, GcType::Foreground)
    }
}

/// `alloc_mode ∈ {LFS, SSR}` (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocMode {
    Lfs,
    Ssr,
}

/// The cost model a victim-selection pass uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcMode {
    Greedy,
    CostBenefit,
}

/// `gc_th.gc_idle` (§6): forces a cost model regardless of the default
/// resolution table in §4.2, or leaves the default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcIdle {
    Disabled,
    ForceCostBenefit,
    ForceGreedy,
}

/// Per-segment entry as owned by the SIT subsystem (§3: "Segment entry").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegEntry {
    pub mtime: u64,
    pub ckpt_valid_blocks: usize,
    pub valid_blocks: usize,
}

/// One summary entry describing a block's parent node reference (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SummaryEntry {
    pub nid: Nid,
    pub version: Version,
    pub ofs_in_node: u32,
}

/// NAT entry: node id → (inode, block address, version) (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NatEntry {
    pub ino: Ino,
    pub blk_addr: BlockAddr,
    pub version: Version,
}

/// The outcome of the liveness oracle (§4.3).
#[derive(Debug, Clone, Copy)]
pub struct DnodeInfo {
    pub ino: Ino,
    pub nofs: NodeOfs,
}

/// How a data block currently sits in the page cache, used by the FG
/// classification table (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    NotCached,
    CachedClean,
    CachedDirty,
}

/// How a data block should be relocated (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocClass {
    Move,
    Remap,
    Encrypted,
}
