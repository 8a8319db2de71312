//! Shared in-memory filesystem harness implementing every `collab` trait,
//! used across the integration tests. One node owns exactly one data
//! block, keyed by the same id, which is enough to exercise victim
//! selection, liveness, and both relocation paths end to end without a
//! real on-disk format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use lfs_gc::os::HashMap;

use lfs_gc::collab::{
    CheckpointWriter, CipherPage, DataManager, Filesystem, InodeManager, InodeRef, NatProvider,
    NodeManager, NodePage, SitProvider, SpaceObserver, SummaryBlock,
};
use lfs_gc::error::Result;
use lfs_gc::types::{
    BlockAddr, CacheState, Ino, Nid, NatEntry, NodeOfs, Ofs, SegEntry, Segno, SegmentKind,
    SegmentType, SummaryEntry,
};

pub struct FakeNodePage {
    pub nid: Nid,
}
impl NodePage for FakeNodePage {
    fn nid(&self) -> Nid {
        self.nid
    }
}

pub struct FakeInode {
    pub ino: Ino,
}
impl InodeRef for FakeInode {
    fn ino(&self) -> Ino {
        self.ino
    }
    fn is_encrypted_regular(&self) -> bool {
        false
    }
}

pub struct FakeCipherPage;
impl CipherPage for FakeCipherPage {}

/// One segment's worth of live state: a summary entry per block, keyed by
/// the same id as the owning node and inode, kept in lockstep with the
/// NAT entry for that id.
pub struct FakeFilesystem {
    pub segs_per_sec: usize,
    pub blocks_per_seg: usize,
    pub seg_entries: Mutex<HashMap<Segno, SegEntry>>,
    pub summaries: Mutex<HashMap<Segno, SummaryBlock>>,
    pub seg_types: Mutex<HashMap<Segno, SegmentType>>,
    pub nat: Mutex<HashMap<Nid, NatEntry>>,
    pub next_addr: AtomicU64,
    pub dirty_kinds: Mutex<HashMap<SegmentKind, Vec<Segno>>>,
    pub free_secs_needed: AtomicU64,
    pub synced_nodes: AtomicU64,
    pub merged_bios: AtomicU64,
    pub sum_page_readaheads: Mutex<Vec<Segno>>,
}

impl FakeFilesystem {
    pub fn new(blocks_per_seg: usize) -> Self {
        Self {
            segs_per_sec: 1,
            blocks_per_seg,
            seg_entries: Mutex::new(HashMap::new()),
            summaries: Mutex::new(HashMap::new()),
            seg_types: Mutex::new(HashMap::new()),
            nat: Mutex::new(HashMap::new()),
            next_addr: AtomicU64::new(1_000_000),
            dirty_kinds: Mutex::new(HashMap::new()),
            free_secs_needed: AtomicU64::new(0),
            synced_nodes: AtomicU64::new(0),
            merged_bios: AtomicU64::new(0),
            sum_page_readaheads: Mutex::new(Vec::new()),
        }
    }

    /// Register a segment with `nblocks` live nodes/blocks, each one owned
    /// by its own freshly-synthesized inode, all still pointing at this
    /// segment (i.e. fully live, valid_blocks == nblocks).
    pub fn add_live_segment(&self, segno: Segno, nblocks: usize, mtime: u64, seg_type: SegmentType) {
        let mut entries = self.seg_entries.lock().unwrap();
        entries.insert(
            segno,
            SegEntry {
                mtime,
                ckpt_valid_blocks: nblocks,
                valid_blocks: nblocks,
            },
        );

        let mut summary = Vec::new();
        let mut nat = self.nat.lock().unwrap();
        for ofs in 0..nblocks {
            let nid = (segno as u64) * 10_000 + ofs as u64;
            summary.push(SummaryEntry {
                nid,
                version: 0,
                ofs_in_node: 0,
            });
            nat.insert(
                nid,
                NatEntry {
                    ino: nid,
                    blk_addr: segno as BlockAddr * self.blocks_per_seg as BlockAddr + ofs as BlockAddr,
                    version: 0,
                },
            );
        }
        self.summaries.lock().unwrap().insert(segno, summary);
        self.seg_types.lock().unwrap().insert(segno, seg_type);
        self.dirty_kinds
            .lock()
            .unwrap()
            .entry(SegmentKind::Dirty)
            .or_default()
            .push(segno);
    }

    pub fn valid_blocks(&self, segno: Segno) -> usize {
        self.seg_entries.lock().unwrap()[&segno].valid_blocks
    }
}

impl SitProvider for FakeFilesystem {
    fn total_segs(&self) -> usize {
        self.seg_entries.lock().unwrap().len()
    }
    fn segs_per_sec(&self) -> usize {
        self.segs_per_sec
    }
    fn blocks_per_seg(&self) -> usize {
        self.blocks_per_seg
    }
    fn get_seg_entry(&self, segno: Segno) -> SegEntry {
        self.seg_entries.lock().unwrap()[&segno]
    }
    fn check_valid_map(&self, _segno: Segno, _off: Ofs) -> bool {
        true
    }
    fn dirty_segnos(&self, kind: SegmentKind) -> Vec<Segno> {
        self.dirty_kinds
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }
    fn sec_usage_check(&self, _secno: lfs_gc::types::Secno) -> bool {
        false
    }
}

impl NatProvider for FakeFilesystem {
    fn get_node_info(&self, nid: Nid) -> Result<NatEntry> {
        self.nat
            .lock()
            .unwrap()
            .get(&nid)
            .copied()
            .ok_or_else(|| lfs_gc::error::Error::new(lfs_gc::error::Errno::StaleReference))
    }
}

impl NodeManager for FakeFilesystem {
    fn get_sum_page(&self, segno: Segno) -> Result<SummaryBlock> {
        Ok(self
            .summaries
            .lock()
            .unwrap()
            .get(&segno)
            .cloned()
            .unwrap_or_default())
    }
    fn ra_sum_page(&self, segno: Segno) {
        self.sum_page_readaheads.lock().unwrap().push(segno);
    }
    fn ra_node_page(&self, _nid: Nid) {}
    fn get_node_page(&self, nid: Nid) -> Result<Box<dyn NodePage>> {
        Ok(Box::new(FakeNodePage { nid }))
    }
    fn put_node_page(&self, _page: Box<dyn NodePage>) {}
    fn datablock_addr(&self, page: &dyn NodePage, _ofs_in_node: Ofs) -> BlockAddr {
        self.nat
            .lock()
            .unwrap()
            .get(&page.nid())
            .map(|e| e.blk_addr)
            .unwrap_or(0)
    }
    fn ofs_of_node(&self, _page: &dyn NodePage) -> NodeOfs {
        0
    }
    fn is_writeback(&self, _page: &dyn NodePage) -> bool {
        false
    }
    fn wait_on_page_writeback(&self, _page: &dyn NodePage) {}
    fn mark_dirty(&self, _page: &dyn NodePage) {}
    fn sync_node_pages(&self) -> Result<()> {
        self.synced_nodes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl InodeManager for FakeFilesystem {
    fn iget(&self, ino: Ino) -> Result<Box<dyn InodeRef>> {
        Ok(Box::new(FakeInode { ino }))
    }
    fn put_inode(&self, _inode: Box<dyn InodeRef>) {}
    fn get_inode_page(&self, ino: Ino) -> Result<Box<dyn NodePage>> {
        Ok(Box::new(FakeNodePage { nid: ino }))
    }
    fn ra_inode_page(&self, _ino: Ino) {}
}

impl DataManager for FakeFilesystem {
    fn start_bidx(&self, _inode: &dyn InodeRef, _nofs: NodeOfs) -> BlockAddr {
        0
    }
    fn probe_page_cache(&self, _inode: &dyn InodeRef, _bidx: BlockAddr) -> CacheState {
        CacheState::NotCached
    }
    fn allocate_data_block(&self, _old_addr: BlockAddr, _set_cold: bool) -> Result<BlockAddr> {
        Ok(self.next_addr.fetch_add(1, Ordering::Relaxed))
    }
    fn update_dnode_addr(&self, _inode: &dyn InodeRef, _ofs_in_node: Ofs, _new_addr: BlockAddr) -> Result<()> {
        Ok(())
    }
    fn update_extent_cache(&self, _inode: &dyn InodeRef, _bidx: BlockAddr, _new_addr: BlockAddr) {}
    fn wait_on_block_writeback(&self, _addr: BlockAddr) {}
    fn submit_page_bio(&self, _addr: BlockAddr) -> Result<()> {
        Ok(())
    }
    fn submit_page_mbio(&self, _addr: BlockAddr) -> Result<()> {
        Ok(())
    }
    fn submit_merged_bio(&self) -> Result<()> {
        self.merged_bios.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
    fn read_ciphertext(&self, _addr: BlockAddr) -> Result<Box<dyn CipherPage>> {
        Ok(Box::new(FakeCipherPage))
    }
    fn submit_cipher_page(&self, _page: Box<dyn CipherPage>, _new_addr: BlockAddr) -> Result<()> {
        Ok(())
    }
}

impl SpaceObserver for FakeFilesystem {
    fn has_not_enough_free_secs(&self, sec_freed: usize) -> bool {
        (sec_freed as u64) < self.free_secs_needed.load(Ordering::Relaxed)
    }
    fn has_enough_invalid_blocks(&self) -> bool {
        true
    }
    fn is_idle(&self) -> bool {
        true
    }
    fn prefree_segments(&self) -> usize {
        0
    }
    fn free_segments(&self) -> usize {
        0
    }
    fn is_write_frozen(&self) -> bool {
        false
    }
    fn is_active(&self) -> bool {
        true
    }
    fn checkpoint_error(&self) -> bool {
        false
    }
}

impl CheckpointWriter for FakeFilesystem {
    fn write_checkpoint(&self) -> Result<()> {
        Ok(())
    }
    fn balance_fs_bg(&self) {}
}

impl Filesystem for FakeFilesystem {
    fn sit(&self) -> &dyn SitProvider {
        self
    }
    fn nat(&self) -> &dyn NatProvider {
        self
    }
    fn nodes(&self) -> &dyn NodeManager {
        self
    }
    fn inodes(&self) -> &dyn InodeManager {
        self
    }
    fn data(&self) -> &dyn DataManager {
        self
    }
    fn space(&self) -> &dyn SpaceObserver {
        self
    }
    fn checkpoint(&self) -> &dyn CheckpointWriter {
        self
    }
    fn segment_type(&self, segno: Segno) -> SegmentType {
        self.seg_types
            .lock()
            .unwrap()
            .get(&segno)
            .copied()
            .unwrap_or(SegmentType::Data)
    }
}
