//! Pacing worker (C6, §4.1): the background thread that decides how long
//! to sleep between GC attempts and adapts that interval to observed free
//! space and idleness.
//!
//! Grounded on `GcWorker::run`/`is_active` in the teacher's
//! `layers/5-disk/gc.rs`: an active/inactive interval pair, a condvar the
//! worker can be woken from early, and a non-blocking attempt to take the
//! GC lock so a concurrent foreground caller is never starved.

use std::time::Duration;

use crate::collab::Filesystem;
use crate::config::GcThresholds;
use crate::error::Errno;
use crate::orchestrator::{f2fs_gc, GcState};
use crate::os::{Arc, Condvar, CvarMutex};
use crate::types::{GcIdle, GcMode};

/// Shared stop/wake signal for the pacing worker, handed to both the
/// worker loop and whoever wants to shut it down or nudge it early.
pub struct PacerHandle {
    stop: CvarMutex<bool>,
    cvar: Condvar,
}

impl PacerHandle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stop: CvarMutex::new(false),
            cvar: Condvar::new(),
        })
    }

    pub fn stop(&self) {
        *self.stop.lock().unwrap() = true;
        self.cvar.notify_all();
    }

    fn is_stopped(&self) -> bool {
        *self.stop.lock().unwrap()
    }

    /// Sleep for `d`, waking early if [`stop`](Self::stop) is called.
    fn sleep_or_stop(&self, d: Duration) {
        let guard = self.stop.lock().unwrap();
        if *guard {
            return;
        }
        let _ = self.cvar.wait_timeout(guard, d).unwrap();
    }
}

/// Resolve which cost model a pacing tick should use (§4.2's `gc_idle`
/// override table plus the ordinary idle/active default).
fn resolve_mode(th: &GcThresholds, fs: &dyn Filesystem) -> GcMode {
    match th.gc_idle {
        GcIdle::ForceGreedy => GcMode::Greedy,
        GcIdle::ForceCostBenefit => GcMode::CostBenefit,
        GcIdle::Disabled => {
            if fs.space().is_idle() {
                GcMode::Greedy
            } else {
                GcMode::CostBenefit
            }
        }
    }
}

/// Widen the sleep interval, clamped to `max_sleep_time` (§4.1 steps 2/4/5).
fn increase(current: Duration, th: &GcThresholds) -> Duration {
    (current * 2).clamp(th.min_sleep_time, th.max_sleep_time)
}

/// Narrow the sleep interval, clamped to `min_sleep_time` (§4.1 step 5).
fn decrease(current: Duration, th: &GcThresholds) -> Duration {
    (current / 2).clamp(th.min_sleep_time, th.max_sleep_time)
}

/// Run one pacing tick (§4.1's numbered steps 2-7; step 1, "stop requested",
/// is the caller's `while !handle.is_stopped()`, and step 3's non-blocking
/// lock acquisition is the caller's `try_lock`, since both live outside
/// anything a single tick can see once it already holds the state).
///
/// `state` is `None` when the non-blocking lock in [`run`] failed to
/// acquire: a foreground caller currently holds it, so this tick does
/// nothing but is still subject to the write-freeze check, and leaves
/// `wait_ms` untouched either way (step 3: "continue without touching
/// `wait_ms`").
fn tick(fs: &dyn Filesystem, state: Option<&mut GcState>, th: &GcThresholds, wait_ms: Duration) -> Duration {
    if fs.space().is_write_frozen() {
        return increase(wait_ms, th);
    }

    let Some(state) = state else {
        return wait_ms;
    };

    if !fs.space().is_idle() {
        return increase(wait_ms, th);
    }

    let mut next = if fs.space().has_enough_invalid_blocks() {
        decrease(wait_ms, th)
    } else {
        increase(wait_ms, th)
    };

    let mode = resolve_mode(th, fs);
    match f2fs_gc(fs, state, false, mode) {
        Ok(_) => {}
        Err(e) if e.errno() == Errno::NoVictim => next = th.no_gc_sleep_time,
        Err(e) => log::debug!("background gc tick failed: {e:?}"),
    }

    fs.checkpoint().balance_fs_bg();
    next
}

/// Drive the pacing loop until [`PacerHandle::stop`] is called.
///
/// Takes the GC lock non-blockingly each iteration (`try_lock`): if a
/// foreground caller currently holds it, this tick is skipped rather than
/// queuing behind it, matching the "never starve a synchronous caller"
/// contract in §4.1.
pub fn run(fs: &dyn Filesystem, gc_lock: &CvarMutex<GcState>, th: GcThresholds, handle: Arc<PacerHandle>) {
    let mut interval = th.min_sleep_time;
    while !handle.is_stopped() {
        interval = match gc_lock.try_lock() {
            Ok(mut state) => tick(fs, Some(&mut state), &th, interval),
            Err(_) => tick(fs, None, &th, interval),
        };
        handle.sleep_or_stop(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{
        CheckpointWriter, DataManager, InodeManager, NatProvider, NodeManager, SitProvider,
        SpaceObserver, SummaryBlock,
    };
    use crate::error::Result;
    use crate::types::{NatEntry, Nid, Segno, SegmentType};

    #[test]
    fn interval_grows_and_shrinks_within_bounds() {
        let th = GcThresholds::default();
        let grown = increase(th.min_sleep_time, &th);
        assert!(grown > th.min_sleep_time);
        assert!(grown <= th.max_sleep_time);

        let shrunk = decrease(th.max_sleep_time, &th);
        assert!(shrunk < th.max_sleep_time);
        assert!(shrunk >= th.min_sleep_time);
    }

    #[test]
    fn interval_never_exceeds_max_sleep() {
        let th = GcThresholds::default();
        assert_eq!(increase(th.max_sleep_time, &th), th.max_sleep_time);
    }

    #[test]
    fn interval_never_drops_below_min_sleep() {
        let th = GcThresholds::default();
        assert_eq!(decrease(th.min_sleep_time, &th), th.min_sleep_time);
    }

    /// Bare-minimum fake fs for exercising `tick`'s step gating; GC itself
    /// is never reached in the write-freeze/busy-I/O cases, so most
    /// collaborators can stay `unimplemented!()`.
    struct FakeFs {
        write_frozen: bool,
        idle: bool,
        invalid_pressure: bool,
        balanced: std::sync::atomic::AtomicUsize,
    }
    impl SitProvider for FakeFs {
        fn total_segs(&self) -> usize {
            0
        }
        fn segs_per_sec(&self) -> usize {
            1
        }
        fn blocks_per_seg(&self) -> usize {
            512
        }
        fn get_seg_entry(&self, _segno: Segno) -> crate::types::SegEntry {
            unimplemented!()
        }
        fn check_valid_map(&self, _segno: Segno, _off: crate::types::Ofs) -> bool {
            true
        }
        fn dirty_segnos(&self, _kind: crate::types::SegmentKind) -> Vec<Segno> {
            Vec::new()
        }
        fn sec_usage_check(&self, _secno: crate::types::Secno) -> bool {
            false
        }
    }
    impl NatProvider for FakeFs {
        fn get_node_info(&self, _nid: Nid) -> Result<NatEntry> {
            unimplemented!()
        }
    }
    impl NodeManager for FakeFs {
        fn get_sum_page(&self, _segno: Segno) -> Result<SummaryBlock> {
            unimplemented!()
        }
        fn ra_sum_page(&self, _segno: Segno) {}
        fn ra_node_page(&self, _nid: Nid) {}
        fn get_node_page(&self, _nid: Nid) -> Result<Box<dyn crate::collab::NodePage>> {
            unimplemented!()
        }
        fn put_node_page(&self, _page: Box<dyn crate::collab::NodePage>) {}
        fn datablock_addr(&self, _page: &dyn crate::collab::NodePage, _ofs_in_node: crate::types::Ofs) -> crate::types::BlockAddr {
            0
        }
        fn ofs_of_node(&self, _page: &dyn crate::collab::NodePage) -> crate::types::NodeOfs {
            0
        }
        fn is_writeback(&self, _page: &dyn crate::collab::NodePage) -> bool {
            false
        }
        fn wait_on_page_writeback(&self, _page: &dyn crate::collab::NodePage) {}
        fn mark_dirty(&self, _page: &dyn crate::collab::NodePage) {}
        fn sync_node_pages(&self) -> Result<()> {
            Ok(())
        }
    }
    impl InodeManager for FakeFs {
        fn iget(&self, _ino: crate::types::Ino) -> Result<Box<dyn crate::collab::InodeRef>> {
            unimplemented!()
        }
        fn put_inode(&self, _inode: Box<dyn crate::collab::InodeRef>) {}
        fn get_inode_page(&self, _ino: crate::types::Ino) -> Result<Box<dyn crate::collab::NodePage>> {
            unimplemented!()
        }
        fn ra_inode_page(&self, _ino: crate::types::Ino) {}
    }
    impl DataManager for FakeFs {
        fn start_bidx(&self, _inode: &dyn crate::collab::InodeRef, _nofs: crate::types::NodeOfs) -> crate::types::BlockAddr {
            0
        }
        fn probe_page_cache(&self, _inode: &dyn crate::collab::InodeRef, _bidx: crate::types::BlockAddr) -> crate::types::CacheState {
            crate::types::CacheState::NotCached
        }
        fn allocate_data_block(&self, _old_addr: crate::types::BlockAddr, _set_cold: bool) -> Result<crate::types::BlockAddr> {
            unimplemented!()
        }
        fn update_dnode_addr(&self, _inode: &dyn crate::collab::InodeRef, _ofs_in_node: crate::types::Ofs, _new_addr: crate::types::BlockAddr) -> Result<()> {
            Ok(())
        }
        fn update_extent_cache(&self, _inode: &dyn crate::collab::InodeRef, _bidx: crate::types::BlockAddr, _new_addr: crate::types::BlockAddr) {}
        fn wait_on_block_writeback(&self, _addr: crate::types::BlockAddr) {}
        fn submit_page_bio(&self, _addr: crate::types::BlockAddr) -> Result<()> {
            Ok(())
        }
        fn submit_page_mbio(&self, _addr: crate::types::BlockAddr) -> Result<()> {
            Ok(())
        }
        fn submit_merged_bio(&self) -> Result<()> {
            Ok(())
        }
        fn read_ciphertext(&self, _addr: crate::types::BlockAddr) -> Result<Box<dyn crate::collab::CipherPage>> {
            unimplemented!()
        }
        fn submit_cipher_page(&self, _page: Box<dyn crate::collab::CipherPage>, _new_addr: crate::types::BlockAddr) -> Result<()> {
            Ok(())
        }
    }
    impl SpaceObserver for FakeFs {
        fn has_not_enough_free_secs(&self, _sec_freed: usize) -> bool {
            false
        }
        fn has_enough_invalid_blocks(&self) -> bool {
            self.invalid_pressure
        }
        fn is_idle(&self) -> bool {
            self.idle
        }
        fn prefree_segments(&self) -> usize {
            0
        }
        fn free_segments(&self) -> usize {
            0
        }
        fn is_write_frozen(&self) -> bool {
            self.write_frozen
        }
        fn is_active(&self) -> bool {
            true
        }
        fn checkpoint_error(&self) -> bool {
            false
        }
    }
    impl CheckpointWriter for FakeFs {
        fn write_checkpoint(&self) -> Result<()> {
            Ok(())
        }
        fn balance_fs_bg(&self) {
            self.balanced.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    }
    impl Filesystem for FakeFs {
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
        fn segment_type(&self, _segno: Segno) -> SegmentType {
            SegmentType::Data
        }
    }

    fn fake(write_frozen: bool, idle: bool, invalid_pressure: bool) -> FakeFs {
        FakeFs {
            write_frozen,
            idle,
            invalid_pressure,
            balanced: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    #[test]
    fn write_freeze_increases_without_touching_the_lock() {
        let fs = fake(true, true, true);
        let th = GcThresholds::default();
        let next = tick(&fs, None, &th, th.min_sleep_time);
        assert!(next > th.min_sleep_time);
        assert_eq!(fs.balanced.load(std::sync::atomic::Ordering::Relaxed), 0);
    }

    #[test]
    fn failed_lock_acquisition_leaves_interval_untouched() {
        let fs = fake(false, true, true);
        let th = GcThresholds::default();
        let next = tick(&fs, None, &th, th.min_sleep_time);
        assert_eq!(next, th.min_sleep_time);
    }

    #[test]
    fn busy_io_increases_and_skips_gc() {
        let fs = fake(false, false, true);
        let th = GcThresholds::default();
        let mut state = GcState::new(1);
        let next = tick(&fs, Some(&mut state), &th, th.min_sleep_time);
        assert!(next > th.min_sleep_time);
        assert_eq!(fs.balanced.load(std::sync::atomic::Ordering::Relaxed), 0);
    }

    #[test]
    fn idle_no_victim_falls_back_to_no_gc_sleep_and_still_balances() {
        let fs = fake(false, true, true);
        let th = GcThresholds::default();
        let mut state = GcState::new(1);
        let next = tick(&fs, Some(&mut state), &th, th.min_sleep_time);
        assert_eq!(next, th.no_gc_sleep_time);
        assert_eq!(fs.balanced.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
