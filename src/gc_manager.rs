//! GC manager façade (§6): the handle application code holds onto. Owns
//! the GC lock, the scan cursors, and (optionally) the pacing thread.
//!
//! Grounded on how the teacher's `SwornDisk` wires up and owns a
//! `GcWorker<D>` in `layers/5-disk/sworndisk.rs`'s `create_gc_worker`: a
//! single long-lived handle constructed once from the filesystem's
//! collaborators and configuration, with explicit start/stop for the
//! background thread.

use std::thread::{self, JoinHandle};

use crate::collab::Filesystem;
use crate::config::Config;
use crate::error::Result;
use crate::orchestrator::{f2fs_gc as orchestrator_f2fs_gc, GcRunStats, GcState};
use crate::os::{Arc, CvarMutex};
use crate::pacer::{self, PacerHandle};
use crate::stats::GC_STATS;
use crate::types::GcMode;

struct PacerJoin {
    handle: Arc<PacerHandle>,
    thread: JoinHandle<()>,
}

/// Owns everything one filesystem instance's GC needs across its lifetime.
pub struct GcManager {
    fs: Arc<dyn Filesystem>,
    state: Arc<CvarMutex<GcState>>,
    config: Config,
    pacer: Option<PacerJoin>,
}

/// Construct a manager for `fs` using `config`'s geometry to size the
/// `victim_secmap` (§3).
pub fn build_gc_manager(fs: Arc<dyn Filesystem>, config: Config) -> GcManager {
    let total_secs = fs.sit().total_segs() / fs.sit().segs_per_sec().max(1);
    GcManager {
        fs,
        state: Arc::new(CvarMutex::new(GcState::new(total_secs))),
        config,
        pacer: None,
    }
}

impl GcManager {
    /// Run a single GC call synchronously on the calling thread (§4.6).
    /// `mode` picks the cost model explicitly; callers that want the
    /// pacer's adaptive idle/active resolution should go through
    /// [`pacer::tick`] instead.
    pub fn f2fs_gc(&self, sync: bool, mode: GcMode) -> Result<GcRunStats> {
        let mut state = self.state.lock().unwrap();
        let result = orchestrator_f2fs_gc(&*self.fs, &mut state, sync, mode);
        match &result {
            Ok(run) => GC_STATS.record_run(
                sync,
                run.sections_reclaimed as u64,
                run.reloc.blocks_migrated as u64,
            ),
            Err(_) => GC_STATS.record_no_victim(),
        }
        result
    }

    /// Start the background pacing thread (§4.1). No-op if already running.
    pub fn start_gc_thread(&mut self) {
        if self.pacer.is_some() {
            return;
        }
        let handle = PacerHandle::new();
        let fs = Arc::clone(&self.fs);
        let th = self.config.gc_th;
        let state = Arc::clone(&self.state);
        let thread_handle = Arc::clone(&handle);
        let join = thread::spawn(move || {
            pacer::run(&*fs, &state, th, thread_handle);
        });
        self.pacer = Some(PacerJoin {
            handle,
            thread: join,
        });
    }

    /// Stop the background pacing thread and join it. No-op if not running.
    pub fn stop_gc_thread(&mut self) {
        if let Some(pacer) = self.pacer.take() {
            pacer.handle.stop();
            let _ = pacer.thread.join();
        }
    }
}

impl Drop for GcManager {
    fn drop(&mut self) {
        self.stop_gc_thread();
    }
}
