//! Process-wide GC counters, exposed for diagnostics.
//!
//! Grounded on `CostStats`/`WafStats` in the teacher's
//! `layers/5-disk/cost_stats.rs` and `waf_stats.rs`: a `lazy_static!`
//! global of plain atomic counters with a `print()` helper, rather than a
//! metrics-crate integration.

use std::sync::atomic::{AtomicU64, Ordering};

use lazy_static::lazy_static;

/// Counters for one GC run, aggregated across the process's lifetime.
pub struct GcStats {
    pub fg_calls: AtomicU64,
    pub bg_calls: AtomicU64,
    pub sections_reclaimed: AtomicU64,
    pub blocks_migrated: AtomicU64,
    pub no_victim_count: AtomicU64,
}

impl GcStats {
    const fn new() -> Self {
        Self {
            fg_calls: AtomicU64::new(0),
            bg_calls: AtomicU64::new(0),
            sections_reclaimed: AtomicU64::new(0),
            blocks_migrated: AtomicU64::new(0),
            no_victim_count: AtomicU64::new(0),
        }
    }

    pub fn record_run(&self, sync: bool, sections_reclaimed: u64, blocks_migrated: u64) {
        if sync {
            self.fg_calls.fetch_add(1, Ordering::Relaxed);
        } else {
            self.bg_calls.fetch_add(1, Ordering::Relaxed);
        }
        self.sections_reclaimed
            .fetch_add(sections_reclaimed, Ordering::Relaxed);
        self.blocks_migrated.fetch_add(blocks_migrated, Ordering::Relaxed);
    }

    pub fn record_no_victim(&self) {
        self.no_victim_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn print(&self) {
        log::info!(
            "gc stats: fg_calls={} bg_calls={} sections_reclaimed={} blocks_migrated={} no_victim={}",
            self.fg_calls.load(Ordering::Relaxed),
            self.bg_calls.load(Ordering::Relaxed),
            self.sections_reclaimed.load(Ordering::Relaxed),
            self.blocks_migrated.load(Ordering::Relaxed),
            self.no_victim_count.load(Ordering::Relaxed),
        );
    }
}

lazy_static! {
    pub static ref GC_STATS: GcStats = GcStats::new();
}
