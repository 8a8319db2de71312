//! GC tuning knobs and filesystem geometry.
//!
//! Grounded on `layers/5-disk/config.rs`'s plain `Config` struct with a
//! `Default` impl; no external config-file crate is introduced, matching
//! the rest of this storage stack.

use crate::types::GcIdle;
use std::time::Duration;

/// Fixed-size blocks per segment (`B` in §3). `512` is the typical value
/// spec.md's worked examples assume.
pub const DEFAULT_BLOCKS_PER_SEG: usize = 512;

/// `gc_th` fields (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcThresholds {
    pub min_sleep_time: Duration,
    pub max_sleep_time: Duration,
    pub no_gc_sleep_time: Duration,
    pub gc_idle: GcIdle,
}

impl Default for GcThresholds {
    fn default() -> Self {
        Self {
            min_sleep_time: Duration::from_millis(30_000),
            max_sleep_time: Duration::from_millis(60_000),
            no_gc_sleep_time: Duration::from_millis(300_000),
            gc_idle: GcIdle::Disabled,
        }
    }
}

/// Filesystem geometry relevant to GC: segment/section sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub blocks_per_seg: usize,
    pub segs_per_sec: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            blocks_per_seg: DEFAULT_BLOCKS_PER_SEG,
            segs_per_sec: 1,
        }
    }
}

/// Top-level GC configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub geometry: Geometry,
    pub gc_th: GcThresholds,
    /// `sbi.max_victim_search`: bounds a single selector call's scan length.
    pub max_victim_search: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            gc_th: GcThresholds::default(),
            max_victim_search: 4096,
        }
    }
}
