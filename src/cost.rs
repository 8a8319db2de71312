//! Cost functions for victim selection (C2, §4.2).

use crate::collab::SitProvider;
use crate::types::{Secno, Segno};

/// Greedy cost of a single segment: its current valid-block count.
pub fn greedy_segment_cost(sit: &dyn SitProvider, segno: Segno) -> usize {
    sit.get_valid_blocks(segno)
}

/// Greedy cost of a section under LFS: valid blocks summed across its
/// `segs_per_sec` segments. Max cost is `blocks_per_seg * segs_per_sec`.
pub fn greedy_section_cost(sit: &dyn SitProvider, secno: Secno) -> usize {
    let segs_per_sec = sit.segs_per_sec();
    let base = secno * segs_per_sec;
    (base..base + segs_per_sec)
        .map(|segno| sit.get_valid_blocks(segno))
        .sum()
}

/// Max greedy cost for a section, used by the victim scan's
/// cost-equals-max skip rule (§4.2, §9).
pub fn max_greedy_cost(sit: &dyn SitProvider) -> usize {
    sit.blocks_per_seg() * sit.segs_per_sec()
}

/// SSR cost of a single segment: its checkpointed valid-block count.
/// Max cost is `blocks_per_seg`.
pub fn ssr_segment_cost(sit: &dyn SitProvider, segno: Segno) -> usize {
    sit.get_seg_entry(segno).ckpt_valid_blocks
}

pub fn max_ssr_cost(sit: &dyn SitProvider) -> usize {
    sit.blocks_per_seg()
}

/// Adaptive mtime range used by the cost-benefit model (§4.2): extended
/// whenever an observed mtime falls outside the current bounds.
#[derive(Debug, Clone, Copy)]
pub struct MtimeRange {
    pub min: u64,
    pub max: u64,
}

impl MtimeRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Extend the range to include `mtime`, if needed.
    pub fn observe(&mut self, mtime: u64) {
        if mtime < self.min {
            self.min = mtime;
        }
        if mtime > self.max {
            self.max = mtime;
        }
    }
}

/// Cost-benefit cost of one section (§4.2). Lower cost wins.
///
/// `cost = UINT_MAX - (100 * (100 - u) * age) / (100 + u)`, where `u` is
/// percentage utilization and `age` is a percentage derived from how old
/// the section's average mtime is relative to the adaptive mtime range.
pub fn cost_benefit_cost(sit: &dyn SitProvider, secno: Secno, mtime_range: &mut MtimeRange) -> u32 {
    let segs_per_sec = sit.segs_per_sec();
    let blocks_per_seg = sit.blocks_per_seg();
    let base = secno * segs_per_sec;

    let mut mtime_sum: u128 = 0;
    let mut valid_sum: u128 = 0;
    for segno in base..base + segs_per_sec {
        let entry = sit.get_seg_entry(segno);
        mtime_sum += entry.mtime as u128;
        valid_sum += entry.valid_blocks as u128;
        mtime_range.observe(entry.mtime);
    }
    let n = segs_per_sec as u128;
    let mtime_avg = (mtime_sum / n) as u64;
    let valid_blocks_avg = (valid_sum / n) as u64;

    let u = (valid_blocks_avg as u128 * 100) / blocks_per_seg as u128;

    let age = if mtime_range.max > mtime_range.min {
        let span = (mtime_range.max - mtime_range.min) as u128;
        let elapsed = (mtime_avg.saturating_sub(mtime_range.min)) as u128;
        100u128.saturating_sub((100 * elapsed) / span)
    } else {
        0
    };

    let cost = (100 * (100 - u) * age) / (100 + u);
    (u32::MAX as u128 - cost.min(u32::MAX as u128)) as u32
}
