//! Victim selector (C3, §4.2): scans the dirty segment map for the section
//! with the lowest cost, subject to a scan-length bound and an exclusion
//! set of sections already in flight.
//!
//! Grounded on the teacher's `GreedyVictimPolicy`/`LoopScanVictimPolicy` in
//! `layers/5-disk/gc.rs`: a cursor (`last_victim`) that resumes scanning
//! where the previous call left off, wrapping once around the segment
//! space, combined with a threshold/skip rule.

use crate::bitset::BitSet;
use crate::collab::SitProvider;
use crate::cost::{
    cost_benefit_cost, greedy_section_cost, max_greedy_cost, max_ssr_cost, ssr_segment_cost,
    MtimeRange,
};
use crate::types::{AllocMode, GcMode, Secno, SegmentKind};

/// Per-mode scan cursor, one entry per [`GcMode`] (§3: `last_victim[2]`).
#[derive(Debug, Clone, Copy, Default)]
pub struct VictimCursors {
    greedy: Secno,
    cost_benefit: Secno,
}

impl VictimCursors {
    pub fn get(&self, mode: GcMode) -> Secno {
        match mode {
            GcMode::Greedy => self.greedy,
            GcMode::CostBenefit => self.cost_benefit,
        }
    }

    fn set(&mut self, mode: GcMode, secno: Secno) {
        match mode {
            GcMode::Greedy => self.greedy = secno,
            GcMode::CostBenefit => self.cost_benefit = secno,
        }
    }
}

/// A selected victim unit: a section number under `AllocMode::Lfs`, or a
/// bare segment number under `AllocMode::Ssr`. The orchestrator recomputes
/// the exact set of live blocks during relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Victim {
    pub secno: Secno,
}

/// Fast path (§4.2, "LFS + FG only"): drain a section background GC has
/// already vetted and parked in `victim_secmap`, instead of rescanning
/// `dirty_segmap` from scratch. Scans bits low to high; the first section
/// whose usage check still passes is consumed (bit cleared) and returned.
/// A set bit that no longer passes the usage check is left alone — still
/// reserved, just not ready this call.
pub fn drain_secmap_fast_path(sit: &dyn SitProvider, victim_secmap: &mut BitSet) -> Option<Victim> {
    let secno = victim_secmap.iter_ones().find(|&secno| !sit.sec_usage_check(secno))?;
    victim_secmap.set(secno, false);
    Some(Victim { secno })
}

/// Select a victim (§4.2).
///
/// `alloc_mode` picks both the candidate pool and its unit: `Lfs` groups
/// dirty segments into whole sections and costs each section as a unit;
/// `Ssr` operates on individual segments with no section alignment, since
/// SSR writes back into a single segment's free slots rather than
/// allocating a fresh section. `max_search` bounds how many candidates are
/// examined before giving up, matching `sbi.max_victim_search`. `exclude`
/// marks units already pinned by an in-flight GC call (`victim_secmap`);
/// these are skipped even if otherwise optimal.
pub fn select_victim(
    sit: &dyn SitProvider,
    cursors: &mut VictimCursors,
    mode: GcMode,
    alloc_mode: AllocMode,
    kind: SegmentKind,
    max_search: usize,
    exclude: &BitSet,
    mtime_range: &mut MtimeRange,
) -> Option<Victim> {
    let segs_per_sec = sit.segs_per_sec().max(1);
    let total_units = match alloc_mode {
        AllocMode::Lfs => sit.total_segs() / segs_per_sec,
        AllocMode::Ssr => sit.total_segs(),
    };
    if total_units == 0 {
        return None;
    }

    let dirty = sit.dirty_segnos(kind);
    let mut candidates: Vec<Secno> = match alloc_mode {
        AllocMode::Lfs => dirty.into_iter().map(|segno| segno / segs_per_sec).collect(),
        AllocMode::Ssr => dirty,
    };
    candidates.sort_unstable();
    candidates.dedup();
    if candidates.is_empty() {
        return None;
    }

    let max_cost = match alloc_mode {
        AllocMode::Lfs => max_greedy_cost(sit),
        AllocMode::Ssr => max_ssr_cost(sit),
    };
    let start = cursors.get(mode);

    let mut best: Option<(Secno, u64)> = None;
    let mut searched = 0usize;
    let mut idx = match candidates.binary_search(&start) {
        Ok(i) => i,
        Err(i) => i % candidates.len(),
    };

    for _ in 0..candidates.len() {
        if searched >= max_search {
            break;
        }
        let unit = candidates[idx % candidates.len()];
        idx += 1;
        searched += 1;

        if sit.sec_usage_check(unit) || exclude.test(unit) {
            continue;
        }

        let cost = match (alloc_mode, mode) {
            (AllocMode::Ssr, _) => ssr_segment_cost(sit, unit) as u64,
            (AllocMode::Lfs, GcMode::Greedy) => greedy_section_cost(sit, unit) as u64,
            (AllocMode::Lfs, GcMode::CostBenefit) => {
                cost_benefit_cost(sit, unit, mtime_range) as u64
            }
        };

        // A unit at exactly the maximum cost holds nothing worth
        // reclaiming (every block still valid); never select it.
        if (mode == GcMode::Greedy || alloc_mode == AllocMode::Ssr) && cost as usize == max_cost {
            continue;
        }

        match best {
            // Strict less-than: the first candidate at a given cost wins
            // ties, matching the scan order rather than re-picking later.
            None => best = Some((unit, cost)),
            Some((_, best_cost)) if cost < best_cost => best = Some((unit, cost)),
            _ => {}
        }
    }

    match best {
        Some((unit, _)) => cursors.set(mode, (unit + 1) % total_units),
        // No hit: record where the scan stopped so the next call resumes
        // from there instead of rescanning the same exhausted prefix.
        None => cursors.set(mode, candidates[idx % candidates.len()]),
    }

    best.map(|(secno, _)| Victim { secno })
}

/// Enum-dispatched victim-selection policy (§9 Design Notes,
/// "Polymorphism"): each variant fixes a `(GcMode, AllocMode)` pair and
/// carries whatever per-policy state that pair needs, mirroring the
/// teacher's `VictimPolicy` trait with its `GreedyVictimPolicy`/
/// `LoopScanVictimPolicy` implementors while keeping selection itself a
/// single shared, well-tested function.
pub enum VictimPolicy {
    /// Whole-section greedy scan under LFS allocation.
    Greedy,
    /// Whole-section cost-benefit scan under LFS allocation; carries the
    /// adaptive mtime range the cost model needs across calls.
    CostBenefit(MtimeRange),
    /// Per-segment greedy scan for SSR allocation.
    Ssr,
}

impl VictimPolicy {
    pub fn select(
        &mut self,
        sit: &dyn SitProvider,
        cursors: &mut VictimCursors,
        kind: SegmentKind,
        max_search: usize,
        exclude: &BitSet,
    ) -> Option<Victim> {
        match self {
            VictimPolicy::Greedy => {
                let mut unused = MtimeRange::new(0, 0);
                select_victim(
                    sit,
                    cursors,
                    GcMode::Greedy,
                    AllocMode::Lfs,
                    kind,
                    max_search,
                    exclude,
                    &mut unused,
                )
            }
            VictimPolicy::CostBenefit(range) => select_victim(
                sit,
                cursors,
                GcMode::CostBenefit,
                AllocMode::Lfs,
                kind,
                max_search,
                exclude,
                range,
            ),
            VictimPolicy::Ssr => {
                let mut unused = MtimeRange::new(0, 0);
                select_victim(
                    sit,
                    cursors,
                    GcMode::Greedy,
                    AllocMode::Ssr,
                    kind,
                    max_search,
                    exclude,
                    &mut unused,
                )
            }
        }
    }
}
