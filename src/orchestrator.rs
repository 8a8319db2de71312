//! GC orchestrator (C5, §4.6): picks a victim, dispatches each segment of
//! its section to the matching relocation path, and decides whether to
//! keep going.
//!
//! Grounded on the `background_gc`/`trigger_gc` driver loop in the
//! teacher's `layers/5-disk/gc.rs`: a bounded iteration count for the
//! background path, and a synchronous single-victim call for the
//! foreground path that blocks the caller until the segment is freed.

use crate::bitset::BitSet;
use crate::collab::Filesystem;
use crate::cost::MtimeRange;
use crate::error::{Error, Errno, Result};
use crate::relocate::{data::relocate_data_segment, node::relocate_node_segment, RelocStats};
use crate::types::{GcMode, GcType, SegmentKind, SegmentType};
use crate::victim::{VictimCursors, VictimPolicy};

/// Background `do_garbage_collect` watermark: how many victim sections one
/// `f2fs_gc(false)` call will reclaim before yielding back to the pacer
/// (§4.6, mirrors the teacher's `GC_WATERMARK`).
pub const GC_WATERMARK: usize = 16;

/// Mutable state the orchestrator needs across calls: scan cursors, the
/// set of sections currently being relocated by another caller (§3:
/// `victim_secmap`), and the two LFS victim-selection policies (one per
/// cost model), each carrying whatever state that model needs across
/// calls.
pub struct GcState {
    pub cursors: VictimCursors,
    pub victim_secmap: BitSet,
    pub greedy_policy: VictimPolicy,
    pub cost_benefit_policy: VictimPolicy,
}

impl GcState {
    pub fn new(total_secs: usize) -> Self {
        Self {
            cursors: VictimCursors::default(),
            victim_secmap: BitSet::repeat(false, total_secs.max(1)),
            greedy_policy: VictimPolicy::Greedy,
            cost_benefit_policy: VictimPolicy::CostBenefit(MtimeRange::new(0, 0)),
        }
    }
}

/// Result of one `f2fs_gc` call (§4.6): how many sections were reclaimed
/// and the aggregate relocation stats.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcRunStats {
    pub sections_reclaimed: usize,
    pub reloc: RelocStats,
}

/// Reclaim exactly one victim section, end to end: select (foreground
/// drains `victim_secmap`'s fast path first, background parks its own
/// scan hit there), then relocate every one of the section's `S` segments
/// in turn, dispatching each by its own footer type (§4.6 `do_garbage_collect`
/// called once per segment, `for i in 0..S`).
///
/// For FG, a segment returning "not freed" aborts the rest of the section
/// immediately (§4.6: "bail early on partial failure") and the section as
/// a whole only counts as reclaimed once every one of its segments did.
/// BG always walks the whole section.
fn do_garbage_collect(
    fs: &dyn Filesystem,
    state: &mut GcState,
    mode: GcMode,
    gc_type: GcType,
    sections_freed_so_far: usize,
) -> Result<Option<(RelocStats, bool)>> {
    // §4.2 fast path (LFS + FG only): drain a section background GC already
    // vetted and parked in victim_secmap before falling back to a full scan.
    let fast_path_hit = if gc_type.is_foreground() {
        crate::victim::drain_secmap_fast_path(fs.sit(), &mut state.victim_secmap)
    } else {
        None
    };

    let victim = match fast_path_hit {
        Some(victim) => {
            log::debug!(
                "do_garbage_collect: fast-path victim secno={} from victim_secmap",
                victim.secno
            );
            Some(victim)
        }
        None => {
            let policy = match mode {
                GcMode::Greedy => &mut state.greedy_policy,
                GcMode::CostBenefit => &mut state.cost_benefit_policy,
            };
            let selected = policy.select(
                fs.sit(),
                &mut state.cursors,
                SegmentKind::Dirty,
                4096,
                &state.victim_secmap,
            );
            // Bookkeeping on hit (§4.2): BG parks the section in
            // victim_secmap for FG to drain later; FG's own scan hit needs
            // no bitmap write, the section is reclaimed right here.
            if let Some(victim) = selected {
                if !gc_type.is_foreground() {
                    state.victim_secmap.set(victim.secno, true);
                }
            }
            selected
        }
    };
    let Some(victim) = victim else {
        log::debug!("do_garbage_collect: no victim found for mode={mode:?}");
        return Ok(None);
    };
    log::debug!("do_garbage_collect: selected victim secno={} mode={mode:?}", victim.secno);

    let segs_per_sec = fs.sit().segs_per_sec().max(1);
    let base_segno = victim.secno * segs_per_sec;

    // §4.6: warm every segment's SSA block up front when the section spans
    // more than one segment, so the per-segment loop below mostly finds
    // its own get_sum_page call already cached.
    if segs_per_sec > 1 {
        for i in 0..segs_per_sec {
            fs.nodes().ra_sum_page(base_segno + i);
        }
    }

    let mut section_stats = RelocStats::default();
    let mut all_freed = true;
    for i in 0..segs_per_sec {
        let segno = base_segno + i;
        // §4.6 step 2: read the summary, dispatch, release — the unlock
        // discipline itself lives inside the relocators' own summary-page
        // round trip, so this layer only needs the footer-type dispatch.
        let result = match fs.segment_type(segno) {
            SegmentType::Node => relocate_node_segment(fs, segno, gc_type, sections_freed_so_far),
            SegmentType::Data => relocate_data_segment(fs, segno, gc_type, sections_freed_so_far),
        };
        let stats = result?;
        let freed = stats.segment_freed;
        section_stats.merge(stats);
        if !freed {
            all_freed = false;
            if gc_type.is_foreground() {
                break;
            }
        }
    }

    // A BG-selected section that didn't fully free stays parked in
    // victim_secmap for a later FG fast-path call to pick up; one that did
    // free has nothing left to hand off.
    if !gc_type.is_foreground() {
        state.victim_secmap.set(victim.secno, !all_freed);
    }
    Ok(Some((section_stats, all_freed)))
}

/// `f2fs_gc(sync)` (§4.6): repeatedly selects and reclaims victim sections.
/// A BG call that finds itself still short of free space escalates to FG
/// for that iteration and forces a checkpoint flush before retrying; a
/// synchronous caller reclaims at most one section and reports failure as
/// an error rather than blocking forever.
pub fn f2fs_gc(fs: &dyn Filesystem, state: &mut GcState, sync: bool, mode: GcMode) -> Result<GcRunStats> {
    let mut gc_type = if sync {
        GcType::Foreground
    } else {
        GcType::Background
    };

    let mut run = GcRunStats::default();
    let mut victim_found = false;

    loop {
        if fs.space().checkpoint_error() {
            return Err(Error::new(Errno::CheckpointError));
        }
        if !fs.space().is_active() {
            return Err(Error::new(Errno::FilesystemInactive));
        }

        if gc_type == GcType::Background && fs.space().has_not_enough_free_secs(run.sections_reclaimed) {
            gc_type = GcType::Foreground;
            let victim_exists = !fs.sit().dirty_segnos(SegmentKind::Dirty).is_empty();
            if victim_exists || fs.space().prefree_segments() > 0 {
                fs.checkpoint().write_checkpoint()?;
            }
        }

        match do_garbage_collect(fs, state, mode, gc_type, run.sections_reclaimed)? {
            Some((stats, all_freed)) => {
                victim_found = true;
                run.reloc.merge(stats);
                if !gc_type.is_foreground() || all_freed {
                    run.sections_reclaimed += 1;
                }
            }
            None => break,
        }

        if !sync {
            if fs.space().has_not_enough_free_secs(run.sections_reclaimed)
                && run.sections_reclaimed < GC_WATERMARK
            {
                continue;
            }
            if gc_type.is_foreground() {
                fs.checkpoint().write_checkpoint()?;
            }
        }
        break;
    }

    if sync {
        if run.sections_reclaimed > 0 {
            log::info!(
                "foreground gc succeeded, freed {} section(s), migrated {} blocks",
                run.sections_reclaimed,
                run.reloc.blocks_migrated
            );
            Ok(run)
        } else if victim_found {
            // Selection found a section and the relocators ran, but the
            // foreground bail-out left it not fully freed (§6/§7: distinct
            // from "no victim at all").
            Err(Error::new(Errno::Again))
        } else {
            Err(Error::new(Errno::NoVictim))
        }
    } else {
        log::info!(
            "background gc finished, freed {} section(s), migrated {} blocks",
            run.sections_reclaimed,
            run.reloc.blocks_migrated
        );
        Ok(run)
    }
}
