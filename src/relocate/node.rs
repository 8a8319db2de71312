//! Node-segment relocation path (§4.4): a two-pass walk over the victim's
//! summary block — readahead every live candidate first, then lock and
//! migrate each one that is still live once the page is actually in hand.
//!
//! Grounded on the teacher's `remap_index_batch` in `layers/5-disk/gc.rs`,
//! generalized from its single in-place remap into the two-pass
//! readahead/migrate shape §4.4 calls for.

use crate::collab::Filesystem;
use crate::error::Result;
use crate::liveness::is_node_alive;
use crate::relocate::{should_continue, RelocStats};
use crate::types::{BlockAddr, GcType, Segno};

/// Relocate every live node in `segno`'s summary block (§4.4).
///
/// Pass 1 issues best-effort readahead for every candidate nid so pass 2's
/// `get_node_page` calls mostly hit warm pages. Pass 2 revalidates each nid
/// against the NAT (the summary block can be stale by the time the page
/// lock is held) and marks survivors dirty so the ordinary write-out path
/// assigns them a fresh block address.
///
/// In the foreground, blocks the caller until every dirtied node page has
/// actually been written out (`sync_node_pages`), so a synchronous
/// `f2fs_gc` caller sees the section freed before returning. In the
/// background, dirtying is enough — the segment frees once the existing
/// writeback path catches up on its own schedule.
pub fn relocate_node_segment(
    fs: &dyn Filesystem,
    segno: Segno,
    gc_type: GcType,
    sections_freed_so_far: usize,
) -> Result<RelocStats> {
    let summary = fs.nodes().get_sum_page(segno)?;
    let mut stats = RelocStats {
        blocks_scanned: summary.len(),
        ..Default::default()
    };

    // Pass 1: best-effort readahead, failures are not reported.
    for entry in &summary {
        fs.nodes().ra_node_page(entry.nid);
    }

    // Pass 2: lock, revalidate, migrate.
    let expected_addr_base: BlockAddr = segno as BlockAddr * fs.sit().blocks_per_seg() as BlockAddr;
    for (ofs, entry) in summary.iter().enumerate() {
        let threshold_cleared = !fs.space().has_not_enough_free_secs(sections_freed_so_far);
        if !should_continue(gc_type, threshold_cleared) {
            break;
        }

        let expected_addr = expected_addr_base + ofs as BlockAddr;
        if !is_node_alive(fs, entry.nid, expected_addr)? {
            continue;
        }
        stats.blocks_live += 1;

        let page = match fs.nodes().get_node_page(entry.nid) {
            Ok(page) => page,
            Err(_) => continue,
        };

        // Re-check under the page lock: the NAT could have moved on while
        // we were waiting on the readahead/get_node_page round trip.
        if !is_node_alive(fs, entry.nid, expected_addr)? {
            fs.nodes().put_node_page(page);
            continue;
        }

        if fs.nodes().is_writeback(&*page) {
            fs.nodes().wait_on_page_writeback(&*page);
        }
        fs.nodes().mark_dirty(&*page);
        fs.nodes().put_node_page(page);
        stats.blocks_migrated += 1;
    }

    if gc_type.is_foreground() {
        fs.nodes().sync_node_pages()?;
        // Every live block the scan found either migrated or didn't; if
        // all of them did, nothing valid is left in the segment.
        stats.segment_freed = stats.blocks_live == stats.blocks_migrated;
    }

    Ok(stats)
}
