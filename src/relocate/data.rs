//! Data-segment relocation path (§4.5): a four-phase walk over the
//! victim's summary block that pins owning inodes, classifies each live
//! block's migration strategy, migrates it, then releases every pin and
//! (in the foreground) waits for the batched I/O to land.
//!
//! Grounded on `clean_and_migrate_data`/`find_target_hbas` in the teacher's
//! `layers/5-disk/gc.rs`, generalized from its single in-place HBA swap
//! into the MOVE/REMAP/ENCRYPTED classification and inode-pin discipline
//! §4.5 describes.

use crate::collab::Filesystem;
use crate::error::Result;
use crate::inode_list::GcInodeList;
use crate::liveness::is_alive;
use crate::relocate::{should_continue, RelocStats};
use crate::types::{BlockAddr, CacheState, GcType, RelocClass, Segno};

/// Decide how a single data block should be migrated (§4.5 classification
/// table): an encrypted regular file always goes through the ciphertext
/// path regardless of cache state, a block already dirty in the page cache
/// rides the ordinary writeback path, and anything else is remapped
/// directly through a block-to-block copy.
pub fn classify(is_encrypted_regular: bool, cache_state: CacheState) -> RelocClass {
    if is_encrypted_regular {
        return RelocClass::Encrypted;
    }
    match cache_state {
        CacheState::CachedDirty => RelocClass::Move,
        CacheState::CachedClean | CacheState::NotCached => RelocClass::Remap,
    }
}

/// Relocate every live data block in `segno`'s summary block (§4.5).
pub fn relocate_data_segment(
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
    let mut inodes = GcInodeList::new();

    // Phase 1: best-effort readahead of the owning node (dnode) pages.
    for entry in &summary {
        fs.nodes().ra_node_page(entry.nid);
    }

    let expected_addr_base: BlockAddr = segno as BlockAddr * fs.sit().blocks_per_seg() as BlockAddr;

    // Phase 2 + 3: per block, revalidate, classify, migrate.
    for (ofs, entry) in summary.iter().enumerate() {
        let threshold_cleared = !fs.space().has_not_enough_free_secs(sections_freed_so_far);
        if !should_continue(gc_type, threshold_cleared) {
            break;
        }

        let expected_addr = expected_addr_base + ofs as BlockAddr;
        let (alive, dnode_info) = is_alive(fs, entry.nid, entry.version, entry.ofs_in_node as usize, expected_addr)?;
        if !alive {
            continue;
        }
        let dnode_info = dnode_info.expect("is_alive returned true without dnode info");
        stats.blocks_live += 1;

        let dnode = match fs.nodes().get_node_page(entry.nid) {
            Ok(page) => page,
            Err(_) => continue,
        };

        if inodes.pin(fs.inodes(), dnode_info.ino).is_err() {
            fs.nodes().put_node_page(dnode);
            continue;
        }
        // `pin` already fetched this handle (once per distinct ino, even
        // across blocks); reuse it rather than `iget`-ing it again.
        let inode = inodes
            .get(dnode_info.ino)
            .expect("pin just inserted this ino");

        let bidx = fs.data().start_bidx(inode, dnode_info.nofs);
        let cache_state = fs.data().probe_page_cache(inode, bidx);
        let class = classify(inode.is_encrypted_regular(), cache_state);

        let migrated = match class {
            RelocClass::Encrypted => {
                let cipher = fs.data().read_ciphertext(expected_addr)?;
                let new_addr = fs.data().allocate_data_block(expected_addr, true)?;
                fs.data().submit_cipher_page(cipher, new_addr)?;
                fs.data()
                    .update_dnode_addr(inode, entry.ofs_in_node as usize, new_addr)?;
                true
            }
            RelocClass::Move => {
                fs.data().wait_on_block_writeback(expected_addr);
                let new_addr = fs.data().allocate_data_block(expected_addr, false)?;
                fs.data().submit_page_mbio(expected_addr)?;
                fs.data()
                    .update_dnode_addr(inode, entry.ofs_in_node as usize, new_addr)?;
                fs.data().update_extent_cache(inode, bidx, new_addr);
                true
            }
            RelocClass::Remap => {
                let new_addr = fs.data().allocate_data_block(expected_addr, false)?;
                fs.data().submit_page_bio(expected_addr)?;
                fs.data()
                    .update_dnode_addr(inode, entry.ofs_in_node as usize, new_addr)?;
                fs.data().update_extent_cache(inode, bidx, new_addr);
                true
            }
        };

        fs.nodes().put_node_page(dnode);
        if migrated {
            stats.blocks_migrated += 1;
        }
    }

    // Phase 4: completion. Foreground callers need the batched bio to have
    // actually landed before the section is considered free; background
    // callers rely on the ordinary writeback schedule.
    if gc_type.is_foreground() {
        fs.data().submit_merged_bio()?;
        stats.segment_freed = stats.blocks_live == stats.blocks_migrated;
    }
    inodes.release_all(fs.inodes());

    Ok(stats)
}
