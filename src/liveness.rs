//! Liveness oracle (C1, §4.3): is the block a given summary entry
//! describes still the live copy of whatever node or data it points at?
//!
//! Grounded on the two-stage validity check the teacher's `gc.rs` runs
//! before migrating a block: a cheap bitmap read, then a revalidation
//! against the authoritative owner once the page is actually in hand.

use crate::collab::Filesystem;
use crate::error::Result;
use crate::types::{BlockAddr, DnodeInfo, Nid, Ofs, Segno, Version};

/// Cheap pre-filter (§4.3): consult the SIT bitmap for `(segno, off)` under
/// the SIT's own lock. A `false` here is conclusive; a `true` only means
/// "was valid a moment ago" and must be revalidated once a lock that
/// actually serializes against invalidation is held.
pub fn is_bitmap_valid(fs: &dyn Filesystem, segno: Segno, off: Ofs) -> bool {
    fs.sit().check_valid_map(segno, off)
}

/// Node-path liveness (§4.4 pass 2 step 4): a node at `nid` is still the
/// live occupant of `expected_addr` iff the NAT still points it there. No
/// version comparison is needed here, because the node being checked is
/// itself the thing being relocated, not something a dnode points at.
pub fn is_node_alive(fs: &dyn Filesystem, nid: Nid, expected_addr: BlockAddr) -> Result<bool> {
    let entry = fs.nat().get_node_info(nid)?;
    Ok(entry.blk_addr == expected_addr)
}

/// Data-path liveness oracle (§4.3): `is_alive(summary_entry, blkaddr)`.
///
/// Walks from a summary entry's `nid` down to the dnode that owns the
/// data block, and checks two independent ways the block could have gone
/// stale since the summary was read: the summary's recorded node version
/// no longer matching the node's current version (a stale summary), or
/// the dnode's pointer for `ofs_in_node` no longer pointing at `blkaddr`
/// (the dnode was rewritten to point elsewhere). Returns the owning
/// inode/node-offset pair on success so the data relocator can resolve
/// `start_bidx` without a second NAT round trip.
pub fn is_alive(
    fs: &dyn Filesystem,
    nid: Nid,
    summary_version: Version,
    ofs_in_node: Ofs,
    blkaddr: BlockAddr,
) -> Result<(bool, Option<DnodeInfo>)> {
    let node_page = match fs.nodes().get_node_page(nid) {
        Ok(page) => page,
        Err(_) => return Ok((false, None)),
    };

    let nat_entry = fs.nat().get_node_info(nid)?;

    if summary_version != nat_entry.version {
        fs.nodes().put_node_page(node_page);
        return Ok((false, None));
    }

    let source = fs.nodes().datablock_addr(&*node_page, ofs_in_node);
    if source != blkaddr {
        fs.nodes().put_node_page(node_page);
        return Ok((false, None));
    }

    let nofs = fs.nodes().ofs_of_node(&*node_page);
    fs.nodes().put_node_page(node_page);
    Ok((
        true,
        Some(DnodeInfo {
            ino: nat_entry.ino,
            nofs,
        }),
    ))
}
