//! Victim selection, relocation, and pacing for a log-structured flash
//! filesystem's garbage collector.
//!
//! This crate implements the GC core only: liveness checking, cost
//! models, victim selection, node/data relocation, the orchestrator, and
//! the pacing worker. The on-disk format, the node address table, the
//! segment information table, the page cache, block I/O, and checkpoint
//! writing are all consumed through the traits in [`collab`].

pub mod bitset;
pub mod collab;
pub mod config;
pub mod cost;
pub mod error;
pub mod gc_manager;
pub mod inode_list;
pub mod liveness;
pub mod orchestrator;
pub mod os;
pub mod pacer;
pub mod relocate;
pub mod stats;
pub mod types;
pub mod victim;

use types::{NodeOfs, ADDRS_PER_INODE, NIDS_PER_BLOCK};

/// Map a node offset within an inode's node tree to the logical block
/// index its data covers (§6 "Provided" interface): direct data in the
/// inode itself, then two direct-node children, then the (double-)indirect
/// subtrees. Each indirect node's own nid occupies one offset in the
/// sequence without covering a data block itself, which is why the
/// single/double-indirect branches subtract a `floor` term rather than a
/// flat per-subtree constant — it's what skips over those metadata-node
/// offsets as `node_ofs` increases.
///
/// This is a pure function of the geometry constants in [`types`]; it has
/// no dependency on any collaborator trait. Caller must pass only
/// direct-node offsets (never an indirect node's own offset).
pub fn start_bidx_of_node(node_ofs: NodeOfs) -> NodeOfs {
    if node_ofs == 0 {
        return 0;
    }
    if node_ofs <= 2 {
        return ADDRS_PER_INODE + (node_ofs - 1) * types::ADDRS_PER_BLOCK;
    }

    let n = node_ofs as i64;
    let span = NIDS_PER_BLOCK as i64 + 1;

    let bidx = if node_ofs <= 2 * NIDS_PER_BLOCK + 4 {
        n - 2 - (n - 4).div_euclid(span)
    } else {
        let indirect = types::indirect_blks() as i64;
        n - 5 - (n - indirect - 3).div_euclid(span)
    };

    ADDRS_PER_INODE + (bidx as usize) * types::ADDRS_PER_BLOCK
}
