//! Treap nodes.
//!
//! Nodes live in the tree's arena and link to each other by index. Child
//! links own their subtree; `parent` is a back reference used only for
//! walking towards the root during rotation, pixel propagation and
//! deletion.

use smallvec::SmallVec;

use crate::index::BlockId;
use crate::position::LogicalPosition;

/// Index into the node arena.
pub(crate) type Idx = u32;

/// Sentinel for no parent / no child.
pub(crate) const NONE: Idx = u32::MAX;

/// Priority of a node not yet placed in heap order. Also used to sink a
/// node to a leaf before unlinking it.
pub(crate) const UNSET: u32 = u32::MAX;
/// Transient priority that lifts the splice end node to the root.
pub(crate) const SPLICE_END: u32 = 0;
/// Transient priority that lifts the splice start node just below it.
pub(crate) const SPLICE_START: u32 = 1;
/// Smallest priority handed out by the random generator.
pub(crate) const FIRST_RANDOM: u32 = 2;

#[derive(Clone, Debug)]
pub(crate) struct Node<A> {
    pub parent: Idx,
    pub left: Idx,
    pub right: Idx,
    pub priority: u32,
    /// Creation order, breaks priority ties.
    pub serial: u64,
    /// Offset from the nearest left ancestor's absolute position, or from
    /// zero if the node has none.
    pub distance: LogicalPosition<A>,
    pub block_ids: SmallVec<[BlockId; 2]>,
    /// Sum of the heights in `block_ids`, already folded into
    /// `distance.pixels`.
    pub block_height: u64,
}

impl<A> Node<A> {
    pub fn new(parent: Idx, distance: LogicalPosition<A>, serial: u64) -> Node<A> {
        return Node {
            parent,
            left: NONE,
            right: NONE,
            priority: UNSET,
            serial,
            distance,
            block_ids: SmallVec::new(),
            block_height: 0,
        };
    }

    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        return self.left == NONE && self.right == NONE;
    }

    /// Heap order key; lower ranks sit closer to the root.
    #[inline(always)]
    pub fn rank(&self) -> (u32, u64) {
        return (self.priority, self.serial);
    }

    pub fn remove_block_id(&mut self, id: BlockId) {
        if let Some(i) = self.block_ids.iter().position(|&b| b == id) {
            self.block_ids.swap_remove(i);
        }
    }
}
