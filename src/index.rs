//! Line top index.
//!
//! Maps rows to pixel offsets in a document whose rows share one default
//! height but which also carries blocks: extra vertical space anchored at
//! logical positions. Blocks are grouped into treap nodes by anchor, and
//! each node stores its position relative to its nearest left ancestor so
//! that a document edit only has to rewrite two nodes to shift everything
//! after it.
//!
//! # Splice policy
//!
//! For an edit replacing `old_extent` at `start` with `new_extent`, a block
//! anchored at `p` is:
//!
//! - left alone if `p < start`, or `p == start` and it is not inclusive
//! - collected if `p == start` and it is inclusive, or `start < p < old_end`
//! - shifted by the edit's delta otherwise
//!
//! Collected blocks move to the end of the new range and are reported, or
//! are dropped and reported when the old range is invalidated.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::cursor::Cursor;
use crate::error::Error;
use crate::node::FIRST_RANDOM;
use crate::node::Idx;
use crate::node::SPLICE_END;
use crate::node::SPLICE_START;
use crate::node::UNSET;
use crate::position::Anchor;
use crate::position::LogicalPosition;
use crate::position::Point;
use crate::tree::Tree;

/// Caller-chosen block identifier.
pub type BlockId = u64;

/// Construction parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Params {
    /// Height of every row outside of blocks.
    pub default_line_height: u64,
    /// Seed for node priorities. `None` draws one from the OS.
    pub seed: Option<u64>,
}

/// Per-block bookkeeping.
#[derive(Clone, Copy, Debug)]
struct Block {
    node: Idx,
    height: u64,
    /// Whether the block travels with text inserted at its anchor.
    inclusive: bool,
}

/// Row <-> pixel index over a set of anchored blocks.
#[derive(Clone, Debug)]
pub struct LineTopIndex<A = Point> {
    default_line_height: u64,
    tree: Tree<A>,
    blocks: FxHashMap<BlockId, Block>,
    rng: StdRng,
}

impl<A: Anchor> Default for LineTopIndex<A> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<A: Anchor> LineTopIndex<A> {
    pub fn new() -> LineTopIndex<A> {
        return LineTopIndex::with_params(Params::default());
    }

    pub fn with_params(params: Params) -> LineTopIndex<A> {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        return LineTopIndex {
            default_line_height: params.default_line_height,
            tree: Tree::new(),
            blocks: FxHashMap::default(),
            rng,
        };
    }

    pub fn set_default_line_height(&mut self, line_height: u64) {
        self.default_line_height = line_height;
    }

    pub fn default_line_height(&self) -> u64 {
        return self.default_line_height;
    }

    /// Number of registered blocks.
    pub fn len(&self) -> usize {
        return self.blocks.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.blocks.is_empty();
    }

    pub fn contains_block(&self, id: BlockId) -> bool {
        return self.blocks.contains_key(&id);
    }

    pub fn block_height(&self, id: BlockId) -> Option<u64> {
        return self.blocks.get(&id).map(|block| block.height);
    }

    /// Where a block is currently anchored. O(depth).
    pub fn block_position(&self, id: BlockId) -> Option<A> {
        let block = self.blocks.get(&id)?;
        return Some(self.tree.absolute_position(block.node).anchor);
    }

    fn random_priority(&mut self) -> u32 {
        return self.rng.gen_range(FIRST_RANDOM..UNSET);
    }

    // --- Block lifecycle ---

    /// Register a block of `height` pixels at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is already registered.
    pub fn insert_block(&mut self, id: BlockId, position: A, inclusive: bool, height: u64) {
        if let Err(err) = self.try_insert_block(id, position, inclusive, height) {
            panic!("{}", err);
        }
    }

    pub fn try_insert_block(&mut self, id: BlockId, position: A, inclusive: bool, height: u64) -> Result<(), Error> {
        if self.blocks.contains_key(&id) {
            return Err(Error::DuplicateBlock(id));
        }
        self.place_block(id, position, inclusive, height);
        tracing::debug!(id, ?position, inclusive, height, "inserted block");
        return Ok(());
    }

    /// # Panics
    ///
    /// Panics if `id` is not registered.
    pub fn remove_block(&mut self, id: BlockId) {
        if let Err(err) = self.try_remove_block(id) {
            panic!("{}", err);
        }
    }

    pub fn try_remove_block(&mut self, id: BlockId) -> Result<(), Error> {
        self.unplace_block(id)?;
        tracing::debug!(id, "removed block");
        return Ok(());
    }

    /// # Panics
    ///
    /// Panics if `id` is not registered.
    pub fn resize_block(&mut self, id: BlockId, height: u64) {
        if let Err(err) = self.try_resize_block(id, height) {
            panic!("{}", err);
        }
    }

    pub fn try_resize_block(&mut self, id: BlockId, height: u64) -> Result<(), Error> {
        let block = self.blocks.get_mut(&id).ok_or(Error::UnknownBlock(id))?;
        let delta = height as i64 - block.height as i64;
        block.height = height;
        let node = block.node;
        self.tree.adjust_block_height(node, delta);
        tracing::debug!(id, height, delta, "resized block");
        return Ok(());
    }

    /// Re-anchor a block, keeping its height and inclusiveness.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered.
    pub fn move_block(&mut self, id: BlockId, position: A) {
        if let Err(err) = self.try_move_block(id, position) {
            panic!("{}", err);
        }
    }

    pub fn try_move_block(&mut self, id: BlockId, position: A) -> Result<(), Error> {
        let block = self.unplace_block(id)?;
        self.place_block(id, position, block.inclusive, block.height);
        tracing::debug!(id, ?position, "moved block");
        return Ok(());
    }

    fn place_block(&mut self, id: BlockId, position: A, inclusive: bool, height: u64) {
        let (node, created) = self.tree.find_or_insert(position, true);
        if created {
            let priority = self.random_priority();
            self.tree.node_mut(node).priority = priority;
            self.tree.bubble_up(node);
        }
        self.tree.adjust_block_height(node, height as i64);
        self.tree.node_mut(node).block_ids.push(id);
        self.blocks.insert(id, Block { node, height, inclusive });
    }

    fn unplace_block(&mut self, id: BlockId) -> Result<Block, Error> {
        let block = self.blocks.remove(&id).ok_or(Error::UnknownBlock(id))?;
        self.tree.adjust_block_height(block.node, -(block.height as i64));
        let node = self.tree.node_mut(block.node);
        node.remove_block_id(id);
        if node.block_ids.is_empty() {
            self.tree.delete_node(block.node);
        }
        return Ok(block);
    }

    // --- Document edits ---

    /// Reconcile the index with an edit that replaces `old_extent` at
    /// `start` with `new_extent`. Returns the blocks that were moved to the
    /// end of the new range, or dropped if `invalidate_old_range` is set.
    pub fn splice(
        &mut self,
        start: A,
        old_extent: A,
        new_extent: A,
        invalidate_old_range: bool,
    ) -> FxHashSet<BlockId> {
        let mut touched = FxHashSet::default();
        if old_extent.is_zero() && new_extent.is_zero() {
            return touched;
        }

        let old_end = start.traverse(old_extent);
        let new_end = start.traverse(new_extent);

        // A pure insertion still needs its own end node, placed directly
        // after whatever already sits at `start`.
        let (start_node, _) = self.tree.find_or_insert(start, true);
        let (end_node, _) = self.tree.find_or_insert(old_end, !old_extent.is_zero());

        // Lift both to the top. The start node ends up as the root's left
        // child, with exactly the open range (start, old_end) to its right.
        self.tree.node_mut(start_node).priority = SPLICE_START;
        self.tree.bubble_up(start_node);
        self.tree.node_mut(end_node).priority = SPLICE_END;
        self.tree.bubble_up(end_node);
        debug_assert_eq!(self.tree.root, end_node);
        debug_assert_eq!(self.tree.node(end_node).left, start_node);

        let mut collected = Vec::new();
        let interior = self.tree.node(start_node).right;
        self.tree.harvest_subtree(interior, &mut collected);

        let mut released = 0u64;
        let at_start: SmallVec<[BlockId; 2]> = self.tree.node(start_node).block_ids.clone();
        for id in at_start {
            let block = self.blocks[&id];
            if block.inclusive {
                released += block.height;
                self.tree.node_mut(start_node).remove_block_id(id);
                collected.push(id);
            }
        }

        let collected_height: u64 = collected.iter().map(|id| self.blocks[id].height).sum();
        let arriving = if invalidate_old_range { 0 } else { collected_height };

        // Both nodes now sit at the top with absolute distances, so they can
        // be rewritten directly. Everything right of the end node is stored
        // relative to it and follows it to `new_end`.
        let start_pixels = {
            let node = self.tree.node_mut(start_node);
            node.block_height -= released;
            node.distance.pixels -= released;
            node.distance.pixels
        };
        {
            let node = self.tree.node_mut(end_node);
            node.block_height += arriving;
            node.distance = LogicalPosition::new(new_end, start_pixels + node.block_height);
        }

        for id in collected {
            if invalidate_old_range {
                self.blocks.remove(&id);
            } else {
                if let Some(block) = self.blocks.get_mut(&id) {
                    block.node = end_node;
                }
                self.tree.node_mut(end_node).block_ids.push(id);
            }
            touched.insert(id);
        }

        if new_end == start {
            self.merge_into(end_node, start_node);
            self.tree.delete_node(end_node);
            self.settle(start_node);
        } else {
            self.settle(start_node);
            self.settle(end_node);
        }

        tracing::debug!(
            ?start,
            ?old_extent,
            ?new_extent,
            invalidate_old_range,
            touched = touched.len(),
            nodes = self.tree.len(),
            "spliced"
        );
        return touched;
    }

    /// Move every block of `from` onto `into`. `into` must be the left child
    /// of `from` with nothing between them, so `from`'s absolute pixels do
    /// not change.
    fn merge_into(&mut self, from: Idx, into: Idx) {
        let (ids, height) = {
            let node = self.tree.node_mut(from);
            let height = node.block_height;
            node.block_height = 0;
            (std::mem::take(&mut node.block_ids), height)
        };
        let node = self.tree.node_mut(into);
        node.block_height += height;
        node.distance.pixels += height;
        for &id in &ids {
            node.block_ids.push(id);
        }
        for id in ids {
            if let Some(block) = self.blocks.get_mut(&id) {
                block.node = into;
            }
        }
    }

    /// Drop a splice boundary node if it holds no blocks, otherwise give it
    /// a real priority and let it sink back into heap order.
    fn settle(&mut self, idx: Idx) {
        if self.tree.node(idx).block_ids.is_empty() {
            self.tree.delete_node(idx);
        } else {
            let priority = self.random_priority();
            self.tree.node_mut(idx).priority = priority;
            self.tree.bubble_down(idx);
        }
    }

    // --- Queries ---

    /// Top of `row`'s text: every block before the row plus the blocks
    /// anchored at the row's start, which render above it.
    pub fn pixel_position_for_row(&self, row: u32) -> u64 {
        let blocks = Cursor::new(&self.tree).pixels_through(A::row_start(row), true);
        return row as u64 * self.default_line_height + blocks;
    }

    /// Top of the first block anchored at `row`'s start, or of the row's
    /// text if there is none.
    pub fn pixel_position_for_first_block_at_row(&self, row: u32) -> u64 {
        let blocks = Cursor::new(&self.tree).pixels_through(A::row_start(row), false);
        return row as u64 * self.default_line_height + blocks;
    }

    /// The row displayed at `pixel`. Pixels inside a block resolve to the
    /// block's row.
    pub fn row_for_pixel_position(&self, pixel: u64) -> u32 {
        return Cursor::new(&self.tree).row_for_pixel_position(pixel, self.default_line_height);
    }

    // --- Invariant checking ---

    /// Panic if the tree or the block bookkeeping is inconsistent.
    pub fn check_invariants(&self) {
        self.tree.check_invariants();

        let mut seen = 0usize;
        self.tree.for_each_in_order(|idx, position| {
            let node = self.tree.node(idx);
            assert!(
                !node.block_ids.is_empty(),
                "INVARIANT VIOLATED: node {} at {:?} holds no blocks",
                idx, position.anchor
            );
            let mut height = 0u64;
            for id in &node.block_ids {
                let block = match self.blocks.get(id) {
                    Some(block) => block,
                    None => panic!("INVARIANT VIOLATED: node {} holds unknown block {}", idx, id),
                };
                assert_eq!(block.node, idx, "INVARIANT VIOLATED: block {} points at node {}", id, block.node);
                height += block.height;
            }
            assert_eq!(
                node.block_height, height,
                "INVARIANT VIOLATED: node {} block height {} != sum {}",
                idx, node.block_height, height
            );
            seen += node.block_ids.len();
        });

        assert_eq!(seen, self.blocks.len(), "INVARIANT VIOLATED: {} blocks in tree, {} registered", seen, self.blocks.len());
    }
}
