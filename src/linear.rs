//! Brute-force reference index.
//!
//! Same API and semantics as [`LineTopIndex`](crate::LineTopIndex), with
//! every operation implemented as a scan over a flat block table. Splices
//! are O(n) and queries re-group the table on every call. Used as the
//! oracle in differential tests and benchmarks.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use crate::cursor::rows_in;
use crate::error::Error;
use crate::index::BlockId;
use crate::index::Params;
use crate::position::Anchor;
use crate::position::Point;

#[derive(Clone, Copy, Debug)]
struct Entry<A> {
    position: A,
    height: u64,
    inclusive: bool,
}

#[derive(Clone, Debug, Default)]
pub struct LinearLineTopIndex<A = Point> {
    default_line_height: u64,
    blocks: FxHashMap<BlockId, Entry<A>>,
}

impl<A: Anchor> LinearLineTopIndex<A> {
    pub fn new() -> LinearLineTopIndex<A> {
        return LinearLineTopIndex::with_params(Params::default());
    }

    /// The seed is ignored; nothing here is randomized.
    pub fn with_params(params: Params) -> LinearLineTopIndex<A> {
        return LinearLineTopIndex {
            default_line_height: params.default_line_height,
            blocks: FxHashMap::default(),
        };
    }

    pub fn set_default_line_height(&mut self, line_height: u64) {
        self.default_line_height = line_height;
    }

    pub fn default_line_height(&self) -> u64 {
        return self.default_line_height;
    }

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
        return self.blocks.get(&id).map(|entry| entry.height);
    }

    pub fn block_position(&self, id: BlockId) -> Option<A> {
        return self.blocks.get(&id).map(|entry| entry.position);
    }

    pub fn insert_block(&mut self, id: BlockId, position: A, inclusive: bool, height: u64) {
        if let Err(err) = self.try_insert_block(id, position, inclusive, height) {
            panic!("{}", err);
        }
    }

    pub fn try_insert_block(&mut self, id: BlockId, position: A, inclusive: bool, height: u64) -> Result<(), Error> {
        if self.blocks.contains_key(&id) {
            return Err(Error::DuplicateBlock(id));
        }
        self.blocks.insert(id, Entry { position, height, inclusive });
        return Ok(());
    }

    pub fn remove_block(&mut self, id: BlockId) {
        if let Err(err) = self.try_remove_block(id) {
            panic!("{}", err);
        }
    }

    pub fn try_remove_block(&mut self, id: BlockId) -> Result<(), Error> {
        self.blocks.remove(&id).ok_or(Error::UnknownBlock(id))?;
        return Ok(());
    }

    pub fn resize_block(&mut self, id: BlockId, height: u64) {
        if let Err(err) = self.try_resize_block(id, height) {
            panic!("{}", err);
        }
    }

    pub fn try_resize_block(&mut self, id: BlockId, height: u64) -> Result<(), Error> {
        let entry = self.blocks.get_mut(&id).ok_or(Error::UnknownBlock(id))?;
        entry.height = height;
        return Ok(());
    }

    pub fn move_block(&mut self, id: BlockId, position: A) {
        if let Err(err) = self.try_move_block(id, position) {
            panic!("{}", err);
        }
    }

    pub fn try_move_block(&mut self, id: BlockId, position: A) -> Result<(), Error> {
        let entry = self.blocks.get_mut(&id).ok_or(Error::UnknownBlock(id))?;
        entry.position = position;
        return Ok(());
    }

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

        for (&id, entry) in self.blocks.iter_mut() {
            let p = entry.position;
            if p < start || (p == start && !entry.inclusive) {
                continue;
            }
            if p == start || p < old_end {
                entry.position = new_end;
                touched.insert(id);
            } else {
                entry.position = new_end.traverse(p.traversal(old_end));
            }
        }

        if invalidate_old_range {
            for id in &touched {
                self.blocks.remove(id);
            }
        }
        return touched;
    }

    /// Summed block heights per anchor, in anchor order.
    fn groups(&self) -> BTreeMap<A, u64> {
        let mut groups = BTreeMap::new();
        for entry in self.blocks.values() {
            *groups.entry(entry.position).or_insert(0) += entry.height;
        }
        return groups;
    }

    pub fn pixel_position_for_row(&self, row: u32) -> u64 {
        let row_start = A::row_start(row);
        let blocks: u64 = self
            .blocks
            .values()
            .filter(|entry| entry.position <= row_start)
            .map(|entry| entry.height)
            .sum();
        return row as u64 * self.default_line_height + blocks;
    }

    pub fn pixel_position_for_first_block_at_row(&self, row: u32) -> u64 {
        let row_start = A::row_start(row);
        let blocks: u64 = self
            .blocks
            .values()
            .filter(|entry| entry.position < row_start)
            .map(|entry| entry.height)
            .sum();
        return row as u64 * self.default_line_height + blocks;
    }

    pub fn row_for_pixel_position(&self, pixel: u64) -> u32 {
        let line_height = self.default_line_height;

        // Last group whose span starts at or before `pixel`.
        let mut last: Option<(A, u64, u64)> = None;
        let mut accumulated = 0u64;
        for (anchor, height) in self.groups() {
            accumulated += height;
            let end = anchor.visual_row() as u64 * line_height + accumulated;
            let start = end - height;
            if start > pixel {
                break;
            }
            last = Some((anchor, start, end));
        }

        match last {
            None => rows_in(pixel, line_height),
            Some((anchor, _, end)) if pixel < end => anchor.row(),
            Some((anchor, _, end)) => anchor.visual_row() + rows_in(pixel - end, line_height),
        }
    }
}
