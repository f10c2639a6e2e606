//! Scenario tests for the line top index.
//!
//! Each row-anchored scenario runs against both the treap and the linear
//! reference, so the two cannot drift apart on the documented behavior.

use line_top::{Anchor, BlockId, Error, LineTopIndex, LinearLineTopIndex, Params, Point};
use rustc_hash::FxHashSet;

// =============================================================================
// Helper functions
// =============================================================================

fn params() -> Params {
    Params { default_line_height: 10, seed: Some(0xdecade) }
}

/// The index API shared by both implementations.
trait Subject<A: Anchor> {
    fn create() -> Self;
    fn insert(&mut self, id: BlockId, position: A, inclusive: bool, height: u64);
    fn remove(&mut self, id: BlockId);
    fn splice(&mut self, start: A, old_extent: A, new_extent: A, invalidate: bool) -> FxHashSet<BlockId>;
    fn top(&self, row: u32) -> u64;
    fn first_block_top(&self, row: u32) -> u64;
    fn row_at(&self, pixel: u64) -> u32;
    fn position(&self, id: BlockId) -> Option<A>;
    fn check(&self) {}
}

impl<A: Anchor> Subject<A> for LineTopIndex<A> {
    fn create() -> Self {
        LineTopIndex::with_params(params())
    }
    fn insert(&mut self, id: BlockId, position: A, inclusive: bool, height: u64) {
        self.insert_block(id, position, inclusive, height);
    }
    fn remove(&mut self, id: BlockId) {
        self.remove_block(id);
    }
    fn splice(&mut self, start: A, old_extent: A, new_extent: A, invalidate: bool) -> FxHashSet<BlockId> {
        LineTopIndex::splice(self, start, old_extent, new_extent, invalidate)
    }
    fn top(&self, row: u32) -> u64 {
        self.pixel_position_for_row(row)
    }
    fn first_block_top(&self, row: u32) -> u64 {
        self.pixel_position_for_first_block_at_row(row)
    }
    fn row_at(&self, pixel: u64) -> u32 {
        self.row_for_pixel_position(pixel)
    }
    fn position(&self, id: BlockId) -> Option<A> {
        self.block_position(id)
    }
    fn check(&self) {
        self.check_invariants();
    }
}

impl<A: Anchor> Subject<A> for LinearLineTopIndex<A> {
    fn create() -> Self {
        LinearLineTopIndex::with_params(params())
    }
    fn insert(&mut self, id: BlockId, position: A, inclusive: bool, height: u64) {
        self.insert_block(id, position, inclusive, height);
    }
    fn remove(&mut self, id: BlockId) {
        self.remove_block(id);
    }
    fn splice(&mut self, start: A, old_extent: A, new_extent: A, invalidate: bool) -> FxHashSet<BlockId> {
        LinearLineTopIndex::splice(self, start, old_extent, new_extent, invalidate)
    }
    fn top(&self, row: u32) -> u64 {
        self.pixel_position_for_row(row)
    }
    fn first_block_top(&self, row: u32) -> u64 {
        self.pixel_position_for_first_block_at_row(row)
    }
    fn row_at(&self, pixel: u64) -> u32 {
        self.row_for_pixel_position(pixel)
    }
    fn position(&self, id: BlockId) -> Option<A> {
        self.block_position(id)
    }
}

fn sorted(set: FxHashSet<BlockId>) -> Vec<BlockId> {
    let mut ids: Vec<_> = set.into_iter().collect();
    ids.sort();
    ids
}

macro_rules! for_both {
    ($scenario:ident, $treap:ident, $linear:ident) => {
        #[test]
        fn $treap() {
            $scenario::<LineTopIndex<u32>>();
        }

        #[test]
        fn $linear() {
            $scenario::<LinearLineTopIndex<u32>>();
        }
    };
}

// =============================================================================
// Row -> pixel
// =============================================================================

fn plain_rows<I: Subject<u32>>() {
    let mut index = I::create();
    for row in [0, 4, 5, 12, 40] {
        assert_eq!(index.top(row), row as u64 * 10);
        assert_eq!(index.first_block_top(row), row as u64 * 10);
    }

    index.splice(0, 2, 3, false);
    for row in [0, 4, 5, 12, 40] {
        assert_eq!(index.top(row), row as u64 * 10);
    }
    index.check();
}
for_both!(plain_rows, plain_rows_treap, plain_rows_linear);

fn inserted_and_removed_blocks<I: Subject<u32>>() {
    let mut index = I::create();
    index.insert(1, 0, false, 10);
    index.insert(2, 3, false, 20);
    index.insert(3, 5, false, 20);

    assert_eq!(index.top(0), 10);
    assert_eq!(index.top(1), 10 + 10);
    assert_eq!(index.top(2), 20 + 10);
    assert_eq!(index.top(3), 30 + 10 + 20);
    assert_eq!(index.top(4), 40 + 10 + 20);
    assert_eq!(index.top(5), 50 + 10 + 20 + 20);
    assert_eq!(index.top(6), 60 + 10 + 20 + 20);

    assert_eq!(index.first_block_top(0), 0);
    assert_eq!(index.first_block_top(3), 30 + 10);
    assert_eq!(index.first_block_top(5), 50 + 10 + 20);

    index.remove(1);
    index.remove(3);

    assert_eq!(index.top(0), 0);
    assert_eq!(index.top(2), 20);
    assert_eq!(index.top(3), 30 + 20);
    assert_eq!(index.top(6), 60 + 20);
    index.check();
}
for_both!(inserted_and_removed_blocks, inserted_and_removed_blocks_treap, inserted_and_removed_blocks_linear);

fn splices_move_blocks<I: Subject<u32>>() {
    let mut index = I::create();
    index.insert(1, 3, false, 20);
    index.insert(2, 5, false, 30);

    assert!(index.splice(0, 0, 4, false).is_empty());
    assert_eq!(index.position(1), Some(7));
    assert_eq!(index.position(2), Some(9));
    assert_eq!(index.top(6), 60);
    assert_eq!(index.top(7), 70 + 20);
    assert_eq!(index.top(8), 80 + 20);
    assert_eq!(index.top(9), 90 + 20 + 30);
    assert_eq!(index.top(11), 110 + 20 + 30);
    index.check();

    assert!(index.splice(0, 6, 2, false).is_empty());
    assert_eq!(index.top(0), 0);
    assert_eq!(index.top(3), 30 + 20);
    assert_eq!(index.top(4), 40 + 20);
    assert_eq!(index.top(5), 50 + 20 + 30);
    assert_eq!(index.top(6), 60 + 20 + 30);
    index.check();

    assert_eq!(sorted(index.splice(2, 4, 0, false)), vec![1, 2]);
    assert_eq!(index.top(1), 10);
    for row in 2..=8 {
        assert_eq!(index.top(row), row as u64 * 10 + 20 + 30);
    }
    index.check();
}
for_both!(splices_move_blocks, splices_move_blocks_treap, splices_move_blocks_linear);

// =============================================================================
// Pixel -> row
// =============================================================================

fn plain_pixels<I: Subject<u32>>() {
    let index = I::create();
    assert_eq!(index.row_at(0), 0);
    assert_eq!(index.row_at(8), 0);
    assert_eq!(index.row_at(40), 4);
    assert_eq!(index.row_at(43), 4);
    assert_eq!(index.row_at(120), 12);
}
for_both!(plain_pixels, plain_pixels_treap, plain_pixels_linear);

fn pixels_inside_blocks<I: Subject<u32>>() {
    let mut index = I::create();
    index.insert(1, 0, false, 10);
    index.insert(2, 3, false, 20);
    index.insert(3, 5, false, 20);

    assert_eq!(index.row_at(0), 0);
    assert_eq!(index.row_at(10), 0);
    assert_eq!(index.row_at(20), 1);
    assert_eq!(index.row_at(30), 2);
    assert_eq!(index.row_at(39), 2);
    assert_eq!(index.row_at(40), 3);
    assert_eq!(index.row_at(41), 3);
    assert_eq!(index.row_at(60), 3);
    assert_eq!(index.row_at(70), 4);
    assert_eq!(index.row_at(79), 4);
    assert_eq!(index.row_at(80), 5);
    assert_eq!(index.row_at(81), 5);
    assert_eq!(index.row_at(100), 5);
    assert_eq!(index.row_at(110), 6);

    index.remove(1);
    index.remove(3);

    assert_eq!(index.row_at(10), 1);
    assert_eq!(index.row_at(29), 2);
    assert_eq!(index.row_at(30), 3);
    assert_eq!(index.row_at(31), 3);
    assert_eq!(index.row_at(50), 3);
    assert_eq!(index.row_at(60), 4);
    assert_eq!(index.row_at(80), 6);
    index.check();
}
for_both!(pixels_inside_blocks, pixels_inside_blocks_treap, pixels_inside_blocks_linear);

fn pixels_after_splices<I: Subject<u32>>() {
    let mut index = I::create();
    index.insert(1, 3, false, 20);
    index.insert(2, 5, false, 30);

    index.splice(0, 0, 4, false);
    assert_eq!(index.row_at(0), 0);
    assert_eq!(index.row_at(60), 6);
    assert_eq!(index.row_at(70 + 20), 7);
    assert_eq!(index.row_at(80 + 20), 8);
    assert_eq!(index.row_at(90 + 20 + 30), 9);
    assert_eq!(index.row_at(110 + 20 + 30), 11);

    index.splice(0, 6, 2, false);
    assert_eq!(index.row_at(30 + 20), 3);
    assert_eq!(index.row_at(40 + 20), 4);
    assert_eq!(index.row_at(50 + 20 + 30), 5);

    index.splice(2, 4, 0, false);
    assert_eq!(index.row_at(10), 1);
    assert_eq!(index.row_at(20), 2);
    for row in 3..=8 {
        assert_eq!(index.row_at(row as u64 * 10 + 20 + 30), row);
    }
    index.check();
}
for_both!(pixels_after_splices, pixels_after_splices_treap, pixels_after_splices_linear);

// =============================================================================
// Splice policy
// =============================================================================

fn inclusive_blocks_follow_insertions<I: Subject<u32>>() {
    let mut index = I::create();
    index.insert(1, 4, false, 5);
    index.insert(2, 4, true, 7);
    index.insert(3, 6, true, 9);

    assert_eq!(sorted(index.splice(4, 0, 3, false)), vec![2]);
    assert_eq!(index.position(1), Some(4));
    assert_eq!(index.position(2), Some(7));
    assert_eq!(index.position(3), Some(9));
    assert_eq!(index.first_block_top(7), 70 + 5);
    assert_eq!(index.top(7), 70 + 5 + 7);
    index.check();
}
for_both!(inclusive_blocks_follow_insertions, inclusive_blocks_follow_insertions_treap, inclusive_blocks_follow_insertions_linear);

fn block_at_old_end_shifts_without_being_touched<I: Subject<u32>>() {
    let mut index = I::create();
    index.insert(1, 5, true, 5);
    let touched = index.splice(2, 3, 1, false);
    assert!(touched.is_empty());
    assert_eq!(index.position(1), Some(3));
    index.check();
}
for_both!(
    block_at_old_end_shifts_without_being_touched,
    block_at_old_end_shifts_without_being_touched_treap,
    block_at_old_end_shifts_without_being_touched_linear
);

fn invalidation_drops_the_old_range<I: Subject<u32>>() {
    let mut index = I::create();
    index.insert(1, 1, false, 10);
    index.insert(2, 2, true, 10);
    index.insert(3, 3, false, 10);
    index.insert(4, 6, false, 10);

    assert_eq!(sorted(index.splice(2, 3, 2, true)), vec![2, 3]);
    assert_eq!(index.position(1), Some(1));
    assert_eq!(index.position(2), None);
    assert_eq!(index.position(3), None);
    assert_eq!(index.position(4), Some(5));
    assert_eq!(index.top(5), 50 + 20);
    index.check();
}
for_both!(invalidation_drops_the_old_range, invalidation_drops_the_old_range_treap, invalidation_drops_the_old_range_linear);

fn zero_splice_changes_nothing<I: Subject<u32>>() {
    let mut index = I::create();
    index.insert(1, 3, true, 10);
    assert!(index.splice(3, 0, 0, true).is_empty());
    assert_eq!(index.position(1), Some(3));
    assert_eq!(index.top(3), 40);
    index.check();
}
for_both!(zero_splice_changes_nothing, zero_splice_changes_nothing_treap, zero_splice_changes_nothing_linear);

// =============================================================================
// Point anchors
// =============================================================================

fn point_blocks<I: Subject<Point>>() {
    let mut index = I::create();
    index.insert(1, Point::new(1, 0), false, 10);
    index.insert(2, Point::new(1, 6), false, 4);
    index.insert(3, Point::new(4, 2), true, 6);

    // Column 0 renders above the row, anything else below it.
    assert_eq!(index.first_block_top(1), 10);
    assert_eq!(index.top(1), 20);
    assert_eq!(index.top(2), 20 + 10 + 4);
    assert_eq!(index.top(4), 40 + 14);
    assert_eq!(index.top(5), 50 + 20);

    assert_eq!(index.row_at(15), 1);
    assert_eq!(index.row_at(29), 1);
    assert_eq!(index.row_at(30), 1);
    assert_eq!(index.row_at(33), 1);
    assert_eq!(index.row_at(34), 2);
    assert_eq!(index.row_at(64), 4);
    assert_eq!(index.row_at(69), 4);
    assert_eq!(index.row_at(70), 5);

    // Type a newline in the middle of row 4, before the block.
    let touched = index.splice(Point::new(4, 1), Point::zero(), Point::new(1, 0), false);
    assert!(touched.is_empty());
    assert_eq!(index.position(3), Some(Point::new(5, 1)));
    assert_eq!(index.position(2), Some(Point::new(1, 6)));

    // Join rows 1 and 2, pulling the mid-row block onto the join point.
    let touched = index.splice(Point::new(1, 3), Point::new(1, 0), Point::zero(), false);
    assert_eq!(sorted(touched), vec![2]);
    assert_eq!(index.position(2), Some(Point::new(1, 3)));
    assert_eq!(index.position(3), Some(Point::new(4, 1)));
    index.check();
}

#[test]
fn point_blocks_treap() {
    point_blocks::<LineTopIndex<Point>>();
}

#[test]
fn point_blocks_linear() {
    point_blocks::<LinearLineTopIndex<Point>>();
}

// =============================================================================
// Block bookkeeping
// =============================================================================

#[test]
fn checked_operations_report_errors() {
    let mut index: LineTopIndex<u32> = LineTopIndex::with_params(params());
    assert_eq!(index.try_insert_block(7, 2, false, 3), Ok(()));
    assert_eq!(index.try_insert_block(7, 9, false, 3), Err(Error::DuplicateBlock(7)));
    assert_eq!(index.try_resize_block(8, 1), Err(Error::UnknownBlock(8)));
    assert_eq!(index.try_move_block(8, 1), Err(Error::UnknownBlock(8)));
    assert_eq!(index.try_remove_block(8), Err(Error::UnknownBlock(8)));
    assert_eq!(index.try_remove_block(7), Ok(()));
    assert!(index.is_empty());
    assert_eq!(Error::UnknownBlock(8).to_string(), "block 8 is not registered");
}

#[test]
#[should_panic(expected = "block 7 is already registered")]
fn duplicate_insert_panics() {
    let mut index: LineTopIndex<u32> = LineTopIndex::with_params(params());
    index.insert_block(7, 2, false, 3);
    index.insert_block(7, 2, false, 3);
}

#[test]
fn resize_and_move_keep_heights() {
    let mut index: LineTopIndex<u32> = LineTopIndex::with_params(params());
    index.insert_block(1, 2, true, 10);
    index.insert_block(2, 2, false, 5);

    index.resize_block(1, 0);
    assert_eq!(index.top(2), 20 + 5);
    assert_eq!(index.block_height(1), Some(0));

    index.move_block(2, 8);
    assert_eq!(index.block_position(2), Some(8));
    assert_eq!(index.block_height(2), Some(5));
    assert_eq!(index.top(2), 20);
    assert_eq!(index.top(8), 80 + 5);

    // The zero-height block kept its inclusiveness through the resize.
    assert_eq!(sorted(LineTopIndex::splice(&mut index, 2, 0, 1, false)), vec![1]);
    assert_eq!(index.block_position(1), Some(3));
    index.check_invariants();
}

#[test]
fn line_height_changes_apply_to_queries() {
    let mut index: LineTopIndex<u32> = LineTopIndex::with_params(params());
    index.insert_block(1, 2, false, 7);
    index.set_default_line_height(20);
    assert_eq!(index.default_line_height(), 20);
    assert_eq!(index.pixel_position_for_row(2), 47);
    assert_eq!(index.row_for_pixel_position(47), 2);

    index.set_default_line_height(0);
    assert_eq!(index.pixel_position_for_row(5), 7);
    assert_eq!(index.row_for_pixel_position(3), 2);
    assert_eq!(index.row_for_pixel_position(100), 2);
}

#[test]
fn many_blocks_stay_consistent() {
    let mut index: LineTopIndex<u32> = LineTopIndex::with_params(params());
    for id in 0..500u64 {
        index.insert_block(id, (id * 7 % 300) as u32, id % 3 == 0, id % 11);
    }
    index.check_invariants();
    for id in (0..500u64).step_by(2) {
        index.remove_block(id);
    }
    index.check_invariants();
    assert_eq!(index.len(), 250);

    let expected: u64 = (1..500u64).step_by(2).filter(|id| id * 7 % 300 <= 100).map(|id| id % 11).sum();
    assert_eq!(index.pixel_position_for_row(100), 1000 + expected);
}
