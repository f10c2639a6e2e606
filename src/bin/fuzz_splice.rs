//! AFL fuzz harness for the line top index.
//!
//! Drives the treap and the linear reference with the same operations and
//! checks after every step that:
//! 1. Both agree on every block's position and height
//! 2. Both agree on row -> pixel and pixel -> row queries
//! 3. The treap's structural invariants hold

use afl::fuzz;
use line_top::LineTopIndex;
use line_top::LinearLineTopIndex;
use line_top::Params;
use line_top::Point;

const MAX_BLOCKS: u64 = 16;
const MAX_ROW: u32 = 24;

/// Operation types the fuzzer can generate
#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    Insert { id: u64, row: u32, column: u32, inclusive: bool, height: u64 },
    Remove { id: u64 },
    Resize { id: u64, height: u64 },
    Move { id: u64, row: u32, column: u32 },
    Splice { row: u32, column: u32, old_rows: u32, old_columns: u32, new_rows: u32, new_columns: u32, invalidate: bool },
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        if bytes.is_empty() {
            return None;
        }

        let op_type = bytes[0] % 5;
        let rest = &bytes[1..];

        match op_type {
            0 if rest.len() >= 4 => {
                let op = FuzzOp::Insert {
                    id: rest[0] as u64 % MAX_BLOCKS,
                    row: rest[1] as u32 % MAX_ROW,
                    column: (rest[2] % 4) as u32,
                    inclusive: rest[2] & 0x80 != 0,
                    height: rest[3] as u64 % 40,
                };
                Some((op, &rest[4..]))
            }
            1 if !rest.is_empty() => {
                let op = FuzzOp::Remove { id: rest[0] as u64 % MAX_BLOCKS };
                Some((op, &rest[1..]))
            }
            2 if rest.len() >= 2 => {
                let op = FuzzOp::Resize {
                    id: rest[0] as u64 % MAX_BLOCKS,
                    height: rest[1] as u64 % 40,
                };
                Some((op, &rest[2..]))
            }
            3 if rest.len() >= 3 => {
                let op = FuzzOp::Move {
                    id: rest[0] as u64 % MAX_BLOCKS,
                    row: rest[1] as u32 % MAX_ROW,
                    column: (rest[2] % 4) as u32,
                };
                Some((op, &rest[3..]))
            }
            4 if rest.len() >= 4 => {
                let op = FuzzOp::Splice {
                    row: rest[0] as u32 % MAX_ROW,
                    column: (rest[1] % 4) as u32,
                    old_rows: (rest[1] >> 4) as u32 % 4,
                    old_columns: (rest[2] % 4) as u32,
                    new_rows: (rest[2] >> 4) as u32 % 4,
                    new_columns: (rest[3] % 4) as u32,
                    invalidate: rest[3] & 0x80 != 0,
                };
                Some((op, &rest[4..]))
            }
            _ => None,
        }
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        let params = Params { default_line_height: 10, seed: Some(0) };
        let mut index: LineTopIndex<Point> = LineTopIndex::with_params(params);
        let mut reference: LinearLineTopIndex<Point> = LinearLineTopIndex::with_params(params);
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;

            match op {
                FuzzOp::Insert { id, row, column, inclusive, height } => {
                    let position = Point::new(row, column);
                    let a = index.try_insert_block(id, position, inclusive, height);
                    let b = reference.try_insert_block(id, position, inclusive, height);
                    assert_eq!(a, b, "insert {} disagrees", id);
                }

                FuzzOp::Remove { id } => {
                    assert_eq!(index.try_remove_block(id), reference.try_remove_block(id), "remove {} disagrees", id);
                }

                FuzzOp::Resize { id, height } => {
                    let a = index.try_resize_block(id, height);
                    let b = reference.try_resize_block(id, height);
                    assert_eq!(a, b, "resize {} disagrees", id);
                }

                FuzzOp::Move { id, row, column } => {
                    let position = Point::new(row, column);
                    assert_eq!(index.try_move_block(id, position), reference.try_move_block(id, position), "move {} disagrees", id);
                }

                FuzzOp::Splice { row, column, old_rows, old_columns, new_rows, new_columns, invalidate } => {
                    let start = Point::new(row, column);
                    let old_extent = Point::new(old_rows, old_columns);
                    let new_extent = Point::new(new_rows, new_columns);
                    let a = index.splice(start, old_extent, new_extent, invalidate);
                    let b = reference.splice(start, old_extent, new_extent, invalidate);
                    assert_eq!(a, b, "splice {:?} {:?} {:?} touched different blocks", start, old_extent, new_extent);
                }
            }

            index.check_invariants();

            // CRITICAL INVARIANT: the treap answers exactly like the reference
            assert_eq!(index.len(), reference.len(), "Block count mismatch");
            for id in 0..MAX_BLOCKS {
                assert_eq!(index.block_position(id), reference.block_position(id), "Position mismatch for block {}", id);
                assert_eq!(index.block_height(id), reference.block_height(id), "Height mismatch for block {}", id);
            }
            for row in 0..MAX_ROW * 2 {
                assert_eq!(
                    index.pixel_position_for_row(row),
                    reference.pixel_position_for_row(row),
                    "Row {} top mismatch",
                    row
                );
                assert_eq!(
                    index.pixel_position_for_first_block_at_row(row),
                    reference.pixel_position_for_first_block_at_row(row),
                    "Row {} first block mismatch",
                    row
                );
            }
            let bottom = reference.pixel_position_for_row(MAX_ROW * 2);
            for pixel in 0..bottom {
                assert_eq!(
                    index.row_for_pixel_position(pixel),
                    reference.row_for_pixel_position(pixel),
                    "Pixel {} row mismatch",
                    pixel
                );
            }
        }
    });
}
