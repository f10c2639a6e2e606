//! Positional algebra.
//!
//! Anchors are logical document addresses. They form a monoid under
//! `traverse` (advance by an extent) with `traversal` as its inverse, and
//! `traverse` is strictly monotone in the extent. The treap relies on both
//! properties: relative offsets stored on nodes are combined with
//! `traverse` during descents and rebased with `traversal` on rotation.
//!
//! Two anchor types are provided:
//!
//! - `u32`: a bare row. Blocks render above the row.
//! - [`Point`]: a row/column pair. Blocks at column 0 render above the row,
//!   blocks anywhere else on the row render below it.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::Add;
use std::ops::Sub;

/// A logical address that blocks can be anchored to.
pub trait Anchor: Copy + Ord + Default + Debug {
    /// Advance `self` by `extent`.
    fn traverse(self, extent: Self) -> Self;

    /// The extent that takes `start` to `self`. Requires `start <= self`.
    fn traversal(self, start: Self) -> Self;

    /// The smallest anchor on `row`.
    fn row_start(row: u32) -> Self;

    /// The row this anchor lies on.
    fn row(self) -> u32;

    /// The row whose top edge a block anchored here ends at.
    fn visual_row(self) -> u32;

    #[inline]
    fn is_zero(self) -> bool {
        return self == Self::default();
    }
}

impl Anchor for u32 {
    #[inline]
    fn traverse(self, extent: u32) -> u32 {
        return self + extent;
    }

    #[inline]
    fn traversal(self, start: u32) -> u32 {
        debug_assert!(start <= self, "traversal from {} to {}", start, self);
        return self - start;
    }

    #[inline]
    fn row_start(row: u32) -> u32 {
        return row;
    }

    #[inline]
    fn row(self) -> u32 {
        return self;
    }

    #[inline]
    fn visual_row(self) -> u32 {
        return self;
    }
}

/// A row/column location, ordered by row then column.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub fn new(row: u32, column: u32) -> Point {
        return Point { row, column };
    }

    pub fn zero() -> Point {
        return Point::default();
    }
}

impl Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "({}, {})", self.row, self.column);
    }
}

impl Anchor for Point {
    #[inline]
    fn traverse(self, extent: Point) -> Point {
        if extent.row == 0 {
            return Point::new(self.row, self.column + extent.column);
        }
        return Point::new(self.row + extent.row, extent.column);
    }

    #[inline]
    fn traversal(self, start: Point) -> Point {
        debug_assert!(start <= self, "traversal from {:?} to {:?}", start, self);
        if self.row == start.row {
            return Point::new(0, self.column - start.column);
        }
        return Point::new(self.row - start.row, self.column);
    }

    #[inline]
    fn row_start(row: u32) -> Point {
        return Point::new(row, 0);
    }

    #[inline]
    fn row(self) -> u32 {
        return self.row;
    }

    #[inline]
    fn visual_row(self) -> u32 {
        if self.column == 0 {
            return self.row;
        }
        return self.row + 1;
    }
}

/// An anchor paired with accumulated block pixels.
///
/// Used both as an absolute position (everything up to and including the
/// blocks at `anchor`) and as a relative offset between two such positions.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct LogicalPosition<A> {
    pub anchor: A,
    pub pixels: u64,
}

impl<A: Anchor> LogicalPosition<A> {
    pub fn new(anchor: A, pixels: u64) -> LogicalPosition<A> {
        return LogicalPosition { anchor, pixels };
    }

    pub fn zero() -> LogicalPosition<A> {
        return LogicalPosition::default();
    }

    /// Orders positions by anchor alone; pixels never participate.
    #[inline]
    pub fn compare(&self, other: &LogicalPosition<A>) -> Ordering {
        return self.anchor.cmp(&other.anchor);
    }
}

impl<A: Anchor> Add for LogicalPosition<A> {
    type Output = LogicalPosition<A>;

    #[inline]
    fn add(self, extent: LogicalPosition<A>) -> LogicalPosition<A> {
        return LogicalPosition {
            anchor: self.anchor.traverse(extent.anchor),
            pixels: self.pixels + extent.pixels,
        };
    }
}

impl<A: Anchor> Sub for LogicalPosition<A> {
    type Output = LogicalPosition<A>;

    /// `self - start`, the extent that `start + extent == self` solves for.
    #[inline]
    fn sub(self, start: LogicalPosition<A>) -> LogicalPosition<A> {
        return LogicalPosition {
            anchor: self.anchor.traversal(start.anchor),
            pixels: self.pixels - start.pixels,
        };
    }
}

impl<A: Debug> Debug for LogicalPosition<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{:?}+{}px", self.anchor, self.pixels);
    }
}
