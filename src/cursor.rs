//! Single-descent traversal over the treap.
//!
//! A cursor walks from the root towards a target, rebuilding absolute
//! positions from the relative offsets stored on nodes. Descending left
//! keeps the current left ancestor; descending right makes the current
//! node the new left ancestor, since every offset below it is measured
//! from its position.
//!
//! The left ancestor doubles as the answer whenever the descent runs off
//! the left edge of the tree: it is the in-order predecessor of the
//! position the search was looking for.

use std::cmp::Ordering;

use crate::node::Idx;
use crate::node::NONE;
use crate::position::Anchor;
use crate::position::LogicalPosition;
use crate::tree::Side;
use crate::tree::Tree;

/// Outcome of [`Cursor::seek`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Seek<A> {
    /// The tree is empty.
    Empty,
    /// A node already sits at the target.
    Found(Idx),
    /// The target belongs in the missing `side` child of `parent`, at
    /// `distance` from that slot's left ancestor.
    Vacant {
        parent: Idx,
        side: Side,
        distance: LogicalPosition<A>,
    },
}

pub(crate) struct Cursor<'a, A> {
    tree: &'a Tree<A>,
    node: Idx,
    position: LogicalPosition<A>,
    left_ancestor_position: LogicalPosition<A>,
}

impl<'a, A: Anchor> Cursor<'a, A> {
    /// A cursor parked on the root.
    pub fn new(tree: &'a Tree<A>) -> Cursor<'a, A> {
        let mut cursor = Cursor {
            tree,
            node: NONE,
            position: LogicalPosition::zero(),
            left_ancestor_position: LogicalPosition::zero(),
        };
        cursor.set_node(tree.root);
        return cursor;
    }

    fn set_node(&mut self, idx: Idx) {
        self.node = idx;
        if idx != NONE {
            self.position = self.left_ancestor_position + self.tree.node(idx).distance;
        }
    }

    fn left(&self) -> Idx {
        return self.tree.node(self.node).left;
    }

    fn right(&self) -> Idx {
        return self.tree.node(self.node).right;
    }

    fn descend_left(&mut self) {
        self.set_node(self.left());
    }

    fn descend_right(&mut self) {
        self.left_ancestor_position = self.position;
        self.set_node(self.right());
    }

    /// Locate `anchor`. With `match_equal` unset an existing node at the
    /// anchor is passed on the right, so the vacant slot returned sits
    /// directly after it in key order.
    pub fn seek(mut self, anchor: A, match_equal: bool) -> Seek<A> {
        if self.node == NONE {
            return Seek::Empty;
        }

        loop {
            match anchor.cmp(&self.position.anchor) {
                Ordering::Less => {
                    if self.left() != NONE {
                        self.descend_left();
                    } else {
                        let distance = anchor.traversal(self.left_ancestor_position.anchor);
                        return Seek::Vacant {
                            parent: self.node,
                            side: Side::Left,
                            distance: LogicalPosition::new(distance, 0),
                        };
                    }
                }
                Ordering::Equal if match_equal => return Seek::Found(self.node),
                Ordering::Equal | Ordering::Greater => {
                    if self.right() != NONE {
                        self.descend_right();
                    } else {
                        let distance = anchor.traversal(self.position.anchor);
                        return Seek::Vacant {
                            parent: self.node,
                            side: Side::Right,
                            distance: LogicalPosition::new(distance, 0),
                        };
                    }
                }
            }
        }
    }

    /// Block pixels accumulated up to `anchor`. Blocks anchored exactly at
    /// `anchor` count only when `inclusive` is set.
    pub fn pixels_through(mut self, anchor: A, inclusive: bool) -> u64 {
        if self.node == NONE {
            return 0;
        }

        loop {
            match anchor.cmp(&self.position.anchor) {
                Ordering::Less => {
                    if self.left() == NONE {
                        return self.left_ancestor_position.pixels;
                    }
                    self.descend_left();
                }
                Ordering::Equal => {
                    if inclusive {
                        return self.position.pixels;
                    }
                    return self.position.pixels - self.tree.node(self.node).block_height;
                }
                Ordering::Greater => {
                    if self.right() == NONE {
                        return self.position.pixels;
                    }
                    self.descend_right();
                }
            }
        }
    }

    /// The row displayed at `pixel`.
    ///
    /// Each node owns the span `[start, end)` its blocks occupy, where `end`
    /// is the top of the node's visual row. Pixels inside a span resolve to
    /// the node's row; pixels between spans are counted off in whole lines
    /// from the end of the preceding span.
    pub fn row_for_pixel_position(mut self, pixel: u64, line_height: u64) -> u32 {
        if self.node == NONE {
            return rows_in(pixel, line_height);
        }

        loop {
            let block_end = span_end(self.position, line_height);
            let block_start = block_end - self.tree.node(self.node).block_height;

            if pixel < block_start {
                if self.left() == NONE {
                    return interpolate(self.left_ancestor_position, pixel, line_height);
                }
                self.descend_left();
            } else if pixel < block_end {
                return self.position.anchor.row();
            } else {
                if self.right() == NONE {
                    return interpolate(self.position, pixel, line_height);
                }
                self.descend_right();
            }
        }
    }
}

impl<A: Anchor> Tree<A> {
    /// Return the node at `anchor`, creating it if needed. The flag reports
    /// whether the node is new; new nodes still carry the unset priority.
    pub fn find_or_insert(&mut self, anchor: A, match_equal: bool) -> (Idx, bool) {
        match Cursor::new(self).seek(anchor, match_equal) {
            Seek::Found(idx) => (idx, false),
            Seek::Empty => (self.insert_root(anchor), true),
            Seek::Vacant { parent, side, distance } => (self.attach(parent, side, distance), true),
        }
    }
}

#[inline]
fn span_end<A: Anchor>(position: LogicalPosition<A>, line_height: u64) -> u64 {
    return position.anchor.visual_row() as u64 * line_height + position.pixels;
}

#[inline]
fn interpolate<A: Anchor>(from: LogicalPosition<A>, pixel: u64, line_height: u64) -> u32 {
    let overshoot = pixel - span_end(from, line_height);
    return from.anchor.visual_row() + rows_in(overshoot, line_height);
}

/// Whole lines in `pixels`. A zero line height has no lines to count.
#[inline]
pub(crate) fn rows_in(pixels: u64, line_height: u64) -> u32 {
    return pixels.checked_div(line_height).unwrap_or(0) as u32;
}
