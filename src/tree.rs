//! Arena-backed treap with relative positions.
//!
//! Every node stores its offset from its nearest left ancestor (the
//! ancestor reached through a right-child edge). Absolute positions are
//! rebuilt on the way down by the cursor, so rotations and block height
//! changes only touch the nodes on one root path.
//!
//! Structure:
//! - Nodes are stored in a Vec and linked by `u32` indices (no raw pointers)
//! - Deleted slots go on a free list and are reused by later insertions
//! - Heap order is over `(priority, serial)`, lowest at the root
//!
//! Operations:
//! - rotate_left / rotate_right: O(1), rebase one relative offset
//! - bubble_up / bubble_down: O(depth)
//! - delete_node: O(depth), sinks the node to a leaf then unlinks it
//! - adjust_block_height: O(depth), folds a height delta into ancestors

use crate::index::BlockId;
use crate::node::Idx;
use crate::node::NONE;
use crate::node::Node;
use crate::node::UNSET;
use crate::position::Anchor;
use crate::position::LogicalPosition;

/// Which child link of a parent a node hangs from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub(crate) struct Tree<A> {
    /// Arena of nodes, live and free.
    nodes: Vec<Node<A>>,
    /// Root index, or NONE when empty.
    pub root: Idx,
    /// Free list for reusing removed node slots.
    free_list: Vec<Idx>,
    /// Serial handed to the next allocated node.
    next_serial: u64,
    /// Number of live nodes.
    len: usize,
}

impl<A: Anchor> Tree<A> {
    pub fn new() -> Tree<A> {
        return Tree {
            nodes: Vec::new(),
            root: NONE,
            free_list: Vec::new(),
            next_serial: 0,
            len: 0,
        };
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.len;
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.root == NONE;
    }

    // --- Node access helpers ---

    #[inline(always)]
    pub fn node(&self, idx: Idx) -> &Node<A> {
        return &self.nodes[idx as usize];
    }

    #[inline(always)]
    pub fn node_mut(&mut self, idx: Idx) -> &mut Node<A> {
        return &mut self.nodes[idx as usize];
    }

    fn alloc(&mut self, parent: Idx, distance: LogicalPosition<A>) -> Idx {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.len += 1;
        let node = Node::new(parent, distance, serial);
        if let Some(idx) = self.free_list.pop() {
            *self.node_mut(idx) = node;
            return idx;
        }
        let idx = self.nodes.len() as Idx;
        assert!(idx != NONE, "node arena exhausted");
        self.nodes.push(node);
        return idx;
    }

    fn free(&mut self, idx: Idx) {
        let node = self.node_mut(idx);
        node.parent = NONE;
        node.left = NONE;
        node.right = NONE;
        node.block_ids.clear();
        node.block_height = 0;
        self.free_list.push(idx);
        self.len -= 1;
    }

    /// Create the root of an empty tree.
    pub fn insert_root(&mut self, anchor: A) -> Idx {
        debug_assert!(self.is_empty());
        let idx = self.alloc(NONE, LogicalPosition::new(anchor, 0));
        self.root = idx;
        tracing::trace!(node = idx, ?anchor, "created root node");
        return idx;
    }

    /// Hang a fresh node off `parent`. The slot must be empty.
    pub fn attach(&mut self, parent: Idx, side: Side, distance: LogicalPosition<A>) -> Idx {
        let idx = self.alloc(parent, distance);
        let parent_node = self.node_mut(parent);
        match side {
            Side::Left => {
                debug_assert_eq!(parent_node.left, NONE);
                parent_node.left = idx;
            }
            Side::Right => {
                debug_assert_eq!(parent_node.right, NONE);
                parent_node.right = idx;
            }
        }
        tracing::trace!(node = idx, parent, ?side, ?distance, "attached node");
        return idx;
    }

    /// Point whatever referenced `old` under `parent` (or the root) at `new`.
    fn replace_child(&mut self, parent: Idx, old: Idx, new: Idx) {
        if parent == NONE {
            self.root = new;
        } else if self.node(parent).left == old {
            self.node_mut(parent).left = new;
        } else {
            debug_assert_eq!(self.node(parent).right, old);
            self.node_mut(parent).right = new;
        }
    }

    // --- Rotations ---

    /// Rotate `pivot`, a right child, into its parent's place.
    ///
    /// The pivot's offset was relative to its parent; afterwards it is
    /// relative to whatever the parent was relative to.
    pub fn rotate_left(&mut self, pivot: Idx) {
        let root = self.node(pivot).parent;
        debug_assert_eq!(self.node(root).right, pivot);
        let grandparent = self.node(root).parent;

        self.replace_child(grandparent, root, pivot);
        self.node_mut(pivot).parent = grandparent;

        let inner = self.node(pivot).left;
        self.node_mut(root).right = inner;
        if inner != NONE {
            self.node_mut(inner).parent = root;
        }

        self.node_mut(pivot).left = root;
        self.node_mut(root).parent = pivot;

        let distance = self.node(root).distance + self.node(pivot).distance;
        self.node_mut(pivot).distance = distance;
    }

    /// Rotate `pivot`, a left child, into its parent's place.
    ///
    /// The former parent becomes the pivot's right child, so its offset is
    /// rebased onto the pivot.
    pub fn rotate_right(&mut self, pivot: Idx) {
        let root = self.node(pivot).parent;
        debug_assert_eq!(self.node(root).left, pivot);
        let grandparent = self.node(root).parent;

        self.replace_child(grandparent, root, pivot);
        self.node_mut(pivot).parent = grandparent;

        let inner = self.node(pivot).right;
        self.node_mut(root).left = inner;
        if inner != NONE {
            self.node_mut(inner).parent = root;
        }

        self.node_mut(pivot).right = root;
        self.node_mut(root).parent = pivot;

        let distance = self.node(root).distance - self.node(pivot).distance;
        self.node_mut(root).distance = distance;
    }

    /// Rotate `child` above its parent, whichever side it hangs from.
    fn rotate_up(&mut self, child: Idx) {
        let parent = self.node(child).parent;
        if self.node(parent).left == child {
            self.rotate_right(child);
        } else {
            self.rotate_left(child);
        }
    }

    // --- Heap maintenance ---

    pub fn bubble_up(&mut self, idx: Idx) {
        loop {
            let parent = self.node(idx).parent;
            if parent == NONE || self.node(idx).rank() >= self.node(parent).rank() {
                break;
            }
            self.rotate_up(idx);
        }
    }

    /// The child with the lowest rank, treating missing children as
    /// infinitely ranked.
    fn lowest_child(&self, idx: Idx) -> Idx {
        let node = self.node(idx);
        match (node.left, node.right) {
            (NONE, right) => right,
            (left, NONE) => left,
            (left, right) => {
                if self.node(left).rank() < self.node(right).rank() {
                    left
                } else {
                    right
                }
            }
        }
    }

    pub fn bubble_down(&mut self, idx: Idx) {
        loop {
            let child = self.lowest_child(idx);
            if child == NONE || self.node(child).rank() >= self.node(idx).rank() {
                break;
            }
            self.rotate_up(child);
        }
    }

    /// Sink `idx` to a leaf and unlink it. Its own block height must already
    /// be zero.
    pub fn delete_node(&mut self, idx: Idx) {
        debug_assert_eq!(self.node(idx).block_height, 0, "deleting node {} with blocks", idx);
        self.node_mut(idx).priority = UNSET;
        while !self.node(idx).is_leaf() {
            let child = self.lowest_child(idx);
            self.rotate_up(child);
        }
        let parent = self.node(idx).parent;
        self.replace_child(parent, idx, NONE);
        self.free(idx);
        tracing::trace!(node = idx, "deleted node");
    }

    // --- Augmentation ---

    /// Add `delta` to the node's own block height and fold it into every
    /// ancestor that the node sits to the left of.
    pub fn adjust_block_height(&mut self, idx: Idx, delta: i64) {
        if delta == 0 {
            return;
        }
        let node = self.node_mut(idx);
        node.block_height = shift(node.block_height, delta);
        node.distance.pixels = shift(node.distance.pixels, delta);

        let mut child = idx;
        let mut parent = self.node(idx).parent;
        while parent != NONE {
            if self.node(parent).left == child {
                let pixels = &mut self.node_mut(parent).distance.pixels;
                *pixels = shift(*pixels, delta);
            }
            child = parent;
            parent = self.node(parent).parent;
        }
    }

    /// Resolve a node's absolute position by walking its left-ancestor
    /// chain towards the root.
    pub fn absolute_position(&self, idx: Idx) -> LogicalPosition<A> {
        let mut position = self.node(idx).distance;
        let mut current = idx;
        loop {
            let mut child = current;
            let mut parent = self.node(child).parent;
            while parent != NONE && self.node(parent).left == child {
                child = parent;
                parent = self.node(parent).parent;
            }
            if parent == NONE {
                return position;
            }
            position = self.node(parent).distance + position;
            current = parent;
        }
    }

    /// Detach the subtree rooted at `idx`, append its block ids to `out`
    /// and free its nodes.
    pub fn harvest_subtree(&mut self, idx: Idx, out: &mut Vec<BlockId>) {
        if idx == NONE {
            return;
        }
        let parent = self.node(idx).parent;
        self.replace_child(parent, idx, NONE);

        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            let node = self.node(current);
            out.extend(node.block_ids.iter().copied());
            if node.left != NONE {
                stack.push(node.left);
            }
            if node.right != NONE {
                stack.push(node.right);
            }
            self.free(current);
        }
    }

    // --- Invariant checking ---

    /// Visit live nodes in key order with their absolute positions,
    /// rebuilt top-down independently of `absolute_position`.
    pub fn for_each_in_order(&self, mut f: impl FnMut(Idx, LogicalPosition<A>)) {
        // (node, left ancestor position, children already pushed)
        let mut stack: Vec<(Idx, LogicalPosition<A>, bool)> = Vec::new();
        if self.root != NONE {
            stack.push((self.root, LogicalPosition::zero(), false));
        }
        while let Some((idx, base, expanded)) = stack.pop() {
            let node = self.node(idx);
            let position = base + node.distance;
            if expanded {
                f(idx, position);
                continue;
            }
            if node.right != NONE {
                stack.push((node.right, position, false));
            }
            stack.push((idx, base, true));
            if node.left != NONE {
                stack.push((node.left, base, false));
            }
        }
    }

    /// Panic on the first violated structural invariant.
    pub fn check_invariants(&self) {
        let mut count = 0usize;
        let mut previous: Option<LogicalPosition<A>> = None;
        let mut running_pixels = 0u64;

        self.for_each_in_order(|idx, position| {
            count += 1;
            let node = self.node(idx);

            if let Some(previous) = previous {
                assert!(
                    previous.anchor < position.anchor,
                    "INVARIANT VIOLATED: node {} at {:?} does not follow {:?}",
                    idx, position, previous
                );
            }
            previous = Some(position);

            running_pixels += node.block_height;
            assert_eq!(
                position.pixels, running_pixels,
                "INVARIANT VIOLATED: node {} at {:?} expected {} accumulated pixels",
                idx, position.anchor, running_pixels
            );

            for child in [node.left, node.right] {
                if child == NONE {
                    continue;
                }
                assert_eq!(
                    self.node(child).parent, idx,
                    "INVARIANT VIOLATED: child {} of {} has parent {}",
                    child, idx, self.node(child).parent
                );
                assert!(
                    node.rank() <= self.node(child).rank(),
                    "INVARIANT VIOLATED: heap order between {} and child {}",
                    idx, child
                );
            }

            assert_eq!(
                self.absolute_position(idx), position,
                "INVARIANT VIOLATED: upward resolution of node {} disagrees",
                idx
            );
        });

        assert_eq!(count, self.len, "INVARIANT VIOLATED: reachable nodes={} != len={}", count, self.len);
        if self.root != NONE {
            assert_eq!(self.node(self.root).parent, NONE, "INVARIANT VIOLATED: root has a parent");
        }
    }
}

#[inline]
fn shift(value: u64, delta: i64) -> u64 {
    match value.checked_add_signed(delta) {
        Some(shifted) => shifted,
        None => panic!("pixel total {} cannot absorb {}", value, delta),
    }
}
