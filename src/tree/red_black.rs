//! Color-balanced (red-black) ordered index
//!
//! Nodes live in a dense arena and refer to each other by `u32` slot index,
//! with [`NIL`] marking an absent link. Child links carry the structure;
//! the parent index is a back-reference used only to climb during fixups,
//! so insert and delete rebalance iteratively instead of recursing.
//!
//! Removing a node frees its slot by moving the last slot into the hole.
//! Callers that keep side tables keyed by slot (see
//! [`crate::containers::BoundedOrderedQueue`]) observe every such move, and
//! the key hand-off of a two-child delete, through a relocation callback.

use super::range::RangeIterator;
use super::traits::{IndexKey, OrderedIndex, OrderedLookup, Side, TraverseOrder, TreeNavigator};
use crate::error::{Result, SylvaError};
use std::cmp::Ordering;
use std::fmt;
use std::mem;

/// Arena slot index
pub type NodeIdx = u32;

/// Absent link marker
pub const NIL: NodeIdx = u32::MAX;

/// Largest number of nodes one arena can address
pub const MAX_NODES: usize = NIL as usize;

/// Node color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// May not have a red child
    Red,
    /// Counts toward black height
    Black,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => f.write_str("red"),
            Color::Black => f.write_str("black"),
        }
    }
}

#[derive(Debug)]
struct RbNode<K> {
    key: K,
    color: Color,
    parent: NodeIdx,
    left: NodeIdx,
    right: NodeIdx,
}

impl<K> RbNode<K> {
    fn child(&self, side: Side) -> NodeIdx {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn child_mut(&mut self, side: Side) -> &mut NodeIdx {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Self-balancing binary search tree using red/black node colors
///
/// Guarantees a black root, no red node with a red child and equal black
/// height on every root-to-nil path, which bounds the height by
/// `2 * log2(n + 1)`.
///
/// # Examples
///
/// ```rust
/// use sylva::tree::{ColorBalancedIndex, OrderedIndex, OrderedLookup, TraverseOrder};
///
/// let mut tree = ColorBalancedIndex::from_sequence([5, 3, 8, 1, 4, 7, 9]).unwrap();
/// assert_eq!(tree.to_vec(TraverseOrder::InOrder), vec![1, 3, 4, 5, 7, 8, 9]);
/// assert!(tree.validate());
///
/// // smallest key >= 6, removed
/// assert_eq!(tree.pop_min(Some(&6), true).unwrap(), Some(7));
/// assert!(!tree.exist(&7));
/// ```
#[derive(Debug)]
pub struct ColorBalancedIndex<K> {
    nodes: Vec<RbNode<K>>,
    root: NodeIdx,
}

impl<K> Default for ColorBalancedIndex<K> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            root: NIL,
        }
    }
}

impl<K: IndexKey> ColorBalancedIndex<K> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: NIL,
        }
    }

    /// Build a tree by inserting `keys` in order; duplicates are skipped
    pub fn from_sequence<I: IntoIterator<Item = K>>(keys: I) -> Result<Self> {
        let mut tree = Self::new();
        for key in keys {
            tree.insert(key)?;
        }
        Ok(tree)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Smallest stored key
    pub fn min(&self) -> Option<&K> {
        self.peek_min(None)
    }

    /// Largest stored key
    pub fn max(&self) -> Option<&K> {
        self.peek_max(None)
    }

    /// Smallest key that is `>= at_least` (or the minimum when unbounded)
    pub fn peek_min(&self, at_least: Option<&K>) -> Option<&K> {
        let idx = self.lower_bound(at_least);
        (idx != NIL).then(|| &self.node(idx).key)
    }

    /// Largest key that is `<= at_most` (or the maximum when unbounded)
    pub fn peek_max(&self, at_most: Option<&K>) -> Option<&K> {
        let idx = self.upper_bound(at_most);
        (idx != NIL).then(|| &self.node(idx).key)
    }

    /// Smallest key `>= at_least`, removed from the tree when `delete` is set
    pub fn pop_min(&mut self, at_least: Option<&K>, delete: bool) -> Result<Option<K>>
    where
        K: Clone,
    {
        let idx = self.lower_bound(at_least);
        self.take_or_clone(idx, delete)
    }

    /// Largest key `<= at_most`, removed from the tree when `delete` is set
    pub fn pop_max(&mut self, at_most: Option<&K>, delete: bool) -> Result<Option<K>>
    where
        K: Clone,
    {
        let idx = self.upper_bound(at_most);
        self.take_or_clone(idx, delete)
    }

    /// Lazily walk the keys within `[from, to]` in `order`
    pub fn range(
        &self,
        from: Option<K>,
        to: Option<K>,
        order: TraverseOrder,
    ) -> Result<RangeIterator<'_, K, Self>> {
        RangeIterator::new(self, from, to, order)
    }

    /// Color of the node holding `key`
    pub fn color_of(&self, key: &K) -> Option<Color> {
        let idx = self.find(key);
        (idx != NIL).then(|| self.node(idx).color)
    }

    /// Slot holding `key`, or [`NIL`]
    pub(crate) fn find(&self, key: &K) -> NodeIdx {
        let mut cur = self.root;
        while cur != NIL {
            let node = self.node(cur);
            cur = match key.compare(&node.key) {
                Ordering::Equal => return cur,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        NIL
    }

    /// Key stored in a live slot
    pub(crate) fn key_of(&self, idx: NodeIdx) -> &K {
        &self.node(idx).key
    }

    /// Insert `key` and return the slot it landed in, `None` for a duplicate
    pub(crate) fn insert_node(&mut self, key: K) -> Result<Option<NodeIdx>> {
        if self.root == NIL {
            let idx = self.allocate(key, Color::Black, NIL)?;
            self.root = idx;
            return Ok(Some(idx));
        }

        let mut cur = self.root;
        let side = loop {
            let node = self.node(cur);
            let side = match key.compare(&node.key) {
                Ordering::Equal => return Ok(None),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            let next = node.child(side);
            if next == NIL {
                break side;
            }
            cur = next;
        };

        let idx = self.allocate(key, Color::Red, cur)?;
        *self.node_mut(cur).child_mut(side) = idx;
        self.fix_after_insert(idx)?;
        Ok(Some(idx))
    }

    /// Remove the node in slot `target` and return its key.
    ///
    /// `on_relocate(from, to)` fires whenever the entry that lived in slot
    /// `from` now lives in slot `to`: once when a two-child delete hands the
    /// successor's key to `target`, and once when the freed slot is refilled
    /// from the end of the arena.
    pub(crate) fn remove_node(
        &mut self,
        target: NodeIdx,
        on_relocate: &mut dyn FnMut(NodeIdx, NodeIdx),
    ) -> Result<K> {
        let mut doomed = target;
        let (left, right) = {
            let node = self.node(target);
            (node.left, node.right)
        };
        if left != NIL && right != NIL {
            let successor = self.leftmost(right);
            self.swap_keys(target, successor);
            on_relocate(successor, target);
            doomed = successor;
        }

        let (left, right, color) = {
            let node = self.node(doomed);
            (node.left, node.right, node.color)
        };
        let child = if left != NIL { left } else { right };

        if child != NIL {
            if color != Color::Black || self.color(child) != Color::Red {
                return Err(SylvaError::invariant(
                    "red-black: single child of a removed node must be a red child of a black node",
                ));
            }
            self.transplant(doomed, child);
            self.node_mut(child).color = Color::Black;
        } else if doomed == self.root {
            self.root = NIL;
        } else {
            if color == Color::Black {
                self.fix_before_delete(doomed)?;
            }
            let parent = self.node(doomed).parent;
            let side = self.side_of(doomed);
            *self.node_mut(parent).child_mut(side) = NIL;
        }

        Ok(self.release(doomed, on_relocate))
    }

    /// Number of arena slots in use
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn take_or_clone(&mut self, idx: NodeIdx, delete: bool) -> Result<Option<K>>
    where
        K: Clone,
    {
        if idx == NIL {
            return Ok(None);
        }
        if delete {
            self.remove_node(idx, &mut |_, _| {}).map(Some)
        } else {
            Ok(Some(self.node(idx).key.clone()))
        }
    }

    fn lower_bound(&self, at_least: Option<&K>) -> NodeIdx {
        let mut best = NIL;
        let mut cur = self.root;
        while cur != NIL {
            let node = self.node(cur);
            let fits = at_least.map_or(true, |low| node.key.compare(low) != Ordering::Less);
            if fits {
                best = cur;
                cur = node.left;
            } else {
                cur = node.right;
            }
        }
        best
    }

    fn upper_bound(&self, at_most: Option<&K>) -> NodeIdx {
        let mut best = NIL;
        let mut cur = self.root;
        while cur != NIL {
            let node = self.node(cur);
            let fits = at_most.map_or(true, |high| node.key.compare(high) != Ordering::Greater);
            if fits {
                best = cur;
                cur = node.right;
            } else {
                cur = node.left;
            }
        }
        best
    }

    /// Rebalance upward from a freshly attached red node
    fn fix_after_insert(&mut self, mut x: NodeIdx) -> Result<()> {
        loop {
            let parent = self.node(x).parent;
            if parent == NIL {
                self.node_mut(x).color = Color::Black;
                return Ok(());
            }
            if self.color(parent) == Color::Black {
                return Ok(());
            }

            let grand = self.node(parent).parent;
            if grand == NIL {
                return Err(SylvaError::invariant("red-black: red root during insert fixup"));
            }
            let parent_side = self.side_of(parent);
            let uncle = self.node(grand).child(parent_side.opposite());

            if self.color(uncle) == Color::Red {
                self.node_mut(parent).color = Color::Black;
                self.node_mut(uncle).color = Color::Black;
                self.node_mut(grand).color = Color::Red;
                x = grand;
                continue;
            }

            // Uncle black: straighten a zig-zag first, then one rotation at grand
            let mut top = parent;
            if self.side_of(x) != parent_side {
                self.rotate(parent, parent_side)?;
                top = x;
            }
            self.node_mut(top).color = Color::Black;
            self.node_mut(grand).color = Color::Red;
            self.rotate(grand, parent_side.opposite())?;
            return Ok(());
        }
    }

    /// Restore black height before detaching the black leaf `x`
    fn fix_before_delete(&mut self, mut x: NodeIdx) -> Result<()> {
        while x != self.root {
            let parent = self.node(x).parent;
            let side = self.side_of(x);
            let sibling = self.node(parent).child(side.opposite());
            if sibling == NIL {
                return Err(SylvaError::invariant(
                    "red-black: doubly black node without a sibling",
                ));
            }

            if self.color(sibling) == Color::Red {
                self.node_mut(sibling).color = Color::Black;
                self.node_mut(parent).color = Color::Red;
                self.rotate(parent, side)?;
                continue;
            }

            let close = self.node(sibling).child(side);
            let far = self.node(sibling).child(side.opposite());

            if self.color(far) == Color::Red {
                let parent_color = self.node(parent).color;
                self.node_mut(sibling).color = parent_color;
                self.node_mut(parent).color = Color::Black;
                self.node_mut(far).color = Color::Black;
                self.rotate(parent, side)?;
                return Ok(());
            }

            if self.color(close) == Color::Red {
                self.node_mut(close).color = Color::Black;
                self.node_mut(sibling).color = Color::Red;
                self.rotate(sibling, side.opposite())?;
                continue;
            }

            self.node_mut(sibling).color = Color::Red;
            if self.node(parent).color == Color::Red {
                self.node_mut(parent).color = Color::Black;
                return Ok(());
            }
            x = parent;
        }
        Ok(())
    }

    /// Rotate `x` down toward `toward`, lifting its opposite child
    fn rotate(&mut self, x: NodeIdx, toward: Side) -> Result<()> {
        let lift = toward.opposite();
        let pivot = self.node(x).child(lift);
        if pivot == NIL {
            return Err(SylvaError::invariant("red-black: rotation without a pivot child"));
        }

        let inner = self.node(pivot).child(toward);
        *self.node_mut(x).child_mut(lift) = inner;
        if inner != NIL {
            self.node_mut(inner).parent = x;
        }

        self.transplant(x, pivot);
        *self.node_mut(pivot).child_mut(toward) = x;
        self.node_mut(x).parent = pivot;
        Ok(())
    }

    /// Put `replacement` where `old` hangs from its parent (or at the root)
    fn transplant(&mut self, old: NodeIdx, replacement: NodeIdx) {
        let parent = self.node(old).parent;
        if parent == NIL {
            self.root = replacement;
        } else {
            let side = self.side_of(old);
            *self.node_mut(parent).child_mut(side) = replacement;
        }
        if replacement != NIL {
            self.node_mut(replacement).parent = parent;
        }
    }

    fn allocate(&mut self, key: K, color: Color, parent: NodeIdx) -> Result<NodeIdx> {
        if self.nodes.len() >= MAX_NODES {
            return Err(SylvaError::capacity_exceeded(MAX_NODES));
        }
        let idx = self.nodes.len() as NodeIdx;
        self.nodes.push(RbNode {
            key,
            color,
            parent,
            left: NIL,
            right: NIL,
        });
        Ok(idx)
    }

    /// Drop a detached slot, refilling the hole from the end of the arena
    fn release(&mut self, idx: NodeIdx, on_relocate: &mut dyn FnMut(NodeIdx, NodeIdx)) -> K {
        let last = (self.nodes.len() - 1) as NodeIdx;
        let removed = self.nodes.swap_remove(idx as usize);
        if idx == last {
            return removed.key;
        }

        let (parent, left, right) = {
            let moved = self.node(idx);
            (moved.parent, moved.left, moved.right)
        };
        if parent == NIL {
            self.root = idx;
        } else {
            let node = self.node_mut(parent);
            if node.left == last {
                node.left = idx;
            } else {
                node.right = idx;
            }
        }
        if left != NIL {
            self.node_mut(left).parent = idx;
        }
        if right != NIL {
            self.node_mut(right).parent = idx;
        }
        on_relocate(last, idx);
        removed.key
    }

    fn swap_keys(&mut self, a: NodeIdx, b: NodeIdx) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(hi as usize);
        mem::swap(&mut head[lo as usize].key, &mut tail[0].key);
    }

    fn leftmost(&self, mut idx: NodeIdx) -> NodeIdx {
        loop {
            let left = self.node(idx).left;
            if left == NIL {
                return idx;
            }
            idx = left;
        }
    }

    fn side_of(&self, idx: NodeIdx) -> Side {
        let parent = self.node(idx).parent;
        if self.node(parent).left == idx {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// nil counts as black
    fn color(&self, idx: NodeIdx) -> Color {
        if idx == NIL {
            Color::Black
        } else {
            self.node(idx).color
        }
    }

    #[inline]
    fn node(&self, idx: NodeIdx) -> &RbNode<K> {
        &self.nodes[idx as usize]
    }

    #[inline]
    fn node_mut(&mut self, idx: NodeIdx) -> &mut RbNode<K> {
        &mut self.nodes[idx as usize]
    }

    fn subtree_height(&self, idx: NodeIdx) -> usize {
        if idx == NIL {
            return 0;
        }
        let node = self.node(idx);
        1 + self.subtree_height(node.left).max(self.subtree_height(node.right))
    }

    /// Black height of a valid subtree, `None` on the first violation
    fn validate_subtree(
        &self,
        idx: NodeIdx,
        parent: NodeIdx,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> Option<usize> {
        if idx == NIL {
            return Some(1);
        }
        let node = self.node(idx);
        if node.parent != parent {
            return None;
        }
        if lower.is_some_and(|low| node.key.compare(low) != Ordering::Greater) {
            return None;
        }
        if upper.is_some_and(|high| node.key.compare(high) != Ordering::Less) {
            return None;
        }
        if node.color == Color::Red
            && (self.color(node.left) == Color::Red || self.color(node.right) == Color::Red)
        {
            return None;
        }

        let left = self.validate_subtree(node.left, idx, lower, Some(&node.key))?;
        let right = self.validate_subtree(node.right, idx, Some(&node.key), upper)?;
        if left != right {
            return None;
        }
        Some(left + usize::from(node.color == Color::Black))
    }

    fn walk(
        &self,
        idx: NodeIdx,
        visitor: &mut dyn FnMut(&K) -> bool,
        order: TraverseOrder,
    ) -> bool {
        if idx == NIL {
            return true;
        }
        let node = self.node(idx);
        let (left, right) = (node.left, node.right);
        match order {
            TraverseOrder::PreOrder => {
                visitor(&node.key)
                    && self.walk(left, visitor, order)
                    && self.walk(right, visitor, order)
            }
            TraverseOrder::InOrder => {
                self.walk(left, visitor, order)
                    && visitor(&node.key)
                    && self.walk(right, visitor, order)
            }
            TraverseOrder::PostOrder => {
                self.walk(left, visitor, order)
                    && self.walk(right, visitor, order)
                    && visitor(&node.key)
            }
            TraverseOrder::ReversedOrder => {
                self.walk(right, visitor, order)
                    && visitor(&node.key)
                    && self.walk(left, visitor, order)
            }
        }
    }
}

impl<K: IndexKey> OrderedLookup<K> for ColorBalancedIndex<K> {
    fn height(&self) -> usize {
        self.subtree_height(self.root)
    }

    fn size(&self) -> usize {
        self.nodes.len()
    }

    fn exist(&self, key: &K) -> bool {
        self.find(key) != NIL
    }

    fn validate(&self) -> bool {
        if self.root == NIL {
            return self.nodes.is_empty();
        }
        if self.node(self.root).color != Color::Black {
            return false;
        }
        self.validate_subtree(self.root, NIL, None, None).is_some()
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K) -> bool, order: TraverseOrder) {
        self.walk(self.root, visitor, order);
    }

    fn pretty_print(&self) -> String {
        super::pretty::render(self)
    }
}

impl<K: IndexKey> OrderedIndex<K> for ColorBalancedIndex<K> {
    fn insert(&mut self, key: K) -> Result<bool> {
        Ok(self.insert_node(key)?.is_some())
    }

    fn delete(&mut self, key: &K) -> Result<bool> {
        let idx = self.find(key);
        if idx == NIL {
            return Ok(false);
        }
        self.remove_node(idx, &mut |_, _| {})?;
        Ok(true)
    }
}

impl<K: IndexKey> TreeNavigator<K> for ColorBalancedIndex<K> {
    type Cursor<'a> = NodeIdx where Self: 'a;

    fn root_cursor(&self) -> Option<NodeIdx> {
        (self.root != NIL).then_some(self.root)
    }

    fn child<'a>(&'a self, at: NodeIdx, side: Side) -> Option<NodeIdx> {
        let child = self.node(at).child(side);
        (child != NIL).then_some(child)
    }

    fn key_at<'a>(&'a self, at: NodeIdx) -> &'a K {
        &self.node(at).key
    }

    fn label_at<'a>(&'a self, at: NodeIdx) -> String
    where
        K: 'a,
    {
        let node = self.node(at);
        format!("{} ({})", node.key.to_display_string(), node.color)
    }
}

impl<K: IndexKey> fmt::Display for ColorBalancedIndex<K> {
    /// `inorder: [..], preorder: [..]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::avl::write_orders(self, f)
    }
}
