//! Height-balanced (AVL) ordered index
//!
//! Each node carries a three-state balance factor instead of a stored
//! height. Inserts and deletes recurse down to the target and report on the
//! way back up whether the visited subtree grew taller (insert) or shorter
//! (delete); parents fold that into their own factor and rotate when it
//! would reach magnitude two.
//!
//! A single or double rotation always absorbs an insert. On delete a
//! rotation may still leave the subtree one level shorter, so the shrink can
//! propagate all the way to the root.

use super::range::RangeIterator;
use super::traits::{IndexKey, OrderedIndex, OrderedLookup, Side, TraverseOrder, TreeNavigator};
use crate::error::{Result, SylvaError};
use std::cmp::Ordering;
use std::fmt;
use std::mem;

type Link<K> = Option<Box<AvlNode<K>>>;

/// Which subtree is taller, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Balance {
    LeftHeavy,
    Even,
    RightHeavy,
}

/// Tree node owning both subtrees
#[derive(Debug)]
pub struct AvlNode<K> {
    key: K,
    left: Link<K>,
    right: Link<K>,
    balance: Balance,
}

impl<K> AvlNode<K> {
    fn leaf(key: K) -> Self {
        Self {
            key,
            left: None,
            right: None,
            balance: Balance::Even,
        }
    }

    fn child(&self, side: Side) -> Option<&AvlNode<K>> {
        match side {
            Side::Left => self.left.as_deref(),
            Side::Right => self.right.as_deref(),
        }
    }
}

/// Self-balancing binary search tree keeping |height(left) - height(right)| <= 1
///
/// # Examples
///
/// ```rust
/// use sylva::tree::{HeightBalancedIndex, OrderedIndex, OrderedLookup, TraverseOrder};
///
/// let mut tree = HeightBalancedIndex::from_sequence([5, 3, 8, 1]).unwrap();
/// assert!(tree.insert(4).unwrap());
/// assert!(!tree.insert(4).unwrap()); // duplicate
/// assert!(tree.delete(&3).unwrap());
/// assert_eq!(tree.to_vec(TraverseOrder::InOrder), vec![1, 4, 5, 8]);
/// assert!(tree.validate());
/// ```
#[derive(Debug)]
pub struct HeightBalancedIndex<K> {
    root: Link<K>,
    size: usize,
}

impl<K> Default for HeightBalancedIndex<K> {
    fn default() -> Self {
        Self { root: None, size: 0 }
    }
}

impl<K: IndexKey> HeightBalancedIndex<K> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
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
        self.size
    }

    /// Smallest stored key
    pub fn min(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(&node.key)
    }

    /// Largest stored key
    pub fn max(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(&node.key)
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

    fn search(&self, key: &K) -> Option<&AvlNode<K>> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.compare(&node.key) {
                Ordering::Equal => return Some(node),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }
}

impl<K: IndexKey> OrderedLookup<K> for HeightBalancedIndex<K> {
    fn height(&self) -> usize {
        subtree_height(&self.root)
    }

    fn size(&self) -> usize {
        self.size
    }

    fn exist(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    fn validate(&self) -> bool {
        validate_subtree(&self.root, None, None).is_some()
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K) -> bool, order: TraverseOrder) {
        walk(&self.root, visitor, order);
    }

    fn pretty_print(&self) -> String {
        super::pretty::render(self)
    }
}

impl<K: IndexKey> OrderedIndex<K> for HeightBalancedIndex<K> {
    fn insert(&mut self, key: K) -> Result<bool> {
        let (inserted, _) = insert_at(&mut self.root, key)?;
        if inserted {
            self.size += 1;
        }
        Ok(inserted)
    }

    fn delete(&mut self, key: &K) -> Result<bool> {
        let (removed, _) = delete_at(&mut self.root, key)?;
        if removed {
            self.size -= 1;
        }
        Ok(removed)
    }
}

impl<K: IndexKey> TreeNavigator<K> for HeightBalancedIndex<K> {
    type Cursor<'a> = &'a AvlNode<K> where Self: 'a;

    fn root_cursor(&self) -> Option<Self::Cursor<'_>> {
        self.root.as_deref()
    }

    fn child<'a>(&'a self, at: Self::Cursor<'a>, side: Side) -> Option<Self::Cursor<'a>> {
        at.child(side)
    }

    fn key_at<'a>(&'a self, at: Self::Cursor<'a>) -> &'a K {
        &at.key
    }
}

impl<K: IndexKey> fmt::Display for HeightBalancedIndex<K> {
    /// `inorder: [..], preorder: [..]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_orders(self, f)
    }
}

/// Shared `Display` body for the tree types
pub(crate) fn write_orders<K: IndexKey, T: OrderedLookup<K> + ?Sized>(
    tree: &T,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let render = |order| {
        let mut parts = Vec::with_capacity(tree.size());
        tree.traverse(
            &mut |key| {
                parts.push(key.to_display_string());
                true
            },
            order,
        );
        parts.join(" ")
    };
    let inorder = render(TraverseOrder::InOrder);
    let preorder = render(TraverseOrder::PreOrder);
    write!(f, "inorder: [{}], preorder: [{}]", inorder, preorder)
}

/// Returns `(inserted, grew_taller)`
fn insert_at<K: IndexKey>(link: &mut Link<K>, key: K) -> Result<(bool, bool)> {
    let node = match link {
        Some(node) => node,
        None => {
            *link = Some(Box::new(AvlNode::leaf(key)));
            return Ok((true, true));
        }
    };

    match key.compare(&node.key) {
        Ordering::Equal => Ok((false, false)),
        Ordering::Less => {
            let (inserted, taller) = insert_at(&mut node.left, key)?;
            if !taller {
                return Ok((inserted, false));
            }
            match node.balance {
                Balance::LeftHeavy => {
                    rebalance_left(node)?;
                    Ok((true, false))
                }
                Balance::Even => {
                    node.balance = Balance::LeftHeavy;
                    Ok((true, true))
                }
                Balance::RightHeavy => {
                    node.balance = Balance::Even;
                    Ok((true, false))
                }
            }
        }
        Ordering::Greater => {
            let (inserted, taller) = insert_at(&mut node.right, key)?;
            if !taller {
                return Ok((inserted, false));
            }
            match node.balance {
                Balance::RightHeavy => {
                    rebalance_right(node)?;
                    Ok((true, false))
                }
                Balance::Even => {
                    node.balance = Balance::RightHeavy;
                    Ok((true, true))
                }
                Balance::LeftHeavy => {
                    node.balance = Balance::Even;
                    Ok((true, false))
                }
            }
        }
    }
}

/// Returns `(removed, grew_shorter)`
fn delete_at<K: IndexKey>(link: &mut Link<K>, key: &K) -> Result<(bool, bool)> {
    let Some(node) = link.as_mut() else {
        return Ok((false, false));
    };

    match key.compare(&node.key) {
        Ordering::Less => {
            let (removed, shorter) = delete_at(&mut node.left, key)?;
            if !shorter {
                return Ok((removed, false));
            }
            Ok((true, left_shrunk(node)?))
        }
        Ordering::Greater => {
            let (removed, shorter) = delete_at(&mut node.right, key)?;
            if !shorter {
                return Ok((removed, false));
            }
            Ok((true, right_shrunk(node)?))
        }
        Ordering::Equal => {
            if node.left.is_none() {
                let right = node.right.take();
                *link = right;
                return Ok((true, true));
            }
            if node.right.is_none() {
                let left = node.left.take();
                *link = left;
                return Ok((true, true));
            }
            // Two children: the in-order successor's key takes this slot
            let (successor, shorter) = take_min(&mut node.right)?;
            node.key = successor;
            if !shorter {
                return Ok((true, false));
            }
            Ok((true, right_shrunk(node)?))
        }
    }
}

/// Detach the leftmost node of a non-empty subtree; returns `(key, grew_shorter)`
fn take_min<K: IndexKey>(link: &mut Link<K>) -> Result<(K, bool)> {
    let node = link
        .as_mut()
        .ok_or_else(|| SylvaError::invariant("avl: successor search reached an empty subtree"))?;

    if node.left.is_some() {
        let (key, shorter) = take_min(&mut node.left)?;
        let shorter = if shorter { left_shrunk(node)? } else { false };
        return Ok((key, shorter));
    }

    let mut detached = link
        .take()
        .ok_or_else(|| SylvaError::invariant("avl: successor vanished during detach"))?;
    *link = detached.right.take();
    Ok((detached.key, true))
}

/// Left subtree lost a level; returns whether `node` did too
fn left_shrunk<K>(node: &mut Box<AvlNode<K>>) -> Result<bool> {
    match node.balance {
        Balance::LeftHeavy => {
            node.balance = Balance::Even;
            Ok(true)
        }
        Balance::Even => {
            node.balance = Balance::RightHeavy;
            Ok(false)
        }
        Balance::RightHeavy => rebalance_right(node),
    }
}

/// Right subtree lost a level; returns whether `node` did too
fn right_shrunk<K>(node: &mut Box<AvlNode<K>>) -> Result<bool> {
    match node.balance {
        Balance::RightHeavy => {
            node.balance = Balance::Even;
            Ok(true)
        }
        Balance::Even => {
            node.balance = Balance::LeftHeavy;
            Ok(false)
        }
        Balance::LeftHeavy => rebalance_left(node),
    }
}

/// Restore balance at a left-heavy node whose left side is now two levels taller.
///
/// Returns whether the subtree ended up one level shorter than before the
/// overflow; only the even-child case (reachable on delete) keeps the height.
fn rebalance_left<K>(node: &mut Box<AvlNode<K>>) -> Result<bool> {
    let left = node
        .left
        .as_mut()
        .ok_or_else(|| SylvaError::invariant("avl: left-heavy node without left child"))?;

    match left.balance {
        Balance::LeftHeavy => {
            left.balance = Balance::Even;
            node.balance = Balance::Even;
            rotate_right(node)?;
            Ok(true)
        }
        Balance::RightHeavy => {
            let inner = left
                .right
                .as_mut()
                .ok_or_else(|| SylvaError::invariant("avl: zig-zag without inner grandchild"))?;
            let (node_balance, left_balance) = match inner.balance {
                Balance::LeftHeavy => (Balance::RightHeavy, Balance::Even),
                Balance::RightHeavy => (Balance::Even, Balance::LeftHeavy),
                Balance::Even => (Balance::Even, Balance::Even),
            };
            inner.balance = Balance::Even;
            left.balance = left_balance;
            rotate_left(left)?;
            node.balance = node_balance;
            rotate_right(node)?;
            Ok(true)
        }
        Balance::Even => {
            left.balance = Balance::RightHeavy;
            node.balance = Balance::LeftHeavy;
            rotate_right(node)?;
            Ok(false)
        }
    }
}

/// Mirror of [`rebalance_left`]
fn rebalance_right<K>(node: &mut Box<AvlNode<K>>) -> Result<bool> {
    let right = node
        .right
        .as_mut()
        .ok_or_else(|| SylvaError::invariant("avl: right-heavy node without right child"))?;

    match right.balance {
        Balance::RightHeavy => {
            right.balance = Balance::Even;
            node.balance = Balance::Even;
            rotate_left(node)?;
            Ok(true)
        }
        Balance::LeftHeavy => {
            let inner = right
                .left
                .as_mut()
                .ok_or_else(|| SylvaError::invariant("avl: zig-zag without inner grandchild"))?;
            let (node_balance, right_balance) = match inner.balance {
                Balance::RightHeavy => (Balance::LeftHeavy, Balance::Even),
                Balance::LeftHeavy => (Balance::Even, Balance::RightHeavy),
                Balance::Even => (Balance::Even, Balance::Even),
            };
            inner.balance = Balance::Even;
            right.balance = right_balance;
            rotate_right(right)?;
            node.balance = node_balance;
            rotate_left(node)?;
            Ok(true)
        }
        Balance::Even => {
            right.balance = Balance::LeftHeavy;
            node.balance = Balance::RightHeavy;
            rotate_left(node)?;
            Ok(false)
        }
    }
}

/// Lift the left child into `node`'s slot
fn rotate_right<K>(node: &mut Box<AvlNode<K>>) -> Result<()> {
    let mut pivot = node
        .left
        .take()
        .ok_or_else(|| SylvaError::invariant("avl: right rotation without left child"))?;
    node.left = pivot.right.take();
    mem::swap(node, &mut pivot);
    node.right = Some(pivot);
    Ok(())
}

/// Lift the right child into `node`'s slot
fn rotate_left<K>(node: &mut Box<AvlNode<K>>) -> Result<()> {
    let mut pivot = node
        .right
        .take()
        .ok_or_else(|| SylvaError::invariant("avl: left rotation without right child"))?;
    node.right = pivot.left.take();
    mem::swap(node, &mut pivot);
    node.left = Some(pivot);
    Ok(())
}

fn subtree_height<K>(link: &Link<K>) -> usize {
    match link {
        None => 0,
        Some(node) => 1 + subtree_height(&node.left).max(subtree_height(&node.right)),
    }
}

/// Height of a valid subtree, `None` on the first violation found.
///
/// Checks key bounds, |Δheight| <= 1 and that the stored balance factor
/// agrees with the recomputed heights.
fn validate_subtree<K: IndexKey>(
    link: &Link<K>,
    lower: Option<&K>,
    upper: Option<&K>,
) -> Option<usize> {
    let Some(node) = link else {
        return Some(0);
    };
    if lower.is_some_and(|low| node.key.compare(low) != Ordering::Greater) {
        return None;
    }
    if upper.is_some_and(|high| node.key.compare(high) != Ordering::Less) {
        return None;
    }

    let left = validate_subtree(&node.left, lower, Some(&node.key))?;
    let right = validate_subtree(&node.right, Some(&node.key), upper)?;
    let expected = match left.cmp(&right) {
        Ordering::Greater if left - right == 1 => Balance::LeftHeavy,
        Ordering::Less if right - left == 1 => Balance::RightHeavy,
        Ordering::Equal => Balance::Even,
        _ => return None,
    };
    if expected != node.balance {
        return None;
    }
    Some(1 + left.max(right))
}

/// Returns `false` once the visitor asked to stop
fn walk<K>(link: &Link<K>, visitor: &mut dyn FnMut(&K) -> bool, order: TraverseOrder) -> bool {
    let Some(node) = link else {
        return true;
    };
    match order {
        TraverseOrder::PreOrder => {
            visitor(&node.key)
                && walk(&node.left, visitor, order)
                && walk(&node.right, visitor, order)
        }
        TraverseOrder::InOrder => {
            walk(&node.left, visitor, order)
                && visitor(&node.key)
                && walk(&node.right, visitor, order)
        }
        TraverseOrder::PostOrder => {
            walk(&node.left, visitor, order)
                && walk(&node.right, visitor, order)
                && visitor(&node.key)
        }
        TraverseOrder::ReversedOrder => {
            walk(&node.right, visitor, order)
                && visitor(&node.key)
                && walk(&node.left, visitor, order)
        }
    }
}
