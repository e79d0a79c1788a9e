//! Core ordered-index traits and abstractions
//!
//! Every structure in [`crate::tree`] stores keys through [`IndexKey`] and
//! exposes its read side through [`OrderedLookup`]. Structures that accept
//! arbitrary point deletes additionally implement [`OrderedIndex`], so code
//! written against the trait can swap the balancing strategy freely.

use crate::error::Result;
use std::cmp::Ordering;
use std::fmt;

/// Ordering contract every stored key satisfies
///
/// `compare` must form a strict total order; keys comparing `Equal` are
/// treated as duplicates and rejected on insert. Any `Ord + Debug` type gets
/// this for free, custom orderings go through a newtype.
pub trait IndexKey {
    /// Three-way comparison against another key
    fn compare(&self, other: &Self) -> Ordering;

    /// Human-readable rendering used in diagnostics and error messages
    fn to_display_string(&self) -> String;
}

impl<T: Ord + fmt::Debug> IndexKey for T {
    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn to_display_string(&self) -> String {
        format!("{:?}", self)
    }
}

/// Order in which a traversal visits nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TraverseOrder {
    /// parent-left-right
    PreOrder,
    /// left-parent-right, ascending key order
    #[default]
    InOrder,
    /// left-right-parent
    PostOrder,
    /// right-parent-left, descending key order
    ReversedOrder,
}

/// Child direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Smaller keys
    Left,
    /// Larger keys
    Right,
}

impl Side {
    /// The other side
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Read-only capability set shared by every ordered structure
pub trait OrderedLookup<K: IndexKey> {
    /// Height of the tree, 0 when empty
    fn height(&self) -> usize;

    /// Number of stored keys
    fn size(&self) -> usize;

    /// Whether `key` is stored
    fn exist(&self, key: &K) -> bool;

    /// Recompute the structural invariants from scratch
    ///
    /// Pure and O(n); meant for tests and diagnostics, not the hot path.
    fn validate(&self) -> bool;

    /// Visit every key in `order` until the visitor returns `false`
    fn traverse(&self, visitor: &mut dyn FnMut(&K) -> bool, order: TraverseOrder);

    /// Indented box-drawing rendering of the tree shape
    fn pretty_print(&self) -> String;

    /// Whether no keys are stored
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Snapshot of all keys in `order`
    fn to_vec(&self, order: TraverseOrder) -> Vec<K>
    where
        K: Clone,
    {
        let mut out = Vec::with_capacity(self.size());
        self.traverse(
            &mut |key| {
                out.push(key.clone());
                true
            },
            order,
        );
        out
    }
}

/// Full ordered-index facade: lookup plus caller-driven insert and delete
///
/// `insert` returns `Ok(false)` for a key already present and `delete`
/// returns `Ok(false)` for an absent key. `Err` is reserved for structural
/// corruption detected while rebalancing.
pub trait OrderedIndex<K: IndexKey>: OrderedLookup<K> {
    /// Insert a key, keeping the tree balanced
    fn insert(&mut self, key: K) -> Result<bool>;

    /// Remove a key, keeping the tree balanced
    fn delete(&mut self, key: &K) -> Result<bool>;
}

/// Structural navigation used by cursors and renderers
///
/// A cursor is a cheap copyable handle to one node, valid for as long as
/// the tree is borrowed.
pub trait TreeNavigator<K> {
    /// Handle to a node
    type Cursor<'a>: Copy
    where
        Self: 'a;

    /// Handle to the root, `None` for an empty tree
    fn root_cursor(&self) -> Option<Self::Cursor<'_>>;

    /// Handle to a child of `at`
    fn child<'a>(&'a self, at: Self::Cursor<'a>, side: Side) -> Option<Self::Cursor<'a>>;

    /// Key stored at `at`
    fn key_at<'a>(&'a self, at: Self::Cursor<'a>) -> &'a K;

    /// Label shown by [`crate::tree::pretty::render`]
    fn label_at<'a>(&'a self, at: Self::Cursor<'a>) -> String
    where
        K: IndexKey + 'a,
    {
        self.key_at(at).to_display_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Reverse(i32);

    // Newtypes that are not Ord implement the contract by hand
    impl IndexKey for Reverse {
        fn compare(&self, other: &Self) -> Ordering {
            other.0.cmp(&self.0)
        }
        fn to_display_string(&self) -> String {
            format!("rev({})", self.0)
        }
    }

    #[test]
    fn test_blanket_key_impl() {
        assert_eq!(3i32.compare(&5), Ordering::Less);
        assert_eq!("b".compare(&"a"), Ordering::Greater);
        assert_eq!(7u64.compare(&7), Ordering::Equal);
        assert_eq!(42i32.to_display_string(), "42");
        assert_eq!("x".to_string().to_display_string(), "\"x\"");
    }

    #[test]
    fn test_custom_key() {
        assert_eq!(Reverse(1).compare(&Reverse(2)), Ordering::Greater);
        assert_eq!(Reverse(9).to_display_string(), "rev(9)");
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::Right.opposite(), Side::Left);
        assert_eq!(TraverseOrder::default(), TraverseOrder::InOrder);
    }
}
