//! Bounded, cancellable range cursor over any ordered tree
//!
//! The cursor keeps an explicit stack of pending frames instead of running a
//! traversal worker: each call to `next` resumes the walk exactly where the
//! previous one stopped and suspends again at the next qualifying key, so
//! nothing is computed ahead of the consumer.
//!
//! Subtrees that cannot hold an in-range key are never pushed. For the two
//! sorted orders the walk also ends as soon as it passes the far bound.

use super::traits::{IndexKey, Side, TraverseOrder, TreeNavigator};
use crate::error::{Result, SylvaError};
use std::cmp::Ordering;
use std::iter::FusedIterator;

enum Frame<C> {
    /// Node whose children have not been scheduled yet
    Expand(C),
    /// Node whose key is due next
    Emit(C),
}

/// Lazily produced, finite, non-restartable sequence of keys in `[from, to]`
///
/// # Examples
///
/// ```rust
/// use sylva::tree::{ColorBalancedIndex, RangeIterator, TraverseOrder};
///
/// let tree = ColorBalancedIndex::from_sequence(1..=10).unwrap();
/// let keys: Vec<i32> = RangeIterator::new(&tree, Some(3), Some(7), TraverseOrder::InOrder)
///     .unwrap()
///     .copied()
///     .collect();
/// assert_eq!(keys, vec![3, 4, 5, 6, 7]);
///
/// assert!(RangeIterator::new(&tree, Some(8), Some(2), TraverseOrder::InOrder).is_err());
/// ```
pub struct RangeIterator<'a, K, T>
where
    T: TreeNavigator<K> + ?Sized + 'a,
{
    tree: &'a T,
    from: Option<K>,
    to: Option<K>,
    order: TraverseOrder,
    stack: Vec<Frame<T::Cursor<'a>>>,
    closed: bool,
}

impl<'a, K, T> RangeIterator<'a, K, T>
where
    K: IndexKey + 'a,
    T: TreeNavigator<K> + ?Sized + 'a,
{
    /// Create a cursor over `tree`; fails with `InvalidBound` when `from > to`
    pub fn new(tree: &'a T, from: Option<K>, to: Option<K>, order: TraverseOrder) -> Result<Self> {
        if let (Some(low), Some(high)) = (&from, &to) {
            if low.compare(high) == Ordering::Greater {
                return Err(SylvaError::invalid_bound(
                    low.to_display_string(),
                    high.to_display_string(),
                ));
            }
        }

        let stack = tree.root_cursor().map(Frame::Expand).into_iter().collect();
        Ok(Self {
            tree,
            from,
            to,
            order,
            stack,
            closed: false,
        })
    }

    /// Cursor over every key of `tree`
    pub fn unbounded(tree: &'a T, order: TraverseOrder) -> Self {
        let stack = tree.root_cursor().map(Frame::Expand).into_iter().collect();
        Self {
            tree,
            from: None,
            to: None,
            order,
            stack,
            closed: false,
        }
    }

    /// Stop the walk; every later `next` returns `None`. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
        self.stack.clear();
    }

    /// `false` once the cursor was closed, explicitly or by running out
    ///
    /// A `true` answer does not promise another key: the pending frames may
    /// all turn out to be outside the range.
    pub fn has_next(&self) -> bool {
        !self.closed
    }

    /// Order this cursor walks in
    pub fn order(&self) -> TraverseOrder {
        self.order
    }

    fn below_from(&self, key: &K) -> bool {
        self.from
            .as_ref()
            .is_some_and(|low| key.compare(low) == Ordering::Less)
    }

    fn above_to(&self, key: &K) -> bool {
        self.to
            .as_ref()
            .is_some_and(|high| key.compare(high) == Ordering::Greater)
    }

    fn expand(&mut self, at: T::Cursor<'a>) {
        let key = self.tree.key_at(at);
        // left holds only keys < key, right only keys > key
        let skip_left = self
            .from
            .as_ref()
            .is_some_and(|low| key.compare(low) != Ordering::Greater);
        let skip_right = self
            .to
            .as_ref()
            .is_some_and(|high| key.compare(high) != Ordering::Less);

        let left = if skip_left { None } else { self.tree.child(at, Side::Left) };
        let right = if skip_right { None } else { self.tree.child(at, Side::Right) };
        let (left, right) = (left.map(Frame::Expand), right.map(Frame::Expand));

        // pushed in reverse visiting order
        let emit = Some(Frame::Emit(at));
        let frames = match self.order {
            TraverseOrder::PreOrder => [right, left, emit],
            TraverseOrder::InOrder => [right, emit, left],
            TraverseOrder::PostOrder => [emit, right, left],
            TraverseOrder::ReversedOrder => [left, emit, right],
        };
        self.stack.extend(frames.into_iter().flatten());
    }
}

impl<'a, K, T> Iterator for RangeIterator<'a, K, T>
where
    K: IndexKey + 'a,
    T: TreeNavigator<K> + ?Sized + 'a,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }

        while let Some(frame) = self.stack.pop() {
            let at = match frame {
                Frame::Expand(at) => {
                    self.expand(at);
                    continue;
                }
                Frame::Emit(at) => at,
            };

            let key = self.tree.key_at(at);
            if self.below_from(key) {
                if self.order == TraverseOrder::ReversedOrder {
                    break;
                }
                continue;
            }
            if self.above_to(key) {
                if self.order == TraverseOrder::InOrder {
                    break;
                }
                continue;
            }
            return Some(key);
        }

        self.close();
        None
    }
}

impl<'a, K, T> FusedIterator for RangeIterator<'a, K, T>
where
    K: IndexKey + 'a,
    T: TreeNavigator<K> + ?Sized + 'a,
{
}
