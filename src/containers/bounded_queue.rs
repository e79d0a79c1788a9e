//! Capacity-bounded FIFO over a searchable ordered index
//!
//! A [`BoundedOrderedQueue`] is a [`ColorBalancedIndex`] whose nodes are also
//! threaded on an insertion-order chain. Once the queue is full every new
//! key evicts the oldest one, so the structure answers ordered lookups over
//! a sliding window of the most recent `capacity` keys.
//!
//! The chain links live in a side table parallel to the tree arena and are
//! addressed by the same slot index. When the tree moves an entry between
//! slots during a delete it reports the move, and the chain follows.

use crate::config::{Config, QueueConfig};
use crate::error::{Result, SylvaError};
use crate::tree::red_black::{NodeIdx, NIL};
use crate::tree::{
    ColorBalancedIndex, IndexKey, OrderedLookup, RangeIterator, Side, TraverseOrder, TreeNavigator,
};
use log::{debug, trace};
use std::fmt;

/// Slots reserved up front; larger queues grow on demand
const PREALLOCATE_LIMIT: usize = 64 * 1024;

/// Result of [`BoundedOrderedQueue::insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<K> {
    /// Stored without displacing anything
    Inserted,
    /// Stored after evicting the oldest key, which is returned
    Evicted(K),
    /// Already present; nothing changed
    Duplicate,
}

impl<K> InsertOutcome<K> {
    /// Whether the key was newly stored
    pub fn is_inserted(&self) -> bool {
        !matches!(self, InsertOutcome::Duplicate)
    }

    /// The key that made room, if any
    pub fn evicted(self) -> Option<K> {
        match self {
            InsertOutcome::Evicted(key) => Some(key),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ChainLink {
    /// Next older entry
    prev: NodeIdx,
    /// Next newer entry
    next: NodeIdx,
}

/// Insertion-ordered, capacity-bounded, binary-searchable queue
///
/// Only insert, evict and search are offered: it implements
/// [`OrderedLookup`] but not [`crate::tree::OrderedIndex`], and [`delete`](Self::delete)
/// is refused.
///
/// # Examples
///
/// ```rust
/// use sylva::containers::{BoundedOrderedQueue, InsertOutcome};
/// use sylva::tree::OrderedLookup;
///
/// let mut queue = BoundedOrderedQueue::new(3).unwrap();
/// for key in ["a", "b", "c"] {
///     queue.insert(key).unwrap();
/// }
/// assert_eq!(queue.insert("d").unwrap(), InsertOutcome::Evicted("a"));
/// assert!(!queue.exist(&"a"));
/// assert_eq!(queue.size(), 3);
/// ```
pub struct BoundedOrderedQueue<K> {
    tree: ColorBalancedIndex<K>,
    links: Vec<ChainLink>,
    /// Oldest entry
    head: NodeIdx,
    /// Newest entry
    tail: NodeIdx,
    config: QueueConfig,
}

impl<K: IndexKey> BoundedOrderedQueue<K> {
    /// Create an empty queue holding at most `capacity` keys
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(QueueConfig::with_capacity(capacity))
    }

    /// Create an empty queue from a validated configuration
    pub fn with_config(config: QueueConfig) -> Result<Self> {
        config.validate()?;
        debug!("bounded ordered queue created with capacity {}", config.capacity);
        let reserve = config.capacity.min(PREALLOCATE_LIMIT);
        Ok(Self {
            tree: ColorBalancedIndex::with_capacity(reserve),
            links: Vec::with_capacity(reserve),
            head: NIL,
            tail: NIL,
            config,
        })
    }

    /// Build a queue by inserting `keys` in order; only the last
    /// `capacity` distinct keys survive
    pub fn from_sequence<I: IntoIterator<Item = K>>(keys: I, capacity: usize) -> Result<Self> {
        let mut queue = Self::new(capacity)?;
        for key in keys {
            queue.insert(key)?;
        }
        Ok(queue)
    }

    /// Maximum number of keys held at once
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Configuration in effect
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the next new key will evict
    pub fn is_full(&self) -> bool {
        self.len() >= self.config.capacity
    }

    /// Insert `key`, evicting the oldest entry first when full
    ///
    /// A key that is already present is left alone and evicts nothing.
    pub fn insert(&mut self, key: K) -> Result<InsertOutcome<K>> {
        if self.tree.exist(&key) {
            return Ok(InsertOutcome::Duplicate);
        }

        let evicted = if self.is_full() {
            Some(self.evict_oldest()?)
        } else {
            None
        };

        let idx = match self.tree.insert_node(key)? {
            Some(idx) => idx,
            None => {
                return Err(SylvaError::invariant(
                    "bounded queue: key reappeared after presence check",
                ))
            }
        };
        if idx as usize != self.links.len() {
            return Err(SylvaError::invariant("bounded queue: tree slot out of step with chain"));
        }
        self.push_newest(idx);

        Ok(match evicted {
            Some(old) => InsertOutcome::Evicted(old),
            None => InsertOutcome::Inserted,
        })
    }

    /// Always fails: caller-driven removal would break the eviction order
    pub fn delete(&mut self, _key: &K) -> Result<bool> {
        Err(SylvaError::unsupported("delete on a bounded ordered queue"))
    }

    /// Oldest stored key, the next to be evicted
    pub fn oldest(&self) -> Option<&K> {
        (self.head != NIL).then(|| self.tree.key_of(self.head))
    }

    /// Most recently inserted key
    pub fn newest(&self) -> Option<&K> {
        (self.tail != NIL).then(|| self.tree.key_of(self.tail))
    }

    /// Keys from oldest to newest
    pub fn iter_insertion_order(&self) -> InsertionOrder<'_, K> {
        InsertionOrder {
            queue: self,
            cursor: self.head,
            remaining: self.len(),
        }
    }

    /// Smallest stored key
    pub fn min(&self) -> Option<&K> {
        self.tree.min()
    }

    /// Largest stored key
    pub fn max(&self) -> Option<&K> {
        self.tree.max()
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

    fn push_newest(&mut self, idx: NodeIdx) {
        self.links.push(ChainLink {
            prev: self.tail,
            next: NIL,
        });
        if self.tail == NIL {
            self.head = idx;
        } else {
            self.links[self.tail as usize].next = idx;
        }
        self.tail = idx;
    }

    fn evict_oldest(&mut self) -> Result<K> {
        let victim = self.head;
        if victim == NIL {
            return Err(SylvaError::invariant("bounded queue: full but chain is empty"));
        }

        let next = self.links[victim as usize].next;
        self.head = next;
        if next == NIL {
            self.tail = NIL;
        } else {
            self.links[next as usize].prev = NIL;
        }

        let Self {
            tree,
            links,
            head,
            tail,
            ..
        } = self;
        let key = tree.remove_node(victim, &mut |from, to| {
            relocate(&mut links[..], &mut *head, &mut *tail, from, to);
        })?;
        links.truncate(tree.node_count());

        trace!("bounded queue evicted {}", key.to_display_string());
        Ok(key)
    }
}

/// Move the chain entry in slot `from` to slot `to`
fn relocate(
    links: &mut [ChainLink],
    head: &mut NodeIdx,
    tail: &mut NodeIdx,
    from: NodeIdx,
    to: NodeIdx,
) {
    let link = links[from as usize];
    links[to as usize] = link;
    if link.prev == NIL {
        *head = to;
    } else {
        links[link.prev as usize].next = to;
    }
    if link.next == NIL {
        *tail = to;
    } else {
        links[link.next as usize].prev = to;
    }
}

impl<K: IndexKey> OrderedLookup<K> for BoundedOrderedQueue<K> {
    fn height(&self) -> usize {
        self.tree.height()
    }

    fn size(&self) -> usize {
        self.tree.size()
    }

    fn exist(&self, key: &K) -> bool {
        self.tree.exist(key)
    }

    /// Tree invariants plus a consistent chain covering every node
    fn validate(&self) -> bool {
        if !self.tree.validate() || self.links.len() != self.tree.node_count() {
            return false;
        }
        let mut seen = 0usize;
        let mut prev = NIL;
        let mut cursor = self.head;
        while cursor != NIL {
            if seen >= self.links.len() || self.links[cursor as usize].prev != prev {
                return false;
            }
            seen += 1;
            prev = cursor;
            cursor = self.links[cursor as usize].next;
        }
        prev == self.tail && seen == self.len() && self.len() <= self.config.capacity
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K) -> bool, order: TraverseOrder) {
        self.tree.traverse(visitor, order)
    }

    fn pretty_print(&self) -> String {
        self.tree.pretty_print()
    }
}

impl<K: IndexKey> TreeNavigator<K> for BoundedOrderedQueue<K> {
    type Cursor<'a> = NodeIdx where Self: 'a;

    fn root_cursor(&self) -> Option<NodeIdx> {
        self.tree.root_cursor()
    }

    fn child<'a>(&'a self, at: NodeIdx, side: Side) -> Option<NodeIdx> {
        self.tree.child(at, side)
    }

    fn key_at<'a>(&'a self, at: NodeIdx) -> &'a K {
        self.tree.key_at(at)
    }
}

impl<K: IndexKey> fmt::Display for BoundedOrderedQueue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree, f)
    }
}

impl<K: IndexKey> fmt::Debug for BoundedOrderedQueue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedOrderedQueue")
            .field("len", &self.len())
            .field("capacity", &self.config.capacity)
            .finish()
    }
}

/// Iterator over queue keys from oldest to newest
pub struct InsertionOrder<'a, K> {
    queue: &'a BoundedOrderedQueue<K>,
    cursor: NodeIdx,
    remaining: usize,
}

impl<'a, K: IndexKey> Iterator for InsertionOrder<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let at = self.cursor;
        self.cursor = self.queue.links[at as usize].next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(self.queue.tree.key_of(at))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: IndexKey> ExactSizeIterator for InsertionOrder<'a, K> {}
