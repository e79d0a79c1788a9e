//! # Sylva: In-Memory Ordered Indexes
//!
//! This crate provides self-balancing binary search trees and the small
//! containers built on top of them, with a common ordered-index interface.
//!
//! ## Key Features
//!
//! - **Two Balancing Strategies**: AVL ([`HeightBalancedIndex`]) and red-black
//!   ([`ColorBalancedIndex`]) behind the same [`OrderedIndex`] trait
//! - **Lazy Range Cursors**: [`RangeIterator`] walks `[from, to]` in any traversal order without
//!   materializing the tree
//! - **Bounded Queues**: [`BoundedOrderedQueue`] keeps the most recent keys searchable
//! - **Expiring Sets**: [`ExpiringSet`] forgets members after a TTL, reclaimed in the background
//! - **Sessions**: JSON-backed key-value sessions over pluggable [`SessionStore`]s
//!
//! ## Quick Start
//!
//! ```rust
//! use sylva::{
//!     BoundedOrderedQueue, ColorBalancedIndex, HeightBalancedIndex, OrderedIndex,
//!     OrderedLookup, RangeIterator, TraverseOrder,
//! };
//!
//! // AVL tree
//! let mut avl = HeightBalancedIndex::from_sequence([5, 3, 8, 1, 4]).unwrap();
//! avl.delete(&3).unwrap();
//! assert!(avl.validate());
//!
//! // Red-black tree with bounded pops
//! let mut rb = ColorBalancedIndex::from_sequence(1..=10).unwrap();
//! assert_eq!(rb.pop_min(Some(&4), true).unwrap(), Some(4));
//!
//! // Lazy range walk
//! let keys: Vec<i32> = RangeIterator::new(&rb, Some(3), Some(7), TraverseOrder::InOrder)
//!     .unwrap()
//!     .copied()
//!     .collect();
//! assert_eq!(keys, vec![3, 5, 6, 7]);
//!
//! // Sliding window of recent keys
//! let queue = BoundedOrderedQueue::from_sequence(1..=100, 10).unwrap();
//! assert_eq!(queue.size(), 10);
//! assert!(!queue.exist(&90));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod containers;
pub mod error;
pub mod session;
pub mod tree;

mod reaper;

// Re-export core types
pub use config::{Config, ExpiringSetConfig, QueueConfig, SessionConfig};
pub use containers::{BoundedOrderedQueue, ExpiringSet, InsertOutcome};
pub use error::{Result, SylvaError};
pub use session::{InMemorySessionStore, Session, SessionOptions, SessionStore};
pub use tree::{
    ColorBalancedIndex, HeightBalancedIndex, IndexKey, OrderedIndex, OrderedLookup, RangeIterator,
    TraverseOrder,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library (currently only logs the version)
pub fn init() {
    log::debug!("Initializing sylva v{}", VERSION);
}
