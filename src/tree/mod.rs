//! Self-balancing ordered indexes
//!
//! Two interchangeable balancing strategies behind one trait surface:
//!
//! - **[`HeightBalancedIndex`]** keeps sibling subtree heights within one of
//!   each other (AVL), using owned boxed nodes and recursive rebalancing.
//! - **[`ColorBalancedIndex`]** keeps red/black coloring invariants, using an
//!   index arena with parent back-indices and iterative fixups. It also
//!   offers bounded `pop_min`/`pop_max` for priority-style consumption.
//!
//! Both implement [`OrderedIndex`] and [`TreeNavigator`], so
//! [`RangeIterator`] and `pretty_print` work on either.
//!
//! ```rust
//! use sylva::tree::{HeightBalancedIndex, OrderedIndex, OrderedLookup, TraverseOrder};
//!
//! let mut tree = HeightBalancedIndex::new();
//! for key in [5, 3, 8] {
//!     tree.insert(key).unwrap();
//! }
//! assert!(!tree.insert(3).unwrap());
//! assert_eq!(tree.to_vec(TraverseOrder::ReversedOrder), vec![8, 5, 3]);
//! ```

pub mod avl;
pub mod pretty;
pub mod range;
pub mod red_black;
pub mod traits;

pub use avl::{AvlNode, HeightBalancedIndex};
pub use range::RangeIterator;
pub use red_black::{Color, ColorBalancedIndex, NodeIdx};
pub use traits::{IndexKey, OrderedIndex, OrderedLookup, Side, TraverseOrder, TreeNavigator};
