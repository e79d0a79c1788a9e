//! Containers built on the ordered indexes
//!
//! - **[`BoundedOrderedQueue<K>`]** - capacity-bounded FIFO with ordered search,
//!   evicting the oldest key when full
//! - **[`ExpiringSet<K>`]** - thread-safe membership set whose keys expire
//!   after a TTL, reclaimed by a background reaper

mod bounded_queue;
mod expiring_set;

pub use bounded_queue::{BoundedOrderedQueue, InsertOutcome, InsertionOrder};
pub use expiring_set::ExpiringSet;
