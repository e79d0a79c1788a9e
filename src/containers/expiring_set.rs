//! Thread-safe set whose members expire after a fixed TTL
//!
//! Membership is a hash table from key to its current deadline; a min-heap
//! of `(deadline, key)` entries drives a background reaper thread that
//! sleeps until the earliest deadline (or an idle period when nothing is
//! pending) and then drops every member whose deadline has passed.
//!
//! Re-adding a live key extends its deadline. The older heap entry stays
//! behind as a tombstone and is discarded when popped, because it no longer
//! matches the deadline recorded for the key.

use crate::config::{deadline_after, Config, ExpiringSetConfig};
use crate::error::Result;
use crate::reaper::Reaper;
use log::{debug, trace};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Expiry<K> {
    deadline: Instant,
    key: K,
}

// Earliest deadline on top of the max-heap
impl<K> Ord for Expiry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl<K> PartialOrd for Expiry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> PartialEq for Expiry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}

impl<K> Eq for Expiry<K> {}

struct State<K> {
    /// Key to its latest deadline
    members: HashMap<K, Instant>,
    deadlines: BinaryHeap<Expiry<K>>,
}

/// Drop expired members and return how long to sleep next
fn reap_expired<K>(state: &RwLock<State<K>>, idle_period: Duration) -> Duration
where
    K: Hash + Eq + fmt::Debug,
{
    let mut state = state.write();
    let now = Instant::now();

    while state.deadlines.peek().is_some_and(|top| top.deadline <= now) {
        let Some(expired) = state.deadlines.pop() else {
            break;
        };
        if state.members.get(&expired.key) == Some(&expired.deadline) {
            state.members.remove(&expired.key);
            trace!("expiring set reaped {:?}", expired.key);
        }
    }

    match state.deadlines.peek() {
        Some(top) => top.deadline.saturating_duration_since(now),
        None => idle_period,
    }
}

/// Set of keys that drop out `ttl` after they were last added
///
/// `add`, `exists` and `len` may be called concurrently from any thread.
/// The reaper runs until [`shutdown`](Self::shutdown) or drop.
///
/// # Examples
///
/// ```rust
/// use sylva::containers::ExpiringSet;
/// use std::time::Duration;
///
/// let set = ExpiringSet::new(Duration::from_millis(50)).unwrap();
/// set.add("token").unwrap();
/// assert!(set.exists(&"token"));
///
/// std::thread::sleep(Duration::from_millis(150));
/// assert!(!set.exists(&"token"));
/// ```
pub struct ExpiringSet<K>
where
    K: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    state: Arc<RwLock<State<K>>>,
    reaper: Reaper,
    config: ExpiringSetConfig,
}

impl<K> ExpiringSet<K>
where
    K: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Create a set with the given TTL and default idle period
    pub fn new(ttl: Duration) -> Result<Self> {
        Self::with_config(ExpiringSetConfig::with_ttl(ttl))
    }

    /// Create a set from a validated configuration and start its reaper
    pub fn with_config(config: ExpiringSetConfig) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(RwLock::new(State {
            members: HashMap::new(),
            deadlines: BinaryHeap::new(),
        }));

        let swept = Arc::clone(&state);
        let idle_period = config.idle_period;
        let reaper = Reaper::spawn("sylva-expiring-reaper", move || {
            reap_expired(&swept, idle_period)
        })?;

        debug!(
            "expiring set created with ttl {:?}, idle period {:?}",
            config.ttl, config.idle_period
        );
        Ok(Self {
            state,
            reaper,
            config,
        })
    }

    /// Add `key`, or push its deadline out to `now + ttl` if already present
    ///
    /// Fails with `Configuration` only when `now + ttl` leaves the clock's
    /// range; the set is unchanged in that case.
    pub fn add(&self, key: K) -> Result<()> {
        let deadline = deadline_after("ttl", self.config.ttl)?;
        let earliest_changed = {
            let mut state = self.state.write();
            let earliest = state.deadlines.peek().map(|top| top.deadline);
            state.members.insert(key.clone(), deadline);
            state.deadlines.push(Expiry { deadline, key });
            earliest.map_or(true, |earliest| deadline < earliest)
        };

        if earliest_changed {
            self.reaper.notify();
        }
        Ok(())
    }

    /// Whether `key` is a live member
    pub fn exists(&self, key: &K) -> bool {
        let now = Instant::now();
        self.state
            .read()
            .members
            .get(key)
            .is_some_and(|deadline| *deadline > now)
    }

    /// Number of live members
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.state
            .read()
            .members
            .values()
            .filter(|deadline| **deadline > now)
            .count()
    }

    /// Whether there are no live members
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership lifetime
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Configuration in effect
    pub fn config(&self) -> &ExpiringSetConfig {
        &self.config
    }

    /// Stop and join the reaper; idempotent
    ///
    /// Membership is frozen afterwards: keys stay until their deadline
    /// passes for `exists`, but nothing is reclaimed.
    pub fn shutdown(&self) -> Result<()> {
        self.reaper.shutdown()
    }
}

impl<K> fmt::Debug for ExpiringSet<K>
where
    K: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringSet")
            .field("len", &self.len())
            .field("ttl", &self.config.ttl)
            .finish()
    }
}
