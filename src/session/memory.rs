//! Session store kept in process memory
//!
//! Values live in a hash map; a [`ColorBalancedIndex`] of
//! `(deadline, key)` entries orders them by expiry so the gc reaper only
//! ever looks at the smallest entry, consuming it with `pop_min` once due.

use super::store::SessionStore;
use crate::config::{deadline_after, Config, SessionConfig};
use crate::error::{Result, SylvaError};
use crate::reaper::Reaper;
use crate::tree::{ColorBalancedIndex, OrderedIndex};
use log::{debug, error, trace};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Expiry index entry; ordered by deadline, ties broken by key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DeadlineEntry {
    deadline: Instant,
    key: String,
}

#[derive(Debug)]
struct Element {
    value: String,
    deadline: Instant,
}

#[derive(Default)]
struct StoreState {
    data: HashMap<String, Element>,
    expiry: ColorBalancedIndex<DeadlineEntry>,
}

impl StoreState {
    fn earliest_deadline(&self) -> Option<Instant> {
        self.expiry.peek_min(None).map(|entry| entry.deadline)
    }

    /// Detach `key` from both the data map and the expiry index
    fn take(&mut self, key: &str) -> Result<Option<Element>> {
        let Some(element) = self.data.remove(key) else {
            return Ok(None);
        };
        let entry = DeadlineEntry {
            deadline: element.deadline,
            key: key.to_string(),
        };
        if !self.expiry.delete(&entry)? {
            return Err(SylvaError::invariant(format!(
                "session store: no expiry entry for {}",
                key
            )));
        }
        Ok(Some(element))
    }

    /// Attach `element` under `key`; the key must not be present
    fn attach(&mut self, key: &str, element: Element) -> Result<()> {
        let entry = DeadlineEntry {
            deadline: element.deadline,
            key: key.to_string(),
        };
        if !self.expiry.insert(entry)? {
            return Err(SylvaError::invariant(format!(
                "session store: stale expiry entry for {}",
                key
            )));
        }
        self.data.insert(key.to_string(), element);
        Ok(())
    }

    /// Swap in `element` for `key`, keeping the previous entry when that fails
    fn replace(&mut self, key: &str, element: Element) -> Result<()> {
        let previous = self.take(key)?;
        if let Err(e) = self.attach(key, element) {
            if let Some(previous) = previous {
                self.attach(key, previous)?;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove every entry due at `now`; returns how many went
    fn collect_expired(&mut self, now: Instant) -> Result<usize> {
        let mut removed = 0;
        while self.earliest_deadline().is_some_and(|deadline| deadline <= now) {
            let Some(entry) = self.expiry.pop_min(None, true)? else {
                break;
            };
            self.data.remove(&entry.key);
            trace!("session store expired {}", entry.key);
            removed += 1;
        }
        Ok(removed)
    }
}

fn gc_pass(state: &RwLock<StoreState>, idle_period: Duration) -> Duration {
    let mut state = state.write();
    let now = Instant::now();
    if let Err(e) = state.collect_expired(now) {
        error!("session store gc aborted: {}", e);
        return idle_period;
    }
    state
        .earliest_deadline()
        .map_or(idle_period, |deadline| deadline.saturating_duration_since(now))
}

/// Thread-safe in-memory [`SessionStore`] with background expiry
///
/// Each instance owns its gc thread; it stops on
/// [`shutdown`](Self::shutdown) or drop.
///
/// # Examples
///
/// ```rust
/// use sylva::session::{InMemorySessionStore, SessionStore};
/// use std::time::Duration;
///
/// let store = InMemorySessionStore::new().unwrap();
/// store.set("sid", "{}", Duration::from_secs(60)).unwrap();
/// assert_eq!(store.get("sid").unwrap(), "{}");
/// store.delete("sid").unwrap();
/// assert!(store.get("sid").is_err());
/// ```
pub struct InMemorySessionStore {
    state: Arc<RwLock<StoreState>>,
    reaper: Reaper,
    config: SessionConfig,
}

impl InMemorySessionStore {
    /// Create a store with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(SessionConfig::default())
    }

    /// Create a store from a validated configuration and start its gc
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(RwLock::new(StoreState::default()));
        let swept = Arc::clone(&state);
        let idle_period = config.gc_idle_period;
        let reaper = Reaper::spawn("sylva-session-gc", move || gc_pass(&swept, idle_period))?;

        debug!("in-memory session store created, gc idle period {:?}", idle_period);
        Ok(Self {
            state,
            reaper,
            config,
        })
    }

    /// Number of stored, unexpired entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.state
            .read()
            .data
            .values()
            .filter(|element| element.deadline > now)
            .count()
    }

    /// Whether no unexpired entries are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configuration in effect
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Stop and join the gc thread; idempotent
    pub fn shutdown(&self) -> Result<()> {
        self.reaper.shutdown()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<String> {
        let now = Instant::now();
        let state = self.state.read();
        match state.data.get(key) {
            Some(element) if element.deadline > now => Ok(element.value.clone()),
            _ => Err(SylvaError::not_found(key)),
        }
    }

    fn set(&self, key: &str, value: &str, expiration: Duration) -> Result<()> {
        let deadline = deadline_after("expiration", expiration)?;
        let earliest_changed = {
            let mut state = self.state.write();
            let earliest = state.earliest_deadline();
            let element = Element {
                value: value.to_string(),
                deadline,
            };
            state.replace(key, element)?;
            earliest.map_or(true, |earliest| deadline < earliest)
        };

        if earliest_changed {
            self.reaper.notify();
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.state.write().take(key)?;
        Ok(())
    }
}

impl fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("len", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::OrderedLookup;
    use std::thread;

    fn fast_store() -> InMemorySessionStore {
        InMemorySessionStore::with_config(SessionConfig {
            expiration: Duration::from_secs(60),
            gc_idle_period: Duration::from_millis(10),
        })
        .unwrap()
    }

    #[test]
    fn test_get_set_delete() {
        let store = fast_store();
        assert!(matches!(store.get("a"), Err(SylvaError::NotFound { .. })));

        store.set("a", "1", Duration::from_secs(10)).unwrap();
        assert_eq!(store.get("a").unwrap(), "1");
        assert_eq!(store.len(), 1);

        store.delete("a").unwrap();
        assert!(store.get("a").is_err());
        // absent keys delete cleanly
        store.delete("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_replaces_value_and_deadline() {
        let store = fast_store();
        store.set("k", "old", Duration::from_millis(80)).unwrap();
        store.set("k", "new", Duration::from_secs(10)).unwrap();
        thread::sleep(Duration::from_millis(200));
        assert_eq!(store.get("k").unwrap(), "new");

        let state = store.state.read();
        assert_eq!(state.expiry.size(), 1);
        assert!(state.expiry.validate());
    }

    #[test]
    fn test_gc_removes_expired_entries() {
        let store = fast_store();
        for i in 0..20 {
            store.set(&format!("s{}", i), "v", Duration::from_millis(30 + i)).unwrap();
        }
        store.set("keep", "v", Duration::from_secs(30)).unwrap();
        thread::sleep(Duration::from_millis(250));

        let state = store.state.read();
        assert_eq!(state.data.len(), 1);
        assert_eq!(state.expiry.size(), 1);
        assert!(state.data.contains_key("keep"));
    }

    #[test]
    fn test_expired_entry_invisible_before_gc() {
        let store = fast_store();
        store.shutdown().unwrap();
        store.set("a", "1", Duration::from_millis(20)).unwrap();
        thread::sleep(Duration::from_millis(60));
        assert!(store.get("a").is_err());
        assert_eq!(store.state.read().data.len(), 1);
    }

    #[test]
    fn test_unrepresentable_expiration_rejected() {
        let store = fast_store();
        store.set("k", "kept", Duration::from_secs(10)).unwrap();

        let err = store.set("k", "lost", Duration::MAX).unwrap_err();
        assert!(matches!(err, SylvaError::Configuration { .. }));
        assert_eq!(store.get("k").unwrap(), "kept");

        let config = SessionConfig {
            expiration: Duration::MAX,
            gc_idle_period: Duration::from_millis(10),
        };
        assert!(InMemorySessionStore::with_config(config).is_err());
    }

    #[test]
    fn test_failed_attach_restores_previous_entry() {
        let mut state = StoreState::default();
        let deadline = Instant::now() + Duration::from_secs(10);
        state
            .attach("k", Element { value: "old".to_string(), deadline })
            .unwrap();

        // an index entry left behind under the new deadline makes attach fail
        let stale = deadline + Duration::from_secs(5);
        state
            .expiry
            .insert(DeadlineEntry { deadline: stale, key: "k".to_string() })
            .unwrap();
        let err = state
            .replace("k", Element { value: "new".to_string(), deadline: stale })
            .unwrap_err();
        assert!(matches!(err, SylvaError::InvariantViolation { .. }));

        assert_eq!(state.data.get("k").map(|e| e.value.as_str()), Some("old"));
        let old_entry = DeadlineEntry { deadline, key: "k".to_string() };
        assert!(state.expiry.exist(&old_entry));
    }

    #[test]
    fn test_collect_expired_orders_by_deadline() {
        let mut state = StoreState::default();
        let base = Instant::now();
        for (offset, key) in [(30u64, "c"), (10, "a"), (20, "b")] {
            let deadline = base + Duration::from_millis(offset);
            state.expiry.insert(DeadlineEntry { deadline, key: key.to_string() }).unwrap();
            state.data.insert(key.to_string(), Element { value: String::new(), deadline });
        }
        let removed = state.collect_expired(base + Duration::from_millis(20)).unwrap();
        assert_eq!(removed, 2);
        assert!(state.data.contains_key("c"));
        assert_eq!(state.earliest_deadline(), Some(base + Duration::from_millis(30)));
    }
}
