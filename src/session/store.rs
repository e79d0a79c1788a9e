//! Pluggable session persistence.

use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Key-value backend sessions are persisted in
///
/// Implementations must be shareable across threads; a single store is
/// usually handed to every request through an `Arc`.
pub trait SessionStore: Send + Sync {
    /// Value stored under `key`; `Err(NotFound)` when absent or expired
    fn get(&self, key: &str) -> Result<String>;

    /// Store `value` under `key` for `expiration`, replacing any previous value
    fn set(&self, key: &str, value: &str, expiration: Duration) -> Result<()>;

    /// Remove `key`; succeeds when the key is already absent
    fn delete(&self, key: &str) -> Result<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn get(&self, key: &str) -> Result<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str, expiration: Duration) -> Result<()> {
        (**self).set(key, value, expiration)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}
