//! Per-request session handle.

use super::store::SessionStore;
use crate::config::SessionConfig;
use crate::error::{Result, SylvaError};
use log::{debug, warn};
use parking_lot::RwLock;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Settings applied when opening a [`Session`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// How long a saved session survives in the store
    pub expiration: Duration,
}

impl SessionOptions {
    /// Override the session lifetime
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            expiration: config.expiration,
        }
    }
}

/// String key-value bag bound to a session id
///
/// `get` and `set` only touch the local copy; nothing reaches the store
/// until [`save`](Self::save).
///
/// # Examples
///
/// ```rust
/// use sylva::session::{InMemorySessionStore, Session, SessionOptions};
/// use std::sync::Arc;
///
/// let store = Arc::new(InMemorySessionStore::new().unwrap());
/// let mut cookie = String::new();
///
/// let options = SessionOptions::default();
/// let session = Session::open(store.clone(), || cookie.clone(), |_| {}, &options).unwrap();
/// session.set("user", "ada");
/// session.save().unwrap();
/// cookie = session.session_id().to_string();
///
/// let again = Session::open(store, || cookie.clone(), |_| {}, &options).unwrap();
/// assert_eq!(again.get("user").as_deref(), Some("ada"));
/// ```
pub struct Session {
    sid: String,
    values: RwLock<HashMap<String, String>>,
    expiration: Duration,
    store: Arc<dyn SessionStore>,
}

impl Session {
    /// Load the session named by `id_getter`, or start a new one
    ///
    /// A fresh session gets a random UUID-v4 id, which is handed to
    /// `id_setter` so the caller can persist it (in a cookie, say). Store
    /// errors other than `NotFound` are returned, as is a stored payload
    /// that does not decode.
    pub fn open<G, S>(
        store: Arc<dyn SessionStore>,
        id_getter: G,
        id_setter: S,
        options: &SessionOptions,
    ) -> Result<Self>
    where
        G: FnOnce() -> String,
        S: FnOnce(&str),
    {
        let sid = id_getter();
        let values = match store.get(&sid) {
            Ok(payload) => Some(decode(&sid, &payload)?),
            Err(SylvaError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        let (sid, values) = match values {
            Some(values) => (sid, values),
            None => {
                let sid = new_uuid();
                debug!("starting new session {}", sid);
                id_setter(&sid);
                (sid, HashMap::new())
            }
        };

        Ok(Self {
            sid,
            values: RwLock::new(values),
            expiration: options.expiration,
            store,
        })
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    /// Set `key` to `value` locally
    pub fn set(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    /// Persist every value to the store as one JSON object
    pub fn save(&self) -> Result<()> {
        let payload = serde_json::to_string(&*self.values.read())
            .map_err(|e| SylvaError::serialization(e.to_string()))?;
        self.store.set(&self.sid, &payload, self.expiration)
    }

    /// Id this session is stored under
    pub fn session_id(&self) -> &str {
        &self.sid
    }

    /// Lifetime applied on save
    pub fn expiration(&self) -> Duration {
        self.expiration
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("sid", &self.sid)
            .field("values", &self.values.read().len())
            .field("expiration", &self.expiration)
            .finish()
    }
}

fn decode(sid: &str, payload: &str) -> Result<HashMap<String, String>> {
    serde_json::from_str(payload).map_err(|e| {
        warn!("session {} payload failed to decode: {}", sid, e);
        SylvaError::serialization(e.to_string())
    })
}

/// Random RFC 4122 version 4 id, `xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`
pub fn new_uuid() -> String {
    let mut buf = [0u8; 16];
    rand::thread_rng().fill(&mut buf);
    buf[6] = (buf[6] & 0x0f) | 0x40;
    buf[8] = (buf[8] & 0x3f) | 0x80;

    let hex: String = buf.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
