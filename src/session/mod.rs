//! Expiring key-value sessions
//!
//! A [`Session`] is a small string map identified by a random id and
//! persisted as JSON through a [`SessionStore`]. The bundled
//! [`InMemorySessionStore`] keeps entries in process memory and expires
//! them in the background; other backends plug in by implementing the
//! trait.
//!
//! Stores are explicit instances. Share one between requests with an
//! `Arc`; its gc thread stops when the last handle is dropped.

mod handle;
mod memory;
mod store;

pub use handle::{new_uuid, Session, SessionOptions};
pub use memory::InMemorySessionStore;
pub use store::SessionStore;
