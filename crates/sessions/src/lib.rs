//! Session persistence on a remote key-value table.
//!
//! One row per session, keyed by `prefix ++ session_id`.  Rows carry the
//! payload (optionally zlib-compressed) and the TTL, both stamped with the
//! write time; expiry is evaluated lazily when a session is read, and an
//! expired row is deleted at that point.  There is no background sweep.

pub mod compress;
pub mod handler;
pub mod record;
pub mod store;

pub use handler::SessionHandler;
pub use record::{SessionRecord, ValueType};
pub use store::SessionStore;
