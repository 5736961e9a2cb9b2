//! The session-handler contract consumed by web session middleware.
//!
//! Frameworks own session-ID generation, cookie transport and GC
//! scheduling; they only need these three calls from a storage driver.

use async_trait::async_trait;
use ts_domain::error::{Error, Result};

use crate::store::SessionStore;

/// Storage backend for a session-management framework.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// Payload for `session_id`, empty when there is no live session.
    async fn read(&self, session_id: &str) -> Result<Vec<u8>>;

    /// Persist `data` for `session_id`.
    async fn write(&self, session_id: &str, data: &[u8]) -> Result<bool>;

    /// Forget `session_id`.  Succeeds whether or not it existed.
    async fn delete(&self, session_id: &str) -> Result<bool>;

    /// [`read`](Self::read) for frameworks that serialize sessions as text.
    async fn read_string(&self, session_id: &str) -> Result<String> {
        let bytes = self.read(session_id).await?;
        String::from_utf8(bytes)
            .map_err(|e| Error::InvalidPayload(format!("session {session_id}: {e}")))
    }
}

#[async_trait]
impl SessionHandler for SessionStore {
    async fn read(&self, session_id: &str) -> Result<Vec<u8>> {
        SessionStore::read(self, session_id).await
    }

    async fn write(&self, session_id: &str, data: &[u8]) -> Result<bool> {
        SessionStore::write(self, session_id, data).await
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        SessionStore::delete(self, session_id).await
    }
}
