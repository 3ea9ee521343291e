//! In-memory extraction session store
//!
//! Sessions live in a `RwLock<HashMap>` for the lifetime of the process.
//! Expiry is lazy: an expired entry is dropped the first time it is read,
//! and [`SessionStore::purge_expired`] sweeps the rest. For sessions that
//! must survive a restart, use `db::sessions::SqliteSessionStore`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use podium_common::Result;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::ExtractionSession;
use crate::types::SessionStore;

/// Process-local [`SessionStore`]
///
/// The TTL is stamped onto every session on `create`, overriding whatever
/// expiry the caller computed.
#[derive(Debug)]
pub struct InMemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, ExtractionSession>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored sessions, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, mut session: ExtractionSession) -> Result<Uuid> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| podium_common::Error::Config(format!("Session TTL out of range: {}", e)))?;
        session.expires_at = session.created_at + ttl;

        let id = session.extraction_id;
        self.sessions.write().await.insert(id, session);
        debug!(extraction_id = %id, "Extraction session stored");
        Ok(id)
    }

    async fn get(&self, extraction_id: Uuid) -> Result<Option<ExtractionSession>> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&extraction_id) {
                None => {
                    debug!(extraction_id = %extraction_id, "Unknown extraction session");
                    return Ok(None);
                }
                Some(session) if !session.is_expired() => return Ok(Some(session.clone())),
                Some(_) => {}
            }
        }

        // Expired: upgrade to a write lock and evict
        let mut sessions = self.sessions.write().await;
        match sessions.get(&extraction_id) {
            Some(session) if session.is_expired() => {
                sessions.remove(&extraction_id);
                warn!(extraction_id = %extraction_id, "Extraction session expired");
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    async fn consume(&self, extraction_id: Uuid) -> Result<Option<ExtractionSession>> {
        let removed = self.sessions.write().await.remove(&extraction_id);
        match removed {
            Some(session) if session.is_expired() => {
                warn!(extraction_id = %extraction_id, "Extraction session expired");
                Ok(None)
            }
            Some(session) => {
                debug!(extraction_id = %extraction_id, "Extraction session consumed");
                Ok(Some(session))
            }
            None => {
                debug!(extraction_id = %extraction_id, "Unknown extraction session");
                Ok(None)
            }
        }
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        let purged = before - sessions.len();

        if purged > 0 {
            debug!(purged, "Purged expired extraction sessions");
        }
        Ok(purged)
    }
}
