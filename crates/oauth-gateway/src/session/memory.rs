//! In-memory session store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;
use tokio::sync::Mutex;

use super::SessionStore;
use crate::config::session;
use crate::error::SessionResult;

type Entries = Arc<Mutex<HashMap<String, Value>>>;

/// Sessions held in a moka cache; idle sessions expire after the TTL.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<String, Entries>,
}

impl MemorySessionStore {
    /// Create a store whose sessions expire after `ttl` without access.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(session::MAX_SESSIONS)
            .time_to_idle(ttl)
            .build();
        Self { sessions }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(session::TTL)
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("sessions", &self.sessions.entry_count())
            .finish()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(
        &self,
        session_id: &str,
        names: &[&'static str],
    ) -> SessionResult<Vec<Option<Value>>> {
        let Some(entries) = self.sessions.get(session_id).await else {
            return Ok(vec![None; names.len()]);
        };

        let entries = entries.lock().await;
        Ok(names.iter().map(|name| entries.get(*name).cloned()).collect())
    }

    async fn save(
        &self,
        session_id: &str,
        values: Vec<(&'static str, Value)>,
    ) -> SessionResult<()> {
        let entries = self
            .sessions
            .get_with(session_id.to_owned(), async { Arc::new(Mutex::new(HashMap::new())) })
            .await;

        let mut entries = entries.lock().await;
        for (name, value) in values {
            entries.insert(name.to_owned(), value);
        }
        Ok(())
    }

    async fn remove(
        &self,
        session_id: &str,
        names: &[&'static str],
    ) -> SessionResult<Vec<Option<Value>>> {
        let Some(entries) = self.sessions.get(session_id).await else {
            return Ok(vec![None; names.len()]);
        };

        let mut entries = entries.lock().await;
        Ok(names.iter().map(|name| entries.remove(*name)).collect())
    }

    async fn exists(&self, session_id: &str) -> SessionResult<bool> {
        Ok(self.sessions.contains_key(session_id))
    }

    fn session_count(&self) -> Option<u64> {
        Some(self.sessions.entry_count())
    }
}
