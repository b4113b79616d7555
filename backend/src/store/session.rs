//! Server-side session records and the session store contract

use super::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A live server-side session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    pub identity_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Session storage capability
///
/// Implementations must be safe under concurrent use; `sweep_expired`
/// may run while requests read and write the same store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, record: SessionRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Removing an absent session is not an error
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Drop every expired entry, returning how many were removed
    async fn sweep_expired(&self) -> Result<usize, StoreError>;

    /// Readiness probe
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Process-local session store
///
/// Expired entries linger until the next sweep or the next read of the
/// same id; reads always re-check expiry.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, record: SessionRecord) -> Result<(), StoreError> {
        self.sessions.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(now));
        Ok(before - sessions.len())
    }
}

/// Periodically sweep expired sessions in the background
///
/// The first sweep happens one full interval after startup. Failures are
/// logged and the loop keeps going; the sweep only bounds memory.
///
/// A zero interval disables sweeping.
pub fn spawn_sweeper(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        if every.is_zero() {
            warn!("Session sweep interval is zero; sweeper disabled");
            return;
        }

        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval() fires immediately on the first tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match store.sweep_expired().await {
                Ok(0) => debug!("Session sweep found nothing to remove"),
                Ok(removed) => info!(removed, "Swept expired sessions"),
                Err(e) => warn!("Session sweep failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn record(id: &str, expires_in_secs: i64) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            id: id.to_string(),
            identity_id: 1,
            created_at: now,
            expires_at: now + ChronoDuration::seconds(expires_in_secs),
        }
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemorySessionStore::new();
        store.put(record("abc", 60)).await.unwrap();

        let fetched = store.get("abc").await.unwrap().unwrap();
        assert_eq!(fetched.id, "abc");

        store.delete("abc").await.unwrap();
        assert!(store.get("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemorySessionStore::new();
        store.delete("never-existed").await.unwrap();
        store.put(record("abc", 60)).await.unwrap();
        store.delete("abc").await.unwrap();
        store.delete("abc").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let store = MemorySessionStore::new();
        store.put(record("live", 60)).await.unwrap();
        store.put(record("dead", -60)).await.unwrap();
        store.put(record("also-dead", -1)).await.unwrap();

        let removed = store.sweep_expired().await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len().await, 1);
        assert!(store.get("live").await.unwrap().is_some());
    }

    #[test]
    fn test_expiry_boundary() {
        let r = record("abc", 0);
        assert!(r.is_expired_at(r.expires_at));
        assert!(!r.is_expired_at(r.expires_at - ChronoDuration::seconds(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval() {
        let store = Arc::new(MemorySessionStore::new());
        store.put(record("dead", -60)).await.unwrap();

        let handle = spawn_sweeper(store.clone(), Duration::from_secs(3600));

        // Nothing happens before the first full interval
        tokio::task::yield_now().await;
        assert_eq!(store.len().await, 1);

        tokio::time::sleep(Duration::from_secs(3601)).await;
        tokio::task::yield_now().await;
        assert!(store.is_empty().await);

        handle.abort();
    }

    #[tokio::test]
    async fn test_zero_interval_disables_sweeper() {
        let store = Arc::new(MemorySessionStore::new());
        store.put(record("dead", -60)).await.unwrap();

        let result = spawn_sweeper(store.clone(), Duration::ZERO).await;
        assert!(result.is_ok());
        assert_eq!(store.len().await, 1);
    }
}
