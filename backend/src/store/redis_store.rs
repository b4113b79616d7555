//! Redis-backed session store
//!
//! Each session is a JSON value under `session:<id>` written with a
//! native TTL, so Redis expires entries itself and the sweep is a no-op.

use super::{SessionRecord, SessionStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use tracing::info;

const KEY_PREFIX: &str = "session:";

/// Session store backed by a shared Redis connection
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connect to Redis at `url`
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        info!("Connecting to Redis...");
        let client = redis::Client::open(url).map_err(StoreError::unavailable)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(StoreError::unavailable)?;
        info!("Redis connection established");
        Ok(Self::new(conn))
    }

    #[inline]
    fn key(id: &str) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, record: SessionRecord) -> Result<(), StoreError> {
        let ttl_secs = (record.expires_at - Utc::now()).num_seconds();
        if ttl_secs <= 0 {
            // Already expired; storing it would only be read back as absent
            return Ok(());
        }

        let value = serde_json::to_string(&record).map_err(StoreError::unavailable)?;
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(Self::key(&record.id))
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(StoreError::unavailable)
    }

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await
            .map_err(StoreError::unavailable)?;

        value
            .map(|raw| serde_json::from_str(&raw).map_err(StoreError::unavailable))
            .transpose()
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(Self::key(id))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(StoreError::unavailable)
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        Ok(0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(StoreError::unavailable)
    }
}
