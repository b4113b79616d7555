//! Session management
//!
//! Sessions bind an opaque random id (delivered as a cookie) to an
//! identity. Expiry and vanished accounts are normal events: resolving
//! such a session just yields `None` and cleans the entry up.

use crate::store::{Identity, IdentityStore, SessionRecord, SessionStore, StoreError};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;

/// Random bytes in a session id (hex-encoded on the wire)
const SESSION_ID_BYTES: usize = 32;

/// Creates, resolves and destroys sessions
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    identities: Arc<dyn IdentityStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        identities: Arc<dyn IdentityStore>,
        ttl_secs: i64,
    ) -> Self {
        Self {
            sessions,
            identities,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Start a session for an identity
    pub async fn create(&self, identity_id: i64) -> Result<SessionRecord, StoreError> {
        let now = Utc::now();
        let record = SessionRecord {
            id: generate_session_id(),
            identity_id,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.put(record.clone()).await?;
        debug!(identity_id, "Session created");
        Ok(record)
    }

    /// Resolve a session id to a live identity
    pub async fn resolve(&self, session_id: &str) -> Result<Option<Identity>, StoreError> {
        let Some(record) = self.sessions.get(session_id).await? else {
            return Ok(None);
        };

        if record.is_expired_at(Utc::now()) {
            debug!(identity_id = record.identity_id, "Session expired");
            self.sessions.delete(session_id).await?;
            return Ok(None);
        }

        match self.identities.find_by_id(record.identity_id).await? {
            Some(identity) => Ok(Some(identity)),
            None => {
                debug!(identity_id = record.identity_id, "Session identity no longer exists");
                self.sessions.delete(session_id).await?;
                Ok(None)
            }
        }
    }

    /// End a session; unknown ids are ignored
    pub async fn destroy(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions.delete(session_id).await
    }

    /// Session lifetime in seconds
    #[inline]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

/// Generate a random session id (hex-encoded)
fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
