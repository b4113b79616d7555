//! Identity records and the identity store contract

use super::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civic_board_shared::{Role, UserView};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// An account as held by the identity store
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Public view with the password hash stripped
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Input for creating an account
#[derive(Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
}

/// Account lookups and creation
///
/// `create` must reject duplicate usernames and emails itself; callers
/// pre-check for friendlier errors but do not rely on it.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError>;

    /// Readiness probe
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Default)]
struct MemoryAccounts {
    next_id: i64,
    by_id: HashMap<i64, Identity>,
}

/// Process-local identity store, for development and tests
#[derive(Default)]
pub struct MemoryIdentityStore {
    accounts: RwLock<MemoryAccounts>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove an account outright
    pub async fn delete(&self, id: i64) -> bool {
        self.accounts.write().await.by_id.remove(&id).is_some()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .by_id
            .values()
            .find(|identity| identity.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError> {
        Ok(self.accounts.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .by_id
            .values()
            .find(|identity| identity.email == email)
            .cloned())
    }

    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let mut accounts = self.accounts.write().await;

        if accounts.by_id.values().any(|i| i.username == new.username) {
            return Err(StoreError::UsernameTaken);
        }
        if accounts.by_id.values().any(|i| i.email == new.email) {
            return Err(StoreError::EmailTaken);
        }

        accounts.next_id += 1;
        let identity = Identity {
            id: accounts.next_id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            full_name: new.full_name,
            role: new.role,
            created_at: Utc::now(),
        };
        accounts.by_id.insert(identity.id, identity.clone());

        Ok(identity)
    }
}
