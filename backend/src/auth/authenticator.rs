//! Username/password authentication
//!
//! Unknown usernames and wrong passwords fail with the same error, and
//! the unknown-username path still runs one hash verification so the
//! two cannot be told apart by response time either.

use super::password::{CredentialHasher, HashError};
use crate::store::{Identity, IdentityStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

/// Why a credential check failed
#[derive(Error, Debug)]
pub enum AuthFailure {
    /// Unknown username or wrong password; deliberately not distinguished
    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Validates username/password pairs against the identity store
#[derive(Clone)]
pub struct CredentialAuthenticator {
    identities: Arc<dyn IdentityStore>,
    hasher: CredentialHasher,
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialAuthenticator {
    pub fn new(identities: Arc<dyn IdentityStore>, hasher: CredentialHasher) -> Self {
        Self {
            identities,
            hasher,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Check a username/password pair
    ///
    /// On success the identity is returned untouched, password hash
    /// included; callers expose only its public view.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, AuthFailure> {
        let identity = self.identities.find_by_username(username).await?;

        let stored = match &identity {
            Some(identity) => identity.password_hash.clone(),
            None => self.dummy_hash().await?.to_string(),
        };
        let valid = self
            .hasher
            .verify_async(password.to_string(), stored)
            .await?;

        match identity {
            Some(identity) if valid => {
                debug!(identity_id = identity.id, "Credentials accepted");
                Ok(identity)
            }
            _ => {
                debug!("Credentials rejected");
                Err(AuthFailure::InvalidCredentials)
            }
        }
    }

    /// Hash used to burn the same work for unknown usernames
    async fn dummy_hash(&self) -> Result<&str, HashError> {
        self.dummy_hash
            .get_or_try_init(|| {
                self.hasher
                    .hash_async("civic-board-dummy-password".to_string())
            })
            .await
            .map(String::as_str)
    }
}
