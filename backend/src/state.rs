//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys and the cookie key are
//!    derived once at startup
//! 2. **Cheap cloning**: All fields use Arc or are already Clone-cheap
//! 3. **Explicit secrets**: Signing and cookie secrets come from config
//!    (or are generated here), never from globals

use crate::auth::{
    CredentialAuthenticator, CredentialHasher, IdentityResolver, SessionCookie, SessionManager,
    TokenService,
};
use crate::config::AppConfig;
use crate::store::{IdentityStore, SessionStore};
use anyhow::{bail, Result};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::warn;

/// Minimum length for externally supplied secrets
pub const MIN_SECRET_LEN: usize = 32;

/// Shared application state
///
/// This struct holds all shared resources that handlers need access to.
/// All fields are designed for cheap cloning across async tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    pub identities: Arc<dyn IdentityStore>,
    pub session_store: Arc<dyn SessionStore>,
    pub hasher: CredentialHasher,
    pub authenticator: CredentialAuthenticator,
    pub sessions: SessionManager,
    /// Pre-initialized token service with cached keys
    pub tokens: TokenService,
    pub resolver: IdentityResolver,
    pub cookies: SessionCookie,
    cookie_key: Key,
}

impl AppState {
    /// Create a new application state
    ///
    /// Missing secrets are generated here, once; everything signed or
    /// encrypted with them stops verifying after a restart.
    pub fn new(
        config: AppConfig,
        identities: Arc<dyn IdentityStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        config.validate()?;
        validate_protected_prefix(&config.auth.protected_prefix)?;

        let hasher = CredentialHasher::new(config.hasher.clone())?;
        let tokens = TokenService::new(&token_secret(&config)?, config.auth.token_ttl_secs);
        let cookie_key = cookie_key(&config)?;

        let sessions = SessionManager::new(
            session_store.clone(),
            identities.clone(),
            config.session.ttl_secs,
        );
        let authenticator = CredentialAuthenticator::new(identities.clone(), hasher.clone());
        let resolver = IdentityResolver::new(sessions.clone(), tokens.clone(), identities.clone());
        let cookies = SessionCookie::new(
            config.session.cookie_name.clone(),
            AppConfig::is_production(),
            config.session.ttl_secs,
        );

        Ok(Self {
            config: Arc::new(config),
            identities,
            session_store,
            hasher,
            authenticator,
            sessions,
            tokens,
            resolver,
            cookies,
            cookie_key,
        })
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

fn validate_protected_prefix(prefix: &str) -> Result<()> {
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        bail!(
            "auth.protected_prefix must look like \"/api\", got {:?}",
            prefix
        );
    }
    Ok(())
}

fn check_secret_len(name: &str, secret: &SecretString) -> Result<()> {
    if secret.expose_secret().len() < MIN_SECRET_LEN {
        bail!("{} must be at least {} bytes", name, MIN_SECRET_LEN);
    }
    Ok(())
}

/// Configured token signing secret, or a fresh random one
fn token_secret(config: &AppConfig) -> Result<SecretString> {
    match &config.auth.token_secret {
        Some(secret) => {
            check_secret_len("auth.token_secret", secret)?;
            Ok(secret.clone())
        }
        None => {
            warn!("No token secret configured; generated one for this process only");
            let mut bytes = [0u8; 64];
            OsRng.fill_bytes(&mut bytes);
            Ok(SecretString::new(hex::encode(bytes)))
        }
    }
}

/// Cookie encryption key derived from the session secret, or a fresh random one
fn cookie_key(config: &AppConfig) -> Result<Key> {
    match &config.auth.session_secret {
        Some(secret) => {
            check_secret_len("auth.session_secret", secret)?;
            Ok(Key::derive_from(secret.expose_secret().as_bytes()))
        }
        None => {
            warn!("No session secret configured; generated one for this process only");
            Ok(Key::generate())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HasherConfig;
    use crate::store::{MemoryIdentityStore, MemorySessionStore};

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.hasher = HasherConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
            output_len: 32,
            salt_len: 16,
        };
        config
    }

    fn build(config: AppConfig) -> Result<AppState> {
        AppState::new(
            config,
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[test]
    fn test_state_clone_is_cheap() {
        let state = build(test_config()).unwrap();
        // Clone should be O(1) - just Arc increments
        let _cloned = state.clone();
    }

    #[test]
    fn test_generated_secret_is_usable() {
        let state = build(test_config()).unwrap();
        let token = state.tokens.issue(9).unwrap();
        assert_eq!(state.tokens.verify(&token), Ok(9));
    }

    #[test]
    fn test_configured_secret_is_deterministic() {
        let secret = "a-test-signing-secret-of-at-least-32-bytes";
        let mut config = test_config();
        config.auth.token_secret = Some(SecretString::new(secret.to_string()));
        let a = build(config.clone()).unwrap();
        let b = build(config).unwrap();

        let token = a.tokens.issue(5).unwrap();
        assert_eq!(b.tokens.verify(&token), Ok(5));
    }

    #[test]
    fn test_generated_secrets_differ_per_process() {
        let a = build(test_config()).unwrap();
        let b = build(test_config()).unwrap();
        let token = a.tokens.issue(5).unwrap();
        assert!(b.tokens.verify(&token).is_err());
    }

    #[test]
    fn test_short_secrets_are_rejected() {
        let mut config = test_config();
        config.auth.session_secret = Some(SecretString::new("short".to_string()));
        assert!(build(config).is_err());

        let mut config = test_config();
        config.auth.token_secret = Some(SecretString::new("short".to_string()));
        assert!(build(config).is_err());
    }

    #[test]
    fn test_zero_sweep_interval_is_rejected() {
        let mut config = test_config();
        config.session.sweep_interval_secs = 0;
        assert!(build(config).is_err());
    }

    #[test]
    fn test_bad_protected_prefix_is_rejected() {
        for prefix in ["api", "/", "/api/", ""] {
            let mut config = test_config();
            config.auth.protected_prefix = prefix.to_string();
            assert!(build(config).is_err(), "accepted {:?}", prefix);
        }
    }
}
