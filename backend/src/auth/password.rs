//! Password hashing using argon2
//!
//! Stored hashes have the form `<hash>.<salt>`, both lowercase hex.
//! Cost parameters are fixed for the whole process and come from
//! [`HasherConfig`]; verification re-derives with the same parameters,
//! taking only the output length from the stored value.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU- and memory-intensive. Async callers use
//! `hash_async` / `verify_async`, which run on the blocking thread pool.

use crate::config::HasherConfig;
use argon2::{
    password_hash::rand_core::{OsRng, RngCore},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Smallest salt accepted when hashing
pub const MIN_SALT_LEN: usize = 16;

/// Password hashing error types
#[derive(Error, Debug)]
pub enum HashError {
    #[error("invalid hasher parameters: {0}")]
    Params(String),

    #[error("entropy source failed: {0}")]
    Entropy(String),

    #[error("key derivation failed: {0}")]
    Derive(String),

    #[error("task join error: {0}")]
    Join(String),
}

/// Credential hasher
///
/// Uses Argon2id, the recommended variant for password hashing.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    config: HasherConfig,
}

impl CredentialHasher {
    /// Build a hasher, rejecting parameters argon2 would refuse
    pub fn new(config: HasherConfig) -> Result<Self, HashError> {
        if config.salt_len < MIN_SALT_LEN {
            return Err(HashError::Params(format!(
                "salt must be at least {} bytes",
                MIN_SALT_LEN
            )));
        }
        let hasher = Self { config };
        hasher.argon2(hasher.config.output_len)?;
        Ok(hasher)
    }

    fn argon2(&self, output_len: usize) -> Result<Argon2<'static>, HashError> {
        let params = Params::new(
            self.config.memory_kib,
            self.config.iterations,
            self.config.parallelism,
            Some(output_len),
        )
        .map_err(|e| HashError::Params(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password with a fresh random salt (blocking operation)
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let mut salt = vec![0u8; self.config.salt_len];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| HashError::Entropy(e.to_string()))?;

        let mut output = vec![0u8; self.config.output_len];
        self.argon2(self.config.output_len)?
            .hash_password_into(password.as_bytes(), &salt, &mut output)
            .map_err(|e| HashError::Derive(e.to_string()))?;

        Ok(format!("{}.{}", hex::encode(output), hex::encode(salt)))
    }

    /// Verify a password against a stored hash (blocking operation)
    ///
    /// A malformed stored value verifies as `false`, exactly like a
    /// wrong password.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let Some((hash_hex, salt_hex)) = stored.rsplit_once('.') else {
            return false;
        };
        let (Ok(expected), Ok(salt)) = (hex::decode(hash_hex), hex::decode(salt_hex)) else {
            return false;
        };
        if expected.is_empty() || salt.is_empty() {
            return false;
        }

        let Ok(argon2) = self.argon2(expected.len()) else {
            return false;
        };
        let mut derived = vec![0u8; expected.len()];
        if argon2
            .hash_password_into(password.as_bytes(), &salt, &mut derived)
            .is_err()
        {
            return false;
        }

        constant_time_eq(&derived, &expected)
    }

    /// Hash a password asynchronously (non-blocking)
    pub async fn hash_async(&self, password: String) -> Result<String, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashError::Join(e.to_string()))?
    }

    /// Verify a password asynchronously (non-blocking)
    pub async fn verify_async(&self, password: String, stored: String) -> Result<bool, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| HashError::Join(e.to_string()))
    }
}

/// Constant-time byte comparison to prevent timing attacks.
///
/// Only the lengths may leak; equal-length inputs are compared in full.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(HasherConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
        output_len: 32,
        salt_len: 16,
    })
    .unwrap()
}
