//! Bearer token issuance and verification
//!
//! Tokens are HS256 JWTs carrying `{sub, iat, exp}`, where `sub` is the
//! numeric identity id. They are stateless: nothing is stored server-side
//! and a token stays valid until it expires, logout included.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Why a bearer token was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Undecodable, or the signature does not check out
    #[error("malformed token")]
    Malformed,

    /// Signature valid, expiry passed
    #[error("token expired")]
    Expired,

    /// Signature valid, but no usable identity claim
    #[error("token has no identity claim")]
    MissingClaim,
}

/// Pre-computed JWT keys for efficient token operations
/// These are expensive to create, so we cache them in AppState
#[derive(Clone)]
struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: Arc::new(EncodingKey::from_secret(bytes)),
            decoding: Arc::new(DecodingKey::from_secret(bytes)),
        }
    }
}

/// Token service for issuing and verifying bearer tokens
///
/// The signing secret is handed in at construction; keys are wrapped
/// in Arc so cloning the service is cheap.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    validation: Arc<Validation>,
    ttl_secs: i64,
}

impl TokenService {
    /// Create a token service from a signing secret
    ///
    /// Call this once at application startup and store in AppState.
    pub fn new(secret: &SecretString, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            keys: JwtKeys::new(secret),
            validation: Arc::new(validation),
            ttl_secs,
        }
    }

    /// Issue a token for an identity
    pub fn issue(&self, identity_id: i64) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: Some(identity_id.to_string()),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {}", e))
    }

    /// Verify a token and return the identity id it names
    ///
    /// The signature is checked before any claim is looked at.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let data = decode::<Claims>(token, &self.keys.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            },
        )?;

        data.claims
            .sub
            .as_deref()
            .and_then(|sub| sub.parse::<i64>().ok())
            .ok_or(TokenError::MissingClaim)
    }

    /// Token lifetime in seconds
    #[inline]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }
}
