//! Request identity resolution
//!
//! Every request runs through one ordered pipeline:
//!
//! 1. a session cookie naming a live session and a live identity wins;
//! 2. otherwise a `Bearer` token is verified. A token that is offered but
//!    malformed or expired rejects the request outright, while a request
//!    with no token simply continues;
//! 3. otherwise the caller is anonymous.
//!
//! The outcome is attached to the request only once it is final.

use super::jwt::TokenService;
use super::session::SessionManager;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Identity, IdentityStore};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use civic_board_shared::AuthSource;
use std::sync::Arc;
use tracing::debug;

/// Who is making the current request
#[derive(Debug, Clone)]
pub enum ResolvedIdentity {
    Anonymous,
    Authenticated {
        identity: Identity,
        source: AuthSource,
    },
}

impl ResolvedIdentity {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            ResolvedIdentity::Anonymous => None,
            ResolvedIdentity::Authenticated { identity, .. } => Some(identity),
        }
    }

    pub fn source(&self) -> Option<AuthSource> {
        match self {
            ResolvedIdentity::Anonymous => None,
            ResolvedIdentity::Authenticated { source, .. } => Some(*source),
        }
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, ResolvedIdentity::Authenticated { .. })
    }
}

/// Resolves the caller from a session id and/or bearer token
#[derive(Clone)]
pub struct IdentityResolver {
    sessions: SessionManager,
    tokens: TokenService,
    identities: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(
        sessions: SessionManager,
        tokens: TokenService,
        identities: Arc<dyn IdentityStore>,
    ) -> Self {
        Self {
            sessions,
            tokens,
            identities,
        }
    }

    /// Run the session-then-token pipeline
    pub async fn resolve(
        &self,
        session_id: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<ResolvedIdentity, ApiError> {
        if let Some(session_id) = session_id {
            if let Some(identity) = self.sessions.resolve(session_id).await? {
                return Ok(ResolvedIdentity::Authenticated {
                    identity,
                    source: AuthSource::Session,
                });
            }
        }

        if let Some(token) = bearer {
            let identity_id = self.tokens.verify(token).map_err(|e| {
                debug!("Bearer token rejected: {}", e);
                ApiError::Token(e)
            })?;

            return match self.identities.find_by_id(identity_id).await? {
                Some(identity) => Ok(ResolvedIdentity::Authenticated {
                    identity,
                    source: AuthSource::Token,
                }),
                None => {
                    debug!(identity_id, "Token names an identity that no longer exists");
                    Ok(ResolvedIdentity::Anonymous)
                }
            };
        }

        Ok(ResolvedIdentity::Anonymous)
    }
}

/// Extract a bearer token, if one is offered
///
/// A missing header or a non-Bearer scheme both mean "no token". The
/// scheme name is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("Bearer")
        .then(|| token.trim())
}

/// Router-wide middleware attaching a [`ResolvedIdentity`] to every request
pub async fn resolve_identity(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session_id = jar
        .get(state.cookies.name())
        .map(|cookie| cookie.value().to_owned());
    let bearer = bearer_token(request.headers()).map(str::to_owned);

    let resolved = state
        .resolver
        .resolve(session_id.as_deref(), bearer.as_deref())
        .await?;

    request.extensions_mut().insert(resolved);
    Ok(next.run(request).await)
}
