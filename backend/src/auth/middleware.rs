//! Route gating
//!
//! [`require_auth`] rejects anonymous callers. It is layered over the
//! whole protected namespace and can also be attached to a single route
//! with `route_layer`. [`AuthUser`] gives handlers the same check as an
//! extractor.

use super::resolver::ResolvedIdentity;
use crate::error::ApiError;
use crate::store::Identity;
use axum::{
    extract::Request,
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use civic_board_shared::AuthSource;
use tracing::debug;

/// Authenticated caller, as seen by handlers behind the gate
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
    pub source: AuthSource,
}

impl AuthUser {
    fn from_resolved(resolved: Option<&ResolvedIdentity>) -> Option<Self> {
        match resolved {
            Some(ResolvedIdentity::Authenticated { identity, source }) => Some(AuthUser {
                identity: identity.clone(),
                source: *source,
            }),
            _ => None,
        }
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        AuthUser::from_resolved(parts.extensions.get::<ResolvedIdentity>())
            .ok_or_else(ApiError::authentication_required)
    }
}

/// Reject anonymous requests, handing the identity on otherwise
///
/// Requests that never went through the resolver count as anonymous.
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(user) = AuthUser::from_resolved(request.extensions().get::<ResolvedIdentity>())
    else {
        debug!(path = %request.uri().path(), "Rejected anonymous request");
        return Err(ApiError::authentication_required());
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
