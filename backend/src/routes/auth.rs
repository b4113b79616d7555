//! Authentication routes
//!
//! Provides endpoints for registration, login, logout, the current
//! identity, and bearer token renewal.
//!
//! # Performance Optimizations
//!
//! - Uses pre-computed JWT keys from AppState (no per-request allocation)
//! - Password hashing runs on blocking thread pool (doesn't block async runtime)

use crate::auth::{require_auth, AuthUser};
use crate::error::ApiResult;
use crate::state::AppState;
use crate::store::{NewIdentity, StoreError};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use civic_board_shared::{
    validation, AuthResponse, CurrentUser, LoginRequest, RegisterRequest, Role, StatusResponse,
    TokenResponse, UserView,
};
use tracing::info;

const TOKEN_TYPE: &str = "Bearer";

/// Account routes: registration, login and logout
///
/// These read the session cookie themselves and never consult the bearer
/// token, so a stale `Authorization` header cannot lock a client out of
/// logging in again or logging out.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Routes that act on the resolved identity
pub fn identity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/user",
            get(current_user).route_layer(middleware::from_fn(require_auth)),
        )
        .route("/token", post(renew_token))
}

/// Register a new account and sign it in
///
/// POST /register
///
/// # Performance
/// Password hashing is offloaded to blocking thread pool.
async fn register(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, PrivateCookieJar, Json<UserView>)> {
    validation::validate_register(&req)?;

    if state.identities.find_by_username(&req.username).await?.is_some() {
        return Err(StoreError::UsernameTaken.into());
    }
    if state.identities.find_by_email(&req.email).await?.is_some() {
        return Err(StoreError::EmailTaken.into());
    }

    let password_hash = state.hasher.hash_async(req.password).await?;

    // The store re-checks uniqueness, so a concurrent registration
    // still surfaces as a conflict here
    let identity = state
        .identities
        .create(NewIdentity {
            username: req.username,
            email: req.email,
            password_hash,
            full_name: req.full_name,
            role: Role::User,
        })
        .await?;

    let session = state.sessions.create(identity.id).await?;
    let jar = jar.add(state.cookies.issue(session.id));

    info!(user_id = identity.id, "Registered new account");
    Ok((StatusCode::CREATED, jar, Json(identity.view())))
}

/// Login with username and password
///
/// POST /login
///
/// Every credential failure produces the same response.
async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(PrivateCookieJar, Json<AuthResponse>)> {
    validation::validate_login(&req)?;

    let identity = state
        .authenticator
        .authenticate(&req.username, &req.password)
        .await?;

    // Never carry a pre-login session id across a login
    if let Some(previous) = jar.get(state.cookies.name()) {
        state.sessions.destroy(previous.value()).await?;
    }

    let session = state.sessions.create(identity.id).await?;
    let token = state.tokens.issue(identity.id)?;
    let jar = jar.add(state.cookies.issue(session.id));

    info!(user_id = identity.id, "Login succeeded");
    Ok((
        jar,
        Json(AuthResponse {
            user: identity.view(),
            token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: state.tokens.ttl_secs(),
        }),
    ))
}

/// End the current session
///
/// POST /logout
///
/// Succeeds whether or not a session was present.
async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> ApiResult<(PrivateCookieJar, Json<StatusResponse>)> {
    if let Some(cookie) = jar.get(state.cookies.name()) {
        state.sessions.destroy(cookie.value()).await?;
    }

    let jar = jar.remove(state.cookies.removal());
    Ok((
        jar,
        Json(StatusResponse {
            status: "logged_out".to_string(),
        }),
    ))
}

/// Get the identity behind the current request
///
/// GET /user
async fn current_user(user: AuthUser) -> Json<CurrentUser> {
    Json(CurrentUser {
        user: user.identity.view(),
        source: user.source,
    })
}

/// Issue a fresh bearer token to an authenticated caller
///
/// POST /token
///
/// # Authentication
/// Either a session cookie or a valid Bearer token.
async fn renew_token(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<TokenResponse>> {
    let token = state.tokens.issue(user.identity.id)?;

    Ok(Json(TokenResponse {
        token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: state.tokens.ttl_secs(),
    }))
}
