//! Route definitions for the Civic Board API
//!
//! This module organizes all API routes and applies middleware.
//!
//! `/user`, `/token` and the protected namespace pass through identity
//! resolution, where an offered-but-invalid bearer token is fatal, and
//! then require an authenticated caller. Health probes and the account
//! routes (`/register`, `/login`, `/logout`) skip resolution.

use crate::auth::{require_auth, resolve_identity};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod auth;
mod health;
mod protected;


pub use auth::{account_routes, identity_routes};
pub use protected::protected_routes;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let protected_prefix = state.config().auth.protected_prefix.clone();

    let identity_aware = Router::new()
        .merge(auth::identity_routes())
        .nest(
            &protected_prefix,
            protected::protected_routes().route_layer(middleware::from_fn(require_auth)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_identity,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .merge(auth::account_routes())
        .merge(identity_aware)
        // Apply middleware layers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
