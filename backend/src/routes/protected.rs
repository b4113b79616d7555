//! Routes under the protected namespace
//!
//! The whole router returned here sits behind `require_auth`; handlers
//! can rely on an [`AuthUser`] being present.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    routing::{any, get},
    Json, Router,
};
use civic_board_shared::CurrentUser;

/// Routes under the prefix
///
/// The catch-all sits behind the gate too, so anonymous callers get 401
/// for every path in the namespace, known or not.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/*rest", any(not_found))
}

/// GET {prefix}/me
async fn me(user: AuthUser) -> Json<CurrentUser> {
    Json(CurrentUser {
        user: user.identity.view(),
        source: user.source,
    })
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
