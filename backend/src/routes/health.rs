//! Health check endpoints
//!
//! Provides Kubernetes-compatible health check endpoints:
//! - /health - Basic health check
//! - /health/ready - Readiness probe (pings the identity and session stores)
//! - /health/live - Liveness probe (always returns OK if server is running)

use crate::state::AppState;
use crate::store::StoreError;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub identity_store: CheckStatus,
    pub session_store: CheckStatus,
}

/// Status of an individual check
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckStatus {
    /// The cause stays in the server log; probes are unauthenticated
    fn from_ping(store: &str, result: Result<(), StoreError>) -> Self {
        match result {
            Ok(()) => CheckStatus {
                status: "healthy".to_string(),
                message: None,
            },
            Err(e) => {
                warn!(store, "Readiness ping failed: {:?}", e);
                CheckStatus {
                    status: "unhealthy".to_string(),
                    message: Some("unreachable".to_string()),
                }
            }
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

/// Readiness probe - checks if the service is ready to accept traffic
/// Returns 503 if any store is unreachable
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (identity_ping, session_ping) =
        tokio::join!(state.identities.ping(), state.session_store.ping());

    let checks = HealthChecks {
        identity_store: CheckStatus::from_ping("identity", identity_ping),
        session_store: CheckStatus::from_ping("session", session_ping),
    };
    let is_healthy = checks.identity_store.is_healthy() && checks.session_store.is_healthy();

    let response = HealthResponse {
        status: if is_healthy { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
    };

    if is_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Liveness probe - checks if the service is alive
/// Always returns OK if the server is running
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, HasherConfig};
    use crate::store::{Identity, IdentityStore, MemorySessionStore, NewIdentity};
    use async_trait::async_trait;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
        assert!(!response.version.is_empty());
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        let response = liveness_check().await;
        assert_eq!(response.status, "alive");
    }

    #[test]
    fn test_failed_ping_is_unhealthy() {
        let check = CheckStatus::from_ping(
            "identity",
            Err(StoreError::unavailable(anyhow::anyhow!("down"))),
        );
        assert!(!check.is_healthy());
        assert_eq!(check.message.as_deref(), Some("unreachable"));
    }

    struct FailingIdentityStore;

    #[async_trait]
    impl IdentityStore for FailingIdentityStore {
        async fn find_by_username(&self, _: &str) -> Result<Option<Identity>, StoreError> {
            Ok(None)
        }

        async fn find_by_id(&self, _: i64) -> Result<Option<Identity>, StoreError> {
            Ok(None)
        }

        async fn find_by_email(&self, _: &str) -> Result<Option<Identity>, StoreError> {
            Ok(None)
        }

        async fn create(&self, _: NewIdentity) -> Result<Identity, StoreError> {
            Err(StoreError::unavailable(anyhow::anyhow!("read-only")))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::unavailable(anyhow::anyhow!(
                "password authentication failed for user \"civic_admin\" at 10.0.0.5:5432"
            )))
        }
    }

    #[tokio::test]
    async fn test_readiness_hides_store_failure_cause() {
        let mut config = AppConfig::default();
        config.hasher = HasherConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
            output_len: 32,
            salt_len: 16,
        };
        let state = AppState::new(
            config,
            Arc::new(FailingIdentityStore),
            Arc::new(MemorySessionStore::new()),
        )
        .unwrap();

        let (status, Json(response)) = readiness_check(State(state)).await.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let body = serde_json::to_string(&response).unwrap();
        assert!(body.contains("unreachable"));
        assert!(!body.contains("10.0.0.5"));
        assert!(!body.contains("civic_admin"));
    }
}
