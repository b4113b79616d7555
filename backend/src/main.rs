//! Civic Board Backend
//!
//! Authentication and request identity for the civic issue board.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling and routing
//! - Auth: hashing, sessions, tokens and identity resolution
//! - Store: identity and session persistence (PostgreSQL, Redis, in-memory)

use anyhow::Result;
use civic_board_backend::{
    config::{self, IdentityBackend, SessionBackend},
    db, routes,
    state::{AppState, MIN_SECRET_LEN},
    store::{
        spawn_sweeper, IdentityStore, MemoryIdentityStore, MemorySessionStore, PgIdentityStore,
        RedisSessionStore, SessionStore, StoreError,
    },
};
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Civic Board Backend"
    );

    // Validate production configuration
    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let identities = build_identity_store(&config).await?;
    let session_store = build_session_store(&config).await?;

    // Create application state (validates lifetimes and secrets)
    let state = AppState::new(config.clone(), identities, session_store.clone())?;

    let sweeper = spawn_sweeper(
        session_store,
        Duration::from_secs(config.session.sweep_interval_secs),
    );

    // Build application
    let app = routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

async fn build_identity_store(config: &config::AppConfig) -> Result<Arc<dyn IdentityStore>> {
    match config.identity.backend {
        IdentityBackend::Postgres => {
            info!("Connecting to database...");
            let pool = db::create_pool(&config.database).await?;

            // Run migrations (skip in production if using separate migration job)
            if !config::AppConfig::is_production() {
                info!("Running database migrations...");
                db::run_migrations(&pool).await?;
            }

            Ok(Arc::new(PgIdentityStore::new(pool)))
        }
        IdentityBackend::Memory => {
            warn!("Using in-memory identity store; accounts are lost on restart");
            Ok(Arc::new(MemoryIdentityStore::new()))
        }
    }
}

/// Build the session store with graceful fallback
///
/// Outside production a Redis outage at startup degrades to in-memory
/// sessions. In production it is fatal: per-process sessions would not
/// resolve across instances.
async fn build_session_store(config: &config::AppConfig) -> Result<Arc<dyn SessionStore>> {
    match config.session.backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
        SessionBackend::Redis => {
            info!("Connecting to Redis...");
            match RedisSessionStore::connect(&config.redis.url).await {
                Ok(store) => {
                    info!("Redis connection established");
                    Ok(Arc::new(store))
                }
                Err(e) => redis_fallback(e, config::AppConfig::is_production()),
            }
        }
    }
}

fn redis_fallback(err: StoreError, production: bool) -> Result<Arc<dyn SessionStore>> {
    if production {
        error!("Failed to connect to Redis: {}", err);
        anyhow::bail!("Redis session store unavailable in production");
    }
    warn!(
        "Failed to connect to Redis: {}. Falling back to in-memory sessions.",
        err
    );
    Ok(Arc::new(MemorySessionStore::new()))
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "civic_board_backend=info,tower_http=info".into()
        } else {
            "civic_board_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

fn secret_is_strong(secret: Option<&SecretString>) -> bool {
    secret.is_some_and(|s| s.expose_secret().len() >= MIN_SECRET_LEN)
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Generated secrets would log everyone out on every deploy
    if !secret_is_strong(config.auth.token_secret.as_ref()) {
        errors.push("auth.token_secret must be set and at least 32 characters");
    }
    if !secret_is_strong(config.auth.session_secret.as_ref()) {
        errors.push("auth.session_secret must be set and at least 32 characters");
    }

    if config.identity.backend == IdentityBackend::Memory {
        errors.push("identity.backend = \"memory\" is not allowed in production");
    }

    // Check database URL is not localhost in production
    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
