//! Identity and session storage
//!
//! The auth core talks to storage only through the [`IdentityStore`] and
//! [`SessionStore`] traits, so backends can be swapped without touching
//! the request pipeline.

mod identity;
mod postgres;
mod redis_store;
mod session;

pub use identity::{Identity, IdentityStore, MemoryIdentityStore, NewIdentity};
pub use postgres::PgIdentityStore;
pub use redis_store::RedisSessionStore;
pub use session::{spawn_sweeper, MemorySessionStore, SessionRecord, SessionStore};

use thiserror::Error;

/// Storage error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("email already registered")]
    EmailTaken,

    #[error("store unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

impl StoreError {
    pub fn unavailable(err: impl Into<anyhow::Error>) -> Self {
        StoreError::Unavailable(err.into())
    }
}
