//! PostgreSQL identity store

use super::{Identity, IdentityStore, NewIdentity, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civic_board_shared::Role;
use sqlx::PgPool;

const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
struct IdentityRecord {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    full_name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdentityRecord> for Identity {
    type Error = StoreError;

    fn try_from(record: IdentityRecord) -> Result<Self, Self::Error> {
        let role = record
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::unavailable(anyhow::anyhow!(e)))?;

        Ok(Identity {
            id: record.id,
            username: record.username,
            email: record.email,
            password_hash: record.password_hash,
            full_name: record.full_name,
            role,
            created_at: record.created_at,
        })
    }
}

/// Identity store backed by the `users` table
///
/// Uniqueness of username and email is enforced by table constraints;
/// a violated constraint on insert surfaces as a conflict.
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(USERNAME_CONSTRAINT) => return StoreError::UsernameTaken,
                Some(EMAIL_CONSTRAINT) => return StoreError::EmailTaken,
                _ => {}
            }
        }
    }
    StoreError::unavailable(err)
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        sqlx::query_as::<_, IdentityRecord>(
            r#"
            SELECT id, username, email, password_hash, full_name, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::unavailable)?
        .map(Identity::try_from)
        .transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError> {
        sqlx::query_as::<_, IdentityRecord>(
            r#"
            SELECT id, username, email, password_hash, full_name, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::unavailable)?
        .map(Identity::try_from)
        .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        sqlx::query_as::<_, IdentityRecord>(
            r#"
            SELECT id, username, email, password_hash, full_name, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::unavailable)?
        .map(Identity::try_from)
        .transpose()
    }

    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let record = sqlx::query_as::<_, IdentityRecord>(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, full_name, role, created_at
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Identity::try_from(record)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(StoreError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(role: &str) -> IdentityRecord {
        IdentityRecord {
            id: 3,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "aa.bb".to_string(),
            full_name: "Alice".to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_converts_role() {
        let identity = Identity::try_from(record("moderator")).unwrap();
        assert_eq!(identity.role, Role::Moderator);
        assert_eq!(identity.id, 3);
    }

    #[test]
    fn test_unknown_role_is_store_error() {
        assert!(matches!(
            Identity::try_from(record("root")),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_non_database_errors_are_unavailable() {
        assert!(matches!(
            map_insert_error(sqlx::Error::RowNotFound),
            StoreError::Unavailable(_)
        ));
    }
}
