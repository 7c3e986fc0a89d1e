/// User Store
///
/// The auth helper only reads users by exact username. Registration also
/// needs to create them. Postgres backs production; the in-memory store
/// backs tests and local runs without a database.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use crate::error::{AppError, DatabaseError};

/// A stored user. The bcrypt hash is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub is_admin: bool,
}

/// Fields needed to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup; `Ok(None)` when no such user exists
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError>;

    /// Insert a user, failing with a unique-constraint error if the username is taken
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, AppError>;
}

/// PostgreSQL-backed store over the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password, is_admin FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, password, is_admin)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, is_admin
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.is_admin)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }
}

/// Store that keeps users in process memory, keyed by username
#[derive(Debug)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
    next_id: AtomicI64,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AppError {
        AppError::Internal("User store lock poisoned".to_string())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        Ok(users.get(username).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, AppError> {
        let mut users = self.users.write().map_err(|_| Self::poisoned())?;

        if users.contains_key(&new_user.username) {
            return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
                "Username already taken".to_string(),
            )));
        }

        let user = UserRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            username: new_user.username,
            password_hash: new_user.password_hash,
            is_admin: new_user.is_admin,
        };
        users.insert(user.username.clone(), user.clone());

        Ok(user)
    }
}
