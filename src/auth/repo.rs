use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::repo_types::User;
use crate::telemetry::{observe, op_span, Traced};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("email {email} is already taken")]
    UniqueViolation { email: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence port for user records, keyed by a unique email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), StoreError>;
    /// Returns [`StoreError::NotFound`] when no user has this email.
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;
}

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, full_name, email, password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::UniqueViolation {
                    email: user.email.clone(),
                }
            } else {
                StoreError::Database(e)
            }
        })?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, full_name, email, password, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl<S: UserStore> UserStore for Traced<S> {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let span = op_span!(
            "repository.CreateUser",
            user_id = %user.id,
            full_name = %user.full_name,
            email = %user.email,
            created_at = user.created_at.unix_timestamp(),
            updated_at = user.updated_at.unix_timestamp()
        );
        observe(span, "user created", self.0.create(user)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let span = op_span!(
            "repository.GetUserByEmail",
            email = %email,
            user_id = tracing::field::Empty
        );
        let user = observe(span.clone(), "user retrieved", self.0.find_by_email(email)).await?;
        span.record("user_id", tracing::field::display(user.id));
        Ok(user)
    }
}
