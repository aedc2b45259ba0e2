use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::kernel::{StoreError, StoreResult};

/// Registered account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account about to be inserted; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

const UNIQUE_EMAIL_CONSTRAINT: &str = "users_email_key";

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl User {
    /// Insert a user, mapping the email uniqueness violation to `DuplicateEmail`
    pub async fn insert(user: &NewUser, pool: &PgPool) -> StoreResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            let duplicate = e.as_database_error().is_some_and(|db| {
                db.is_unique_violation() && db.constraint() == Some(UNIQUE_EMAIL_CONSTRAINT)
            });
            if duplicate {
                StoreError::DuplicateEmail
            } else {
                e.into()
            }
        })
    }

    /// Find user by email (exact match)
    pub async fn find_by_email(email: &str, pool: &PgPool) -> StoreResult<Self> {
        sqlx::query_as::<_, Self>(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Find user by ID
    pub async fn find_by_id(id: i64, pool: &PgPool) -> StoreResult<Self> {
        sqlx::query_as::<_, Self>(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
