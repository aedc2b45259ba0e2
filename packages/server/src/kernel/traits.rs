// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Login, signup and ownership rules live in domains/ and common/auth and
// are written against these traits.
//
// Naming convention: Base* for trait names (e.g., BaseRecordStore, BaseRenderer)

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::domains::auth::{NewUser, User};
use crate::domains::stories::{Story, StoryDraft};

// =============================================================================
// Record Store (Infrastructure - users and stories)
// =============================================================================

/// Failures surfaced by a record store.
///
/// `NotFound` and `DuplicateEmail` are distinguishable conditions the
/// handlers branch on; everything else is an unexpected failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait BaseRecordStore: Send + Sync {
    /// Insert a user; `DuplicateEmail` when the email is already on record
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    /// Exact (case-sensitive) email lookup
    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    async fn get_user_by_id(&self, id: i64) -> StoreResult<User>;

    async fn insert_story(&self, owner_id: i64, draft: StoryDraft) -> StoreResult<Story>;

    async fn get_story(&self, id: i64) -> StoreResult<Story>;

    /// Newest stories first
    async fn list_latest(&self, limit: i64) -> StoreResult<Vec<Story>>;

    /// Newest stories first, 1-based page
    async fn list_page(&self, page: i64, page_size: i64) -> StoreResult<Vec<Story>>;

    async fn count_all(&self) -> StoreResult<i64>;

    /// Update title/content of a story owned by `owner_id`; bumps `updated_at`.
    /// `NotFound` when no story with that id belongs to the owner.
    async fn update_story(&self, id: i64, owner_id: i64, draft: StoryDraft)
        -> StoreResult<Story>;

    /// Delete a story owned by `owner_id`; `NotFound` when nothing was deleted
    async fn delete_story(&self, id: i64, owner_id: i64) -> StoreResult<()>;

    /// Cheap liveness check for /health
    async fn health_check(&self) -> StoreResult<()>;
}

// =============================================================================
// Password Hashing (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BasePasswordHasher: Send + Sync {
    /// One-way, deliberately slow hash of a plaintext password
    async fn hash(&self, password: &str) -> Result<String>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable
    async fn verify(&self, password: &str, hash: &str) -> Result<bool>;

    /// Hash of no account's password, with the same cost as real ones.
    /// Verified against when no account matches so both paths take as long.
    async fn dummy_hash(&self) -> Result<String>;
}

// =============================================================================
// Page Rendering (Infrastructure)
// =============================================================================

pub trait BaseRenderer: Send + Sync {
    /// Render a named page with its data mapping
    fn render(&self, template: &str, data: &serde_json::Value) -> Result<String>;

    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }
}

// =============================================================================
// Anti-forgery tokens (Infrastructure)
// =============================================================================

/// Anti-forgery tokens bound to a session
pub trait BaseCsrfTokens: Send + Sync {
    /// Fresh unguessable token
    fn issue(&self) -> String;

    /// Whether `submitted` matches the session's `expected` token
    fn verify(&self, expected: &str, submitted: &str) -> bool;
}
