use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::kernel::{StoreError, StoreResult};

/// Characters of content shown in listings
pub const EXCERPT_CHARS: usize = 500;

/// A story joined with its owner's email
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Story {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_email: String,
}

/// Title and content as submitted by the owner
#[derive(Debug, Clone)]
pub struct StoryDraft {
    pub title: String,
    pub content: String,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Story {
    /// Insert a story for `user_id`
    pub async fn insert(user_id: i64, draft: &StoryDraft, pool: &PgPool) -> StoreResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            WITH inserted AS (
                INSERT INTO stories (title, content, user_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT inserted.id, inserted.title, inserted.content, inserted.user_id,
                   inserted.created_at, inserted.updated_at, users.email AS user_email
            FROM inserted
            INNER JOIN users ON inserted.user_id = users.id
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Find story by ID
    pub async fn find_by_id(id: i64, pool: &PgPool) -> StoreResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT stories.id, stories.title, stories.content, stories.user_id,
                   stories.created_at, stories.updated_at, users.email AS user_email
            FROM stories
            INNER JOIN users ON stories.user_id = users.id
            WHERE stories.id = $1
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Newest stories with content cut to an excerpt
    pub async fn find_latest(limit: i64, pool: &PgPool) -> StoreResult<Vec<Self>> {
        Self::find_page(limit, 0, pool).await
    }

    /// One page of stories, newest first
    pub async fn find_page(limit: i64, offset: i64, pool: &PgPool) -> StoreResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT stories.id, stories.title, LEFT(stories.content, 500) AS content,
                   stories.user_id, stories.created_at, stories.updated_at,
                   users.email AS user_email
            FROM stories
            INNER JOIN users ON stories.user_id = users.id
            ORDER BY stories.created_at DESC, stories.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count(pool: &PgPool) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stories")
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Owner-scoped update; `NotFound` when the id/owner pair matches nothing
    pub async fn update(
        id: i64,
        user_id: i64,
        draft: &StoryDraft,
        pool: &PgPool,
    ) -> StoreResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            WITH updated AS (
                UPDATE stories
                SET title = $1, content = $2, updated_at = NOW()
                WHERE id = $3 AND user_id = $4
                RETURNING *
            )
            SELECT updated.id, updated.title, updated.content, updated.user_id,
                   updated.created_at, updated.updated_at, users.email AS user_email
            FROM updated
            INNER JOIN users ON updated.user_id = users.id
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    /// Owner-scoped delete; `NotFound` when nothing was deleted
    pub async fn delete(id: i64, user_id: i64, pool: &PgPool) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
