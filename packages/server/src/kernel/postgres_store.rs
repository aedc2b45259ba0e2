//! PostgreSQL record store.
//!
//! Thin adapter over the SQL that lives on the `User` and `Story` models.
//! The pool handles its own connection management, so the store is shared
//! across requests without extra locking.

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::{BaseRecordStore, StoreResult};
use crate::common::pagination::offset;
use crate::domains::auth::{NewUser, User};
use crate::domains::stories::{Story, StoryDraft};

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseRecordStore for PgRecordStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        User::insert(&user, &self.pool).await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        User::find_by_email(email, &self.pool).await
    }

    async fn get_user_by_id(&self, id: i64) -> StoreResult<User> {
        User::find_by_id(id, &self.pool).await
    }

    async fn insert_story(&self, owner_id: i64, draft: StoryDraft) -> StoreResult<Story> {
        Story::insert(owner_id, &draft, &self.pool).await
    }

    async fn get_story(&self, id: i64) -> StoreResult<Story> {
        Story::find_by_id(id, &self.pool).await
    }

    async fn list_latest(&self, limit: i64) -> StoreResult<Vec<Story>> {
        Story::find_latest(limit, &self.pool).await
    }

    async fn list_page(&self, page: i64, page_size: i64) -> StoreResult<Vec<Story>> {
        Story::find_page(page_size, offset(page, page_size), &self.pool).await
    }

    async fn count_all(&self) -> StoreResult<i64> {
        Story::count(&self.pool).await
    }

    async fn update_story(
        &self,
        id: i64,
        owner_id: i64,
        draft: StoryDraft,
    ) -> StoreResult<Story> {
        Story::update(id, owner_id, &draft, &self.pool).await
    }

    async fn delete_story(&self, id: i64, owner_id: i64) -> StoreResult<()> {
        Story::delete(id, owner_id, &self.pool).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
