//! In-process record store.
//!
//! Same observable behaviour as `PgRecordStore`: exact email matching,
//! unique emails, owner-scoped update/delete, newest-first listings with the
//! owner's email joined and content cut to 500 characters.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{BaseRecordStore, StoreError, StoreResult};
use crate::common::pagination::offset;
use crate::domains::auth::{NewUser, User};
use crate::domains::stories::{Story, StoryDraft, EXCERPT_CHARS};

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    stories: BTreeMap<i64, StoredStory>,
    next_user_id: i64,
    next_story_id: i64,
}

#[derive(Clone)]
struct StoredStory {
    id: i64,
    title: String,
    content: String,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of user rows, for assertions in tests
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }
}

impl MemoryState {
    fn join(&self, stored: &StoredStory, excerpt: bool) -> Story {
        let content = if excerpt {
            stored.content.chars().take(EXCERPT_CHARS).collect()
        } else {
            stored.content.clone()
        };
        Story {
            id: stored.id,
            title: stored.title.clone(),
            content,
            user_id: stored.user_id,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            user_email: self
                .users
                .get(&stored.user_id)
                .map(|u| u.email.clone())
                .unwrap_or_default(),
        }
    }

    /// Newest first; ties broken by id so ordering is stable
    fn newest_first(&self) -> Vec<&StoredStory> {
        let mut all: Vec<&StoredStory> = self.stories.values().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        all
    }
}

#[async_trait]
impl BaseRecordStore for MemoryRecordStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        state.next_user_id += 1;
        let now = Utc::now();
        let record = User {
            id: state.next_user_id,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let state = self.state.read().await;
        state
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_id(&self, id: i64) -> StoreResult<User> {
        let state = self.state.read().await;
        state.users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn insert_story(&self, owner_id: i64, draft: StoryDraft) -> StoreResult<Story> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&owner_id) {
            return Err(StoreError::Unexpected(anyhow::anyhow!(
                "story owner {} does not exist",
                owner_id
            )));
        }
        state.next_story_id += 1;
        let now = Utc::now();
        let stored = StoredStory {
            id: state.next_story_id,
            title: draft.title,
            content: draft.content,
            user_id: owner_id,
            created_at: now,
            updated_at: now,
        };
        state.stories.insert(stored.id, stored.clone());
        Ok(state.join(&stored, false))
    }

    async fn get_story(&self, id: i64) -> StoreResult<Story> {
        let state = self.state.read().await;
        let stored = state.stories.get(&id).ok_or(StoreError::NotFound)?;
        Ok(state.join(stored, false))
    }

    async fn list_latest(&self, limit: i64) -> StoreResult<Vec<Story>> {
        let state = self.state.read().await;
        Ok(state
            .newest_first()
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|s| state.join(s, true))
            .collect())
    }

    async fn list_page(&self, page: i64, page_size: i64) -> StoreResult<Vec<Story>> {
        let state = self.state.read().await;
        Ok(state
            .newest_first()
            .into_iter()
            .skip(usize::try_from(offset(page, page_size)).unwrap_or(usize::MAX))
            .take(page_size.max(0) as usize)
            .map(|s| state.join(s, true))
            .collect())
    }

    async fn count_all(&self) -> StoreResult<i64> {
        Ok(self.state.read().await.stories.len() as i64)
    }

    async fn update_story(
        &self,
        id: i64,
        owner_id: i64,
        draft: StoryDraft,
    ) -> StoreResult<Story> {
        let mut state = self.state.write().await;
        let stored = state
            .stories
            .get_mut(&id)
            .filter(|s| s.user_id == owner_id)
            .ok_or(StoreError::NotFound)?;
        stored.title = draft.title;
        stored.content = draft.content;
        // updated_at strictly increases even when the clock has not ticked
        stored.updated_at = Utc::now().max(stored.updated_at + Duration::microseconds(1));
        let stored = stored.clone();
        Ok(state.join(&stored, false))
    }

    async fn delete_story(&self, id: i64, owner_id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.stories.get(&id) {
            Some(s) if s.user_id == owner_id => {
                state.stories.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn draft(title: &str) -> StoryDraft {
        StoryDraft {
            title: title.to_string(),
            content: "Some content".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryRecordStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();
        let err = store.insert_user(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = MemoryRecordStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();
        let err = store.get_user_by_email("A@example.com").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_pages_of_twenty_three() {
        let store = MemoryRecordStore::new();
        let owner = store.insert_user(new_user("a@example.com")).await.unwrap();
        for i in 0..23 {
            store
                .insert_story(owner.id, draft(&format!("Story number {}", i)))
                .await
                .unwrap();
        }

        assert_eq!(store.count_all().await.unwrap(), 23);
        assert_eq!(store.list_page(1, 10).await.unwrap().len(), 10);
        assert_eq!(store.list_page(2, 10).await.unwrap().len(), 10);
        assert_eq!(store.list_page(3, 10).await.unwrap().len(), 3);
        assert!(store.list_page(4, 10).await.unwrap().is_empty());

        let latest = store.list_latest(10).await.unwrap();
        assert_eq!(latest.len(), 10);
        assert_eq!(latest[0].title, "Story number 22");
        assert_eq!(latest[0].user_email, "a@example.com");
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_scoped() {
        let store = MemoryRecordStore::new();
        let owner = store.insert_user(new_user("a@example.com")).await.unwrap();
        let other = store.insert_user(new_user("b@example.com")).await.unwrap();
        let story = store.insert_story(owner.id, draft("Original title")).await.unwrap();

        let err = store
            .update_story(story.id, other.id, draft("Hijacked title"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        let err = store.delete_story(story.id, other.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        let updated = store
            .update_story(story.id, owner.id, draft("Updated title"))
            .await
            .unwrap();
        assert_eq!(updated.title, "Updated title");
        assert!(updated.updated_at > story.updated_at);

        store.delete_story(story.id, owner.id).await.unwrap();
        assert!(matches!(
            store.get_story(story.id).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_listing_truncates_content() {
        let store = MemoryRecordStore::new();
        let owner = store.insert_user(new_user("a@example.com")).await.unwrap();
        let long = StoryDraft {
            title: "Long story!".to_string(),
            content: "x".repeat(800),
        };
        let story = store.insert_story(owner.id, long).await.unwrap();

        assert_eq!(story.content.len(), 800);
        let latest = store.list_latest(1).await.unwrap();
        assert_eq!(latest[0].content.chars().count(), EXCERPT_CHARS);
    }
}
