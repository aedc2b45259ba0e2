//! Test harness for driving the full router in-process.
//!
//! Each test gets its own in-memory record store and session key, so tests
//! never share users, stories or cookies. Password hashing uses cheap
//! Argon2 parameters to keep the suite fast.

use axum::Router;
use std::sync::Arc;
use storyboard_core::domains::auth::{NewUser, User};
use storyboard_core::kernel::{Argon2Hasher, BasePasswordHasher, BaseRecordStore, MemoryRecordStore};
use storyboard_core::domains::stories::{Story, StoryDraft};
use storyboard_core::server::auth::{CookieOptions, SessionStore};
use storyboard_core::server::{build_app, with_pipeline, AppState};
use test_context::AsyncTestContext;

use super::TestClient;

/// Password every seeded user gets
pub const TEST_PASSWORD: &str = "correct horse";

/// Test harness that manages in-process infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let mut client = ctx.client();
///     let page = client.get("/").await;
/// }
/// ```
pub struct TestHarness {
    /// Record store behind the app - use this for fixtures and assertions.
    pub store: MemoryRecordStore,
    pub hasher: Arc<Argon2Hasher>,
    pub state: AppState,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {}
}

impl TestHarness {
    pub fn new() -> Self {
        // Uses try_init() to avoid panicking if already initialized.
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = MemoryRecordStore::new();
        let hasher =
            Arc::new(Argon2Hasher::with_cost(1024, 1, 1).expect("cheap argon2 params are valid"));
        let sessions = Arc::new(SessionStore::new(
            &rand::random::<[u8; 32]>(),
            CookieOptions::default(),
        ));
        let state = AppState::new(Arc::new(store.clone()), hasher.clone(), sessions);

        Self {
            store,
            hasher,
            state,
        }
    }

    /// The full application as served in production
    pub fn app(&self) -> Router {
        build_app(self.state.clone())
    }

    /// Client against the full application, starting with no cookies
    pub fn client(&self) -> TestClient {
        TestClient::new(self.app())
    }

    /// Client against extra routes wrapped in the standard pipeline
    pub fn client_for(&self, routes: Router) -> TestClient {
        TestClient::new(with_pipeline(routes, self.state.clone()))
    }

    /// Insert a user whose password is `TEST_PASSWORD`
    pub async fn seed_user(&self, email: &str) -> User {
        let password_hash = self
            .hasher
            .hash(TEST_PASSWORD)
            .await
            .expect("hashing succeeds");
        self.store
            .insert_user(NewUser {
                email: email.to_string(),
                password_hash,
            })
            .await
            .expect("seed user")
    }

    pub async fn seed_story(&self, owner: &User, title: &str) -> Story {
        self.store
            .insert_story(
                owner.id,
                StoryDraft {
                    title: title.to_string(),
                    content: format!("Content of {}", title),
                },
            )
            .await
            .expect("seed story")
    }

    /// Seed a user and return a client already logged in as them
    pub async fn logged_in(&self, email: &str) -> (User, TestClient) {
        let user = self.seed_user(email).await;
        let mut client = self.client();
        let response = client
            .post_form("/login/submit", &[("email", email), ("password", TEST_PASSWORD)])
            .await;
        assert_eq!(response.status, 303, "login should redirect");
        (user, client)
    }
}
