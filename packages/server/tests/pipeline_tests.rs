//! Integration tests for the request pipeline.
//!
//! Covers the interceptor chain end to end:
//! - Hardening headers on every response, errors included
//! - HTTPS redirect and HSTS for non-local hosts
//! - Panic containment, with the server still serving afterwards
//! - Anti-forgery tokens on state-changing requests
//! - Per-request context isolation under concurrency
//! - Identity lookup failures degrading to anonymous
//! - Static assets and health check outside the login gate

mod common;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use common::{TestClient, TestHarness, TestResponse, TEST_PASSWORD};
use std::sync::Arc;
use storyboard_core::domains::auth::{NewUser, User};
use storyboard_core::domains::stories::{Story, StoryDraft};
use storyboard_core::kernel::{BaseRecordStore, MemoryRecordStore, StoreError, StoreResult};
use storyboard_core::server::middleware::RequestContext;
use storyboard_core::server::{build_app, AppState};
use test_context::test_context;

fn assert_hardened(response: &TestResponse) {
    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(response.header("x-frame-options"), Some("deny"));
    assert_eq!(
        response.header("referrer-policy"),
        Some("strict-origin-when-cross-origin")
    );
    assert_eq!(response.header("x-xss-protection"), Some("1; mode=block"));
}

async fn whoami(ctx: RequestContext) -> String {
    ctx.user()
        .map(|u| u.email.clone())
        .unwrap_or_else(|| "anonymous".to_string())
}

async fn boom() -> &'static str {
    panic!("handler exploded")
}

/// Record store whose user-by-id lookups and health check fail
struct BrokenLookups {
    inner: MemoryRecordStore,
}

#[async_trait]
impl BaseRecordStore for BrokenLookups {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.inner.insert_user(user).await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.inner.get_user_by_email(email).await
    }

    async fn get_user_by_id(&self, _id: i64) -> StoreResult<User> {
        Err(StoreError::Unexpected(anyhow!("connection reset by peer")))
    }

    async fn insert_story(&self, owner_id: i64, draft: StoryDraft) -> StoreResult<Story> {
        self.inner.insert_story(owner_id, draft).await
    }

    async fn get_story(&self, id: i64) -> StoreResult<Story> {
        self.inner.get_story(id).await
    }

    async fn list_latest(&self, limit: i64) -> StoreResult<Vec<Story>> {
        self.inner.list_latest(limit).await
    }

    async fn list_page(&self, page: i64, page_size: i64) -> StoreResult<Vec<Story>> {
        self.inner.list_page(page, page_size).await
    }

    async fn count_all(&self) -> StoreResult<i64> {
        self.inner.count_all().await
    }

    async fn update_story(
        &self,
        id: i64,
        owner_id: i64,
        draft: StoryDraft,
    ) -> StoreResult<Story> {
        self.inner.update_story(id, owner_id, draft).await
    }

    async fn delete_story(&self, id: i64, owner_id: i64) -> StoreResult<()> {
        self.inner.delete_story(id, owner_id).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

/// Full app over `BrokenLookups`, sharing the harness's users and session key
fn broken_lookups_client(ctx: &TestHarness) -> TestClient {
    let store = BrokenLookups {
        inner: ctx.store.clone(),
    };
    let state = AppState::new(
        Arc::new(store),
        ctx.hasher.clone(),
        ctx.state.sessions.clone(),
    );
    TestClient::new(build_app(state))
}

fn test_routes() -> Router {
    Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route("/whoami", get(whoami))
        .route("/boom", get(boom))
}

// ============================================================================
// Headers
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_security_headers_on_pages_and_errors(ctx: &TestHarness) {
    let mut client = ctx.client();

    let home = client.get("/").await;
    assert_eq!(home.status, 200);
    assert_hardened(&home);

    let missing = client.get("/no/such/route").await;
    assert_eq!(missing.status, 404);
    assert_hardened(&missing);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_local_host_is_not_redirected(ctx: &TestHarness) {
    let mut client = ctx.client().with_host("127.0.0.1:4000", None);
    let response = client.get("/").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("strict-transport-security"), None);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_plain_http_redirects_to_https(ctx: &TestHarness) {
    let mut client = ctx.client().with_host("stories.example.com", None);
    let response = client.get("/stories?page=2").await;

    assert_eq!(response.status, 308);
    assert_eq!(
        response.location(),
        Some("https://stories.example.com/stories?page=2")
    );
    assert_hardened(&response);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_forwarded_https_gets_hsts(ctx: &TestHarness) {
    let mut client = ctx
        .client()
        .with_host("stories.example.com", Some("https"));
    let response = client.get("/").await;

    assert_eq!(response.status, 200);
    assert_eq!(
        response.header("strict-transport-security"),
        Some("max-age=63072000; includeSubDomains")
    );
}

// ============================================================================
// Panic containment
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_panic_becomes_generic_500(ctx: &TestHarness) {
    let mut client = ctx.client_for(test_routes());

    let response = client.get("/boom").await;
    assert_eq!(response.status, 500);
    assert_eq!(response.body, "Internal Server Error");
    assert!(!response.body.contains("exploded"));
    assert_eq!(response.header("connection"), Some("close"));
    assert_hardened(&response);

    // Same app keeps serving
    let after = client.get("/ok").await;
    assert_eq!(after.status, 200);
    assert_eq!(after.body, "ok");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_flash_is_consumed_even_when_handler_panics(ctx: &TestHarness) {
    let routes = test_routes().merge(storyboard_core::server::build_routes());
    let mut client = ctx.client_for(routes);

    // Anonymous visit to a protected page queues the login flash
    let redirect = client.get("/stories").await;
    assert_eq!(redirect.status, 303);

    // Delivered (and drained) on a request that then fails
    let failed = client.get("/boom").await;
    assert_eq!(failed.status, 500);

    let login = client.get("/login").await;
    assert_eq!(login.status, 200);
    assert!(login.flashes().is_empty());
}

// ============================================================================
// Anti-forgery tokens
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_form_without_token_is_forbidden(ctx: &TestHarness) {
    ctx.seed_user("ada@example.com").await;
    let mut client = ctx.client();
    client.get("/login").await;

    let response = client
        .post_form_raw(
            "/login/submit",
            &[("email", "ada@example.com"), ("password", TEST_PASSWORD)],
        )
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, "Forbidden");
    assert_hardened(&response);

    let after = client.get("/stories").await;
    assert_eq!(after.status, 303, "rejected login must not sign in");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_token_from_another_session_is_forbidden(ctx: &TestHarness) {
    let (_, mut alice) = ctx.logged_in("alice@example.com").await;
    let mut mallory = ctx.client();
    mallory.get("/login").await;
    let foreign = mallory.csrf_token().unwrap().to_string();

    let response = alice
        .post_form_raw(
            "/story/create",
            &[
                ("title", "Forged story"),
                ("content", "Not written by alice"),
                ("csrf_token", foreign.as_str()),
            ],
        )
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(ctx.store.count_all().await.unwrap(), 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_token_is_stable_for_the_session(ctx: &TestHarness) {
    let mut client = ctx.client();

    client.get("/login").await;
    let first = client.csrf_token().unwrap().to_string();
    client.get("/signup").await;
    assert_eq!(client.csrf_token(), Some(first.as_str()));

    let mut other = ctx.client();
    other.get("/login").await;
    assert_ne!(other.csrf_token(), Some(first.as_str()));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_rejected_post_leaves_flash_queued(ctx: &TestHarness) {
    let mut client = ctx.client();
    let redirect = client.get("/stories").await;
    assert_eq!(redirect.status, 303);

    let rejected = client.post_form_raw("/login/submit", &[]).await;
    assert_eq!(rejected.status, 403);

    let login = client.get("/login").await;
    assert_eq!(login.flashes(), vec!["Please login to access this page"]);
}

// ============================================================================
// Context isolation
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_concurrent_requests_keep_their_own_identity(ctx: &TestHarness) {
    let (_, alice) = ctx.logged_in("alice@example.com").await;
    let (_, bob) = ctx.logged_in("bob@example.com").await;
    let alice_cookie = alice.session_cookie().unwrap().to_string();
    let bob_cookie = bob.session_cookie().unwrap().to_string();

    let app = storyboard_core::server::with_pipeline(test_routes(), ctx.state.clone());

    let mut tasks = Vec::new();
    for i in 0..24 {
        let app = app.clone();
        let (cookie, expected) = match i % 3 {
            0 => (Some(alice_cookie.clone()), "alice@example.com"),
            1 => (Some(bob_cookie.clone()), "bob@example.com"),
            _ => (None, "anonymous"),
        };
        tasks.push(tokio::spawn(async move {
            let mut client = common::TestClient::new(app);
            if let Some(cookie) = cookie {
                client.set_session_cookie(&cookie);
            }
            let response = client.get("/whoami").await;
            assert_eq!(response.body, expected);
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_failed_identity_lookup_is_anonymous(ctx: &TestHarness) {
    ctx.seed_user("ada@example.com").await;
    let mut client = broken_lookups_client(ctx);

    let login = client
        .post_form(
            "/login/submit",
            &[("email", "ada@example.com"), ("password", TEST_PASSWORD)],
        )
        .await;
    assert_eq!(login.status, 303);

    let page = client.get("/login").await;
    assert_eq!(page.status, 200);
    assert_eq!(page.page()["data"]["is_authenticated"], false);

    let protected = client.get("/stories").await;
    assert_eq!(protected.status, 303);
    assert_eq!(protected.location(), Some("/login"));
}

// ============================================================================
// Unprotected surfaces
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_static_assets_bypass_login(ctx: &TestHarness) {
    let mut client = ctx.client();

    let css = client.get("/static/css/main.css").await;
    assert_eq!(css.status, 200);
    assert_eq!(css.header("content-type"), Some("text/css"));
    assert_eq!(css.header("cache-control"), Some("public, max-age=31536000"));
    assert_hardened(&css);

    let missing = client.get("/static/css/missing.css").await;
    assert_eq!(missing.status, 404);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_health_check(ctx: &TestHarness) {
    let mut client = ctx.client();
    let response = client.get("/health").await;

    assert_eq!(response.status, 200);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "ok");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_health_check_hides_store_errors(ctx: &TestHarness) {
    let mut client = broken_lookups_client(ctx);
    let response = client.get("/health").await;

    assert_eq!(response.status, 503);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"]["error"], "Query failed");
    assert!(!response.body.to_lowercase().contains("pool"));
}
