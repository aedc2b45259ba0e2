//! Application setup: shared state, the interceptor chain and the router.

use std::sync::Arc;

use axum::{
    extract::Extension,
    middleware,
    routing::{get, post},
    Router,
};

use crate::config::default_local_hosts;
use crate::kernel::{
    BaseCsrfTokens, BasePasswordHasher, BaseRecordStore, BaseRenderer, JsonRenderer,
    RandomCsrfTokens,
};
use crate::server::auth::SessionStore;
use crate::server::middleware::{
    require_authentication, run_middleware_stack, Authenticate, EnforceHttps, FlashMessages,
    LogRequest, MiddlewareStack, RecoverPanic, SecureHeaders, VerifyCsrf,
};
use crate::server::routes::{
    create_story_handler, delete_story_handler, edit_story_form_handler, health_handler,
    home_handler, login_form_handler, login_submit_handler, logout_handler,
    signup_form_handler, signup_submit_handler, submit_story_form_handler,
    update_story_handler, view_stories_handler,
};
use crate::server::static_files::serve_static;

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BaseRecordStore>,
    pub passwords: Arc<dyn BasePasswordHasher>,
    pub renderer: Arc<dyn BaseRenderer>,
    pub csrf: Arc<dyn BaseCsrfTokens>,
    pub sessions: Arc<SessionStore>,
    /// Hosts that skip the HTTPS redirect
    pub local_hosts: Vec<String>,
}

impl AppState {
    /// State with the JSON renderer, random anti-forgery tokens and default local hosts
    pub fn new(
        store: Arc<dyn BaseRecordStore>,
        passwords: Arc<dyn BasePasswordHasher>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            store,
            passwords,
            renderer: Arc::new(JsonRenderer),
            csrf: Arc::new(RandomCsrfTokens),
            sessions,
            local_hosts: default_local_hosts(),
        }
    }

    pub fn with_local_hosts(mut self, local_hosts: Vec<String>) -> Self {
        self.local_hosts = local_hosts;
        self
    }
}

/// The request pipeline, outermost first
pub fn build_middleware(state: &AppState) -> MiddlewareStack {
    MiddlewareStack::new()
        .with(Arc::new(RecoverPanic))
        .with(Arc::new(SecureHeaders))
        .with(Arc::new(LogRequest))
        .with(Arc::new(EnforceHttps::new(state.local_hosts.clone())))
        .with(Arc::new(VerifyCsrf::new(
            state.sessions.clone(),
            state.csrf.clone(),
        )))
        .with(Arc::new(FlashMessages::new(state.sessions.clone())))
        .with(Arc::new(Authenticate::new(
            state.sessions.clone(),
            state.store.clone(),
        )))
}

/// Route table only; protected routes carry the login gate
pub fn build_routes() -> Router {
    let protected = Router::new()
        .route("/stories", get(view_stories_handler))
        .route("/story/submit", get(submit_story_form_handler))
        .route("/story/create", post(create_story_handler))
        .route("/story/edit", get(edit_story_form_handler))
        .route("/story/update", post(update_story_handler))
        .route("/story/delete", get(delete_story_handler))
        .route("/logout", get(logout_handler))
        .route_layer(middleware::from_fn(require_authentication));

    Router::new()
        .route("/", get(home_handler))
        .route("/login", get(login_form_handler))
        .route("/login/submit", post(login_submit_handler))
        .route("/signup", get(signup_form_handler))
        .route("/signup/submit", post(signup_submit_handler))
        .route("/health", get(health_handler))
        .route("/static/*path", get(serve_static))
        .merge(protected)
}

/// Build the Axum application with the standard pipeline
pub fn build_app(state: AppState) -> Router {
    with_pipeline(build_routes(), state)
}

/// Wrap any route table in the standard pipeline and shared state
pub fn with_pipeline(routes: Router, state: AppState) -> Router {
    let stack = build_middleware(&state);
    routes
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn_with_state(
            Arc::new(stack),
            run_middleware_stack,
        ))
        .layer(Extension(state))
}
