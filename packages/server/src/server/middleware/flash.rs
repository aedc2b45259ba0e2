use async_trait::async_trait;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::debug;

use super::context::RequestContext;
use super::stack::{Interceptor, Next};
use crate::server::auth::SessionStore;
use crate::server::error::AppError;

/// Moves queued flash messages from the session into the request context.
///
/// The emptied session is saved straight away, so a message is shown on
/// exactly one request even when the handler never touches the session.
pub struct FlashMessages {
    sessions: Arc<SessionStore>,
}

impl FlashMessages {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl Interceptor for FlashMessages {
    fn name(&self) -> &'static str {
        "flash_messages"
    }

    async fn intercept(
        &self,
        request: Request,
        ctx: &mut RequestContext,
        next: Next<'_>,
    ) -> Response {
        let flashes = ctx
            .load_session(&self.sessions, request.headers())
            .drain_flashes();

        if !flashes.is_empty() {
            if let Err(e) = ctx.persist_session(&self.sessions) {
                return AppError::from(e).into_response();
            }
            debug!(count = flashes.len(), "Delivering flash messages");
            ctx.flashes = flashes;
        }

        next.run(request, ctx).await
    }
}
