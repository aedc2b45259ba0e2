use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use std::sync::Arc;

use super::context::RequestContext;
use super::stack::{Interceptor, Next};
use crate::kernel::BaseRecordStore;
use crate::server::auth::{resolve_identity, SessionStore};

/// Resolves the request's identity from its session.
///
/// Never rejects: a missing, malformed or stale user id, or a failed
/// lookup, leaves the request anonymous.
pub struct Authenticate {
    sessions: Arc<SessionStore>,
    store: Arc<dyn BaseRecordStore>,
}

impl Authenticate {
    pub fn new(sessions: Arc<SessionStore>, store: Arc<dyn BaseRecordStore>) -> Self {
        Self { sessions, store }
    }
}

#[async_trait]
impl Interceptor for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    async fn intercept(
        &self,
        request: Request,
        ctx: &mut RequestContext,
        next: Next<'_>,
    ) -> Response {
        let session = ctx.load_session(&self.sessions, request.headers());
        let identity = resolve_identity(session, self.store.as_ref()).await;
        ctx.identity = identity;

        next.run(request, ctx).await
    }
}
