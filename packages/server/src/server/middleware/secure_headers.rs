use async_trait::async_trait;
use axum::extract::Request;
use axum::http::header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION};
use axum::http::HeaderValue;
use axum::response::Response;

use super::context::RequestContext;
use super::stack::{Interceptor, Next};

/// Stages the browser hardening headers before delegating, so they land on
/// every response including error and recovered-panic responses.
pub struct SecureHeaders;

#[async_trait]
impl Interceptor for SecureHeaders {
    fn name(&self) -> &'static str {
        "secure_headers"
    }

    async fn intercept(
        &self,
        request: Request,
        ctx: &mut RequestContext,
        next: Next<'_>,
    ) -> Response {
        ctx.stage_header(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        ctx.stage_header(X_FRAME_OPTIONS, HeaderValue::from_static("deny"));
        ctx.stage_header(
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
        ctx.stage_header(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));

        next.run(request, ctx).await
    }
}
