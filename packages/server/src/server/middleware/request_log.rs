use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use std::time::Instant;
use tracing::{info, warn};

use super::context::RequestContext;
use super::stack::{Interceptor, Next};

/// Logs each request on entry and on completion.
pub struct LogRequest;

/// Completion record; logs on drop so an unwinding request is still reported
struct Completion {
    method: Method,
    path: String,
    started: Instant,
    status: Option<StatusCode>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        match self.status {
            Some(status) => info!(
                method = %self.method,
                path = %self.path,
                status = status.as_u16(),
                elapsed_ms,
                "Request completed"
            ),
            None => warn!(
                method = %self.method,
                path = %self.path,
                elapsed_ms,
                "Request aborted before a response was produced"
            ),
        }
    }
}

#[async_trait]
impl Interceptor for LogRequest {
    fn name(&self) -> &'static str {
        "log_request"
    }

    async fn intercept(
        &self,
        request: Request,
        ctx: &mut RequestContext,
        next: Next<'_>,
    ) -> Response {
        let mut completion = Completion {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            started: Instant::now(),
            status: None,
        };
        info!(
            method = %completion.method,
            path = %completion.path,
            version = ?request.version(),
            "Request received"
        );

        let response = next.run(request, ctx).await;
        completion.status = Some(response.status());
        response
    }
}
