use async_trait::async_trait;
use axum::extract::Request;
use axum::http::header::CONNECTION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::error;

use super::context::RequestContext;
use super::stack::{Interceptor, Next};
use crate::server::error::status_response;

/// Contains a panic raised anywhere inside the chain.
///
/// The failure is logged and the client gets a generic 500 with the
/// connection marked for closing; the process keeps serving.
pub struct RecoverPanic;

#[async_trait]
impl Interceptor for RecoverPanic {
    fn name(&self) -> &'static str {
        "recover_panic"
    }

    async fn intercept(
        &self,
        request: Request,
        ctx: &mut RequestContext,
        next: Next<'_>,
    ) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match AssertUnwindSafe(next.run(request, ctx)).catch_unwind().await {
            Ok(response) => response,
            Err(payload) => {
                error!(
                    %method,
                    %path,
                    panic = %panic_message(payload.as_ref()),
                    "Recovered from panic while handling request"
                );
                let mut response = status_response(StatusCode::INTERNAL_SERVER_ERROR);
                response
                    .headers_mut()
                    .insert(CONNECTION, HeaderValue::from_static("close"));
                response
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(format!("boom {}", 2));
        assert_eq!(panic_message(payload.as_ref()), "boom 2");

        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
