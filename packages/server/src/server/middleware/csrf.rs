use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::context::RequestContext;
use super::stack::{Interceptor, Next};
use crate::kernel::BaseCsrfTokens;
use crate::server::auth::SessionStore;
use crate::server::error::{status_response, AppError};

/// Form field carrying the token
pub const CSRF_FIELD: &str = "csrf_token";

/// Header accepted in place of the form field
pub const CSRF_HEADER: &str = "x-csrf-token";

const MAX_FORM_BYTES: usize = 64 * 1024;

#[derive(Deserialize)]
struct TokenField {
    #[serde(default)]
    csrf_token: Option<String>,
}

/// Binds an anti-forgery token to every session and checks it on
/// state-changing requests.
///
/// Safe methods pass through with the token recorded in the context for
/// rendering. Anything else must echo the session's token in the
/// `csrf_token` form field or the `X-CSRF-Token` header, or gets a 403.
pub struct VerifyCsrf {
    sessions: Arc<SessionStore>,
    tokens: Arc<dyn BaseCsrfTokens>,
}

impl VerifyCsrf {
    pub fn new(sessions: Arc<SessionStore>, tokens: Arc<dyn BaseCsrfTokens>) -> Self {
        Self { sessions, tokens }
    }

    /// Token bound to the request's session, minting one if needed
    fn session_token(
        &self,
        request: &Request,
        ctx: &mut RequestContext,
    ) -> Result<String, AppError> {
        let session = ctx.load_session(&self.sessions, request.headers());
        if let Some(token) = session.csrf_token() {
            return Ok(token);
        }

        let token = self.tokens.issue();
        session.set_csrf_token(&token)?;
        ctx.persist_session(&self.sessions)?;
        debug!("Bound new anti-forgery token to session");
        Ok(token)
    }
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Token the client sent, with the request rebuilt for the handler
async fn submitted_token(request: Request) -> Result<(Request, Option<String>), Response> {
    if let Some(token) = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        let token = token.to_string();
        return Ok((request, Some(token)));
    }

    if !is_form(&request) {
        return Ok((request, None));
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_FORM_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Unreadable form body: {}", e);
            return Err(status_response(StatusCode::BAD_REQUEST));
        }
    };
    let token = serde_urlencoded::from_bytes::<TokenField>(&bytes)
        .ok()
        .and_then(|field| field.csrf_token);

    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

#[async_trait]
impl Interceptor for VerifyCsrf {
    fn name(&self) -> &'static str {
        "verify_csrf"
    }

    async fn intercept(
        &self,
        request: Request,
        ctx: &mut RequestContext,
        next: Next<'_>,
    ) -> Response {
        let expected = match self.session_token(&request, ctx) {
            Ok(token) => token,
            Err(e) => return e.into_response(),
        };
        ctx.set_csrf_token(expected.clone());

        if request.method().is_safe() {
            return next.run(request, ctx).await;
        }

        let (request, submitted) = match submitted_token(request).await {
            Ok(pair) => pair,
            Err(response) => return response,
        };

        match submitted {
            Some(token) if self.tokens.verify(&expected, &token) => next.run(request, ctx).await,
            _ => {
                warn!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    "Rejected request without a valid anti-forgery token"
                );
                status_response(StatusCode::FORBIDDEN)
            }
        }
    }
}
