use axum::extract::{Extension, Request};
use axum::http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use super::context::RequestContext;
use crate::server::app::AppState;
use crate::server::error::AppError;

pub const LOGIN_REQUIRED_FLASH: &str = "Please login to access this page";

/// Gate for routes that need a signed-in user.
///
/// Anonymous requests are sent to `/login` with a flash message and never
/// reach the handler. Authenticated responses are marked uncacheable.
///
/// Mount with `route_layer(middleware::from_fn(require_authentication))`.
pub async fn require_authentication(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
    request: Request,
    next: Next,
) -> Response {
    if !ctx.is_authenticated() {
        debug!(path = %request.uri().path(), "Anonymous request to protected route");

        let mut session = ctx.session_or_load(&app.sessions, request.headers());
        session.add_flash(LOGIN_REQUIRED_FLASH);

        let mut response = Redirect::to("/login").into_response();
        if let Err(e) = app.sessions.save_to(&session, &mut response) {
            return AppError::from(e).into_response();
        }
        return response;
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, post-check=0, pre-check=0"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    response
}
