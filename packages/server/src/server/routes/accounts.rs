//! Login, signup and logout.

use axum::extract::{Extension, Form};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::redirect_with_session;
use crate::domains::auth::actions::{login, signup, LoginOutcome, SignupOutcome, INVALID_CREDENTIALS};
use crate::server::app::AppState;
use crate::server::error::AppError;
use crate::server::middleware::RequestContext;
use crate::server::render::render;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

pub async fn login_form_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    render(&app, &ctx, "login.tmpl", json!({}))
}

/// Unknown email and wrong password re-render the same form with the same message
pub async fn login_submit_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let outcome = login(
        &form.email,
        &form.password,
        app.store.as_ref(),
        app.passwords.as_ref(),
    )
    .await?;

    match outcome {
        LoginOutcome::Authenticated(user) => {
            let mut session = ctx.session_or_load(&app.sessions, &headers);
            session.set_user_id(user.id)?;
            redirect_with_session(&app, &session, "/")
        }
        LoginOutcome::InvalidCredentials => render(
            &app,
            &ctx,
            "login.tmpl",
            json!({ "error": INVALID_CREDENTIALS, "email": form.email }),
        ),
    }
}

pub async fn signup_form_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    render(&app, &ctx, "signup.tmpl", json!({}))
}

/// A new account is signed in right away on a brand-new session
pub async fn signup_submit_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let outcome = signup(
        &form.email,
        &form.password,
        app.store.as_ref(),
        app.passwords.as_ref(),
    )
    .await?;

    match outcome {
        SignupOutcome::Registered(user) => {
            let mut session = app.sessions.renew(ctx.session())?;
            session.set_user_id(user.id)?;
            redirect_with_session(&app, &session, "/")
        }
        SignupOutcome::Rejected(errors) => render(
            &app,
            &ctx,
            "signup.tmpl",
            json!({ "errors": errors, "email": form.email }),
        ),
    }
}

pub async fn logout_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let mut session = ctx.session_or_load(&app.sessions, &headers);
    if let Some(user) = ctx.user() {
        info!("User {} logged out", user.id);
    }
    session.clear_user_id();
    redirect_with_session(&app, &session, "/")
}
