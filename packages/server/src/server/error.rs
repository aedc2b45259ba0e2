use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;
use tracing::{debug, error};

use crate::common::AuthError;
use crate::kernel::StoreError;
use crate::server::auth::SessionError;

/// Handler-level failures and the responses they map to.
///
/// Client errors answer with the canonical reason phrase; internal errors
/// are logged and answer with a generic 500 so no detail leaks out.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request")]
    BadRequest,

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("authentication required")]
    LoginRequired,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::LoginRequired => StatusCode::SEE_OTHER,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::NotFound,
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::AuthenticationRequired => AppError::LoginRequired,
            AuthError::Forbidden(reason) => {
                debug!(%reason, "Access denied");
                AppError::Forbidden
            }
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

/// Plain-text response carrying the status's reason phrase
pub fn status_response(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, reason).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::LoginRequired => Redirect::to("/login").into_response(),
            AppError::Internal(ref e) => {
                error!(error = ?e, "Request failed");
                status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => status_response(other.status()),
        }
    }
}
