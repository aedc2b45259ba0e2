// HTTP routes
pub mod accounts;
pub mod health;
pub mod home;
pub mod stories;

pub use accounts::*;
pub use health::*;
pub use home::*;
pub use stories::*;

use axum::response::{IntoResponse, Redirect, Response};

use crate::server::app::AppState;
use crate::server::auth::Session;
use crate::server::error::AppError;

/// 303 to `to`, carrying the saved session
pub(crate) fn redirect_with_session(
    app: &AppState,
    session: &Session,
    to: &str,
) -> Result<Response, AppError> {
    let mut response = Redirect::to(to).into_response();
    app.sessions.save_to(session, &mut response)?;
    Ok(response)
}
