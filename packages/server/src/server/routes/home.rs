use axum::extract::Extension;
use axum::response::Response;
use serde_json::json;

use crate::common::STORIES_PER_PAGE;
use crate::server::app::AppState;
use crate::server::error::AppError;
use crate::server::middleware::RequestContext;
use crate::server::render::render;

/// Landing page with the latest stories
pub async fn home_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let stories = app.store.list_latest(STORIES_PER_PAGE).await?;
    render(&app, &ctx, "home.tmpl", json!({ "stories": stories }))
}
