use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

use crate::server::app::AppState;
use crate::server::error::AppError;
use crate::server::middleware::RequestContext;

/// Render a named page.
///
/// Every page receives the session's `csrf_token` and `is_authenticated`; `flashes` is
/// added only when this request delivered any.
pub fn render(
    app: &AppState,
    ctx: &RequestContext,
    template: &str,
    data: Value,
) -> Result<Response, AppError> {
    let mut page = match data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };

    page.insert(
        "csrf_token".to_string(),
        Value::from(ctx.csrf_token().unwrap_or_default()),
    );
    page.insert(
        "is_authenticated".to_string(),
        Value::Bool(ctx.is_authenticated()),
    );
    if !ctx.flashes.is_empty() {
        page.insert("flashes".to_string(), Value::from(ctx.flashes.clone()));
    }

    let body = app.renderer.render(template, &Value::Object(page))?;
    Ok(([(CONTENT_TYPE, app.renderer.content_type())], body).into_response())
}
