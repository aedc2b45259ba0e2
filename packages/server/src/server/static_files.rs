use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

// Stylesheets and images, embedded at compile time
#[derive(RustEmbed)]
#[folder = "static"]
pub struct StaticAssets;

const STATIC_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Serve an embedded asset under `/static/`; unknown paths are 404
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    match StaticAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [
                    (header::CONTENT_TYPE, mime.as_ref().to_string()),
                    (header::CACHE_CONTROL, STATIC_CACHE_CONTROL.to_string()),
                ],
                content.data,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
