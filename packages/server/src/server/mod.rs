// HTTP server setup (Axum + interceptor chain)
pub mod app;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod static_files;

pub use app::*;
pub use error::AppError;
