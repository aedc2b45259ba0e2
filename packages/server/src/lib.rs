// Storyboard - API Core
//
// Session-authenticated story board: users sign up, log in and manage short
// stories they own. Requests pass through an ordered interceptor chain
// (server/middleware) before reaching the routes.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
