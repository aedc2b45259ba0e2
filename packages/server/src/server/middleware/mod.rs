// HTTP middleware: the interceptor chain and the per-route login gate
pub mod authenticate;
pub mod context;
pub mod csrf;
pub mod enforce_https;
pub mod flash;
pub mod recover_panic;
pub mod request_log;
pub mod require_auth;
pub mod secure_headers;
pub mod stack;

pub use authenticate::*;
pub use context::*;
pub use csrf::*;
pub use enforce_https::*;
pub use flash::*;
pub use recover_panic::*;
pub use request_log::*;
pub use require_auth::*;
pub use secure_headers::*;
pub use stack::*;
