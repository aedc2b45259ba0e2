//! Auth domain actions - business logic functions
//!
//! Actions are async functions called directly from the HTTP handlers.

mod login;
mod signup;

pub use login::{login, LoginOutcome, INVALID_CREDENTIALS};
pub use signup::{signup, validate_signup, SignupOutcome, EMAIL_IN_USE, MIN_PASSWORD_CHARS};
