// Accounts: signup and login against the record store
pub mod actions;
pub mod models;

pub use actions::{login, signup, LoginOutcome, SignupOutcome};
pub use models::{NewUser, User};
