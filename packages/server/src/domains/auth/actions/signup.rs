//! Signup action

use anyhow::Result;
use tracing::info;

use crate::common::validation::{char_len, is_email, not_blank, FieldErrors, Validator};
use crate::domains::auth::models::{NewUser, User};
use crate::kernel::{BasePasswordHasher, BaseRecordStore, StoreError};

pub const EMAIL_IN_USE: &str = "Email already in use";
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Result of a signup attempt
#[derive(Debug)]
pub enum SignupOutcome {
    Registered(User),
    Rejected(FieldErrors),
}

pub fn validate_signup(email: &str, password: &str) -> Validator {
    let mut v = Validator::new();
    v.check(not_blank(email), "email", "Email is required");
    v.check(is_email(email), "email", "Invalid email format");
    v.check(not_blank(password), "password", "Password is required");
    v.check(
        char_len(password) >= MIN_PASSWORD_CHARS,
        "password",
        "Password must be at least 8 characters",
    );
    v
}

/// Validate, hash and insert a new account.
///
/// An email already on record is a field error, never a second row.
pub async fn signup(
    email: &str,
    password: &str,
    store: &dyn BaseRecordStore,
    hasher: &dyn BasePasswordHasher,
) -> Result<SignupOutcome> {
    let mut v = validate_signup(email, password);
    if !v.valid() {
        return Ok(SignupOutcome::Rejected(v.into_errors()));
    }

    let password_hash = hasher.hash(password).await?;
    let new_user = NewUser {
        email: email.to_string(),
        password_hash,
    };

    match store.insert_user(new_user).await {
        Ok(user) => {
            info!("Registered user {}", user.id);
            Ok(SignupOutcome::Registered(user))
        }
        Err(StoreError::DuplicateEmail) => {
            v.add_error("email", EMAIL_IN_USE);
            Ok(SignupOutcome::Rejected(v.into_errors()))
        }
        Err(e) => Err(e.into()),
    }
}
