//! Login action

use anyhow::Result;
use tracing::{debug, info};

use crate::domains::auth::models::User;
use crate::kernel::{BasePasswordHasher, BaseRecordStore, StoreError};

/// Shown for both unknown emails and wrong passwords
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Result of a login attempt
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(User),
    InvalidCredentials,
}

/// Check an email/password pair.
///
/// Unknown email and password mismatch are the same outcome to the caller,
/// and both run one password verification so they take the same time.
/// Only storage or hashing faults are errors.
pub async fn login(
    email: &str,
    password: &str,
    store: &dyn BaseRecordStore,
    hasher: &dyn BasePasswordHasher,
) -> Result<LoginOutcome> {
    let user = match store.get_user_by_email(email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            debug!("Login attempt for unknown email");
            let dummy = hasher.dummy_hash().await?;
            hasher.verify(password, &dummy).await?;
            return Ok(LoginOutcome::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !hasher.verify(password, &user.password_hash).await? {
        debug!("Password mismatch for user {}", user.id);
        return Ok(LoginOutcome::InvalidCredentials);
    }

    info!("User {} logged in", user.id);
    Ok(LoginOutcome::Authenticated(user))
}
