use serde::Serialize;
use tracing::{debug, warn};

use super::session::Session;
use crate::kernel::{BaseRecordStore, StoreError};

/// Authenticated user as seen by handlers
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Who is making the request.
///
/// A request is `Authenticated` only when the session names a user id that
/// still resolves to a stored user; every other case is `Anonymous`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(AuthUser),
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous => None,
        }
    }
}

/// Resolve the identity carried by a session.
///
/// Lookup failures never fail the request; they degrade to anonymous.
pub async fn resolve_identity(session: &Session, store: &dyn BaseRecordStore) -> Identity {
    let Some(user_id) = session.user_id() else {
        return Identity::Anonymous;
    };

    match store.get_user_by_id(user_id).await {
        Ok(user) => {
            debug!(user_id = user.id, "Authenticated session");
            Identity::Authenticated(AuthUser {
                id: user.id,
                email: user.email,
            })
        }
        Err(StoreError::NotFound) => {
            debug!(user_id, "Session names a user that no longer exists");
            Identity::Anonymous
        }
        Err(e) => {
            warn!(user_id, error = %e, "User lookup failed, treating request as anonymous");
            Identity::Anonymous
        }
    }
}
