//! Request-scoped context shared by interceptors and handlers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;
use cookie::Cookie;
use std::convert::Infallible;

use crate::common::AuthError;
use crate::server::auth::{AuthUser, Identity, Session, SessionError, SessionStore};

/// Per-request values, one named field per concern.
///
/// Created empty by the pipeline driver, filled in by interceptors, and
/// handed to the endpoint as an immutable snapshot via request extensions.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub identity: Identity,
    /// Flash messages drained from the session for this request
    pub flashes: Vec<String>,
    csrf_token: Option<String>,
    session: Option<Session>,
    staged_headers: HeaderMap,
    staged_cookies: Vec<(String, HeaderValue)>,
}

impl RequestContext {
    pub fn user(&self) -> Option<&AuthUser> {
        self.identity.user()
    }

    /// Authenticated user, or `AuthenticationRequired`
    pub fn require_user(&self) -> Result<&AuthUser, AuthError> {
        self.identity.user().ok_or(AuthError::AuthenticationRequired)
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_authenticated()
    }

    /// Anti-forgery token bound to this request's session
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn set_csrf_token(&mut self, token: String) {
        self.csrf_token = Some(token);
    }

    /// Session loaded for this request, if an interceptor loaded one
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Load the request's session once; later calls reuse it
    pub fn load_session(&mut self, store: &SessionStore, headers: &HeaderMap) -> &mut Session {
        self.session.get_or_insert_with(|| store.get(headers))
    }

    /// Copy of the current session for a handler to modify and save
    pub fn session_or_load(&self, store: &SessionStore, headers: &HeaderMap) -> Session {
        self.session.clone().unwrap_or_else(|| store.get(headers))
    }

    /// Seal the loaded session and stage its cookie on the final response
    pub fn persist_session(&mut self, store: &SessionStore) -> Result<(), SessionError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let cookie = store.save(session)?;
        self.stage_cookie(store.cookie_name(), cookie);
        Ok(())
    }

    /// Header applied to the final response unless a later stage set it
    pub fn stage_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.staged_headers.insert(name, value);
    }

    /// Cookie applied to the final response unless the handler set one of
    /// the same name
    pub fn stage_cookie(&mut self, name: &str, value: HeaderValue) {
        self.staged_cookies.retain(|(n, _)| n != name);
        self.staged_cookies.push((name.to_string(), value));
    }

    /// Merge staged headers and cookies into the outgoing response
    pub fn apply_staged(&mut self, response: &mut Response) {
        let headers = response.headers_mut();
        for (name, value) in self.staged_headers.drain() {
            if let Some(name) = name {
                if !headers.contains_key(&name) {
                    headers.insert(name, value);
                }
            }
        }
        for (name, value) in self.staged_cookies.drain(..) {
            if !sets_cookie(headers, &name) {
                headers.append(SET_COOKIE, value);
            }
        }
    }
}

/// Whether `headers` already set the cookie called `name`
fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .filter_map(|h| Cookie::parse(h).ok())
        .any(|c| c.name() == name)
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}
