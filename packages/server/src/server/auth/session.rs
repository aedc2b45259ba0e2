//! Client-side sessions sealed into a cookie.
//!
//! The whole session (a small key-value bag plus queued flash messages) is
//! serialized to JSON and sealed with AES-256-GCM under a server key, using a
//! fresh random nonce per save and the cookie name as associated data. The
//! cookie is the only copy; there is no server-side session table.
//!
//! A cookie that is missing, tampered with, sealed under another key, or
//! older than the absolute lifetime is treated as a fresh empty session.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use cookie::time::Duration as CookieDuration;
use cookie::{Cookie, SameSite};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "storyboard_session";

/// Session key holding the authenticated user's id
pub const SESSION_USER_KEY: &str = "authenticatedUserID";

/// Session key holding the anti-forgery token
pub const CSRF_TOKEN_KEY: &str = "csrfToken";

/// Absolute session lifetime (7 days)
pub const SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to seal session cookie")]
    Seal,

    #[error("session cookie is not a valid header value")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),
}

/// Per-client session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    values: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    flashes: Vec<String>,
    /// Unix seconds at creation; fixes the absolute expiry
    created_at: i64,
}

impl Session {
    fn fresh() -> Self {
        Self {
            values: BTreeMap::new(),
            flashes: Vec::new(),
            created_at: Utc::now().timestamp(),
        }
    }

    /// Typed read; a value of the wrong shape reads as absent
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn insert<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }

    /// Subject identifier, if a well-formed one is stored
    pub fn user_id(&self) -> Option<i64> {
        self.get(SESSION_USER_KEY)
    }

    pub fn set_user_id(&mut self, user_id: i64) -> Result<(), SessionError> {
        self.insert(SESSION_USER_KEY, user_id)
    }

    pub fn clear_user_id(&mut self) {
        self.remove(SESSION_USER_KEY);
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.get(CSRF_TOKEN_KEY)
    }

    pub fn set_csrf_token(&mut self, token: &str) -> Result<(), SessionError> {
        self.insert(CSRF_TOKEN_KEY, token)
    }

    /// Queue a one-shot message for the next request
    pub fn add_flash(&mut self, message: impl Into<String>) {
        self.flashes.push(message.into());
    }

    pub fn has_flashes(&self) -> bool {
        !self.flashes.is_empty()
    }

    /// Take every queued message, leaving the queue empty
    pub fn drain_flashes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flashes)
    }

    fn is_expired(&self, now: i64, max_age_secs: i64) -> bool {
        now.saturating_sub(self.created_at) >= max_age_secs
    }
}

/// Cookie attributes
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub name: String,
    pub max_age_secs: i64,
    pub secure: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: SESSION_COOKIE.to_string(),
            max_age_secs: SESSION_MAX_AGE_SECS,
            secure: false,
        }
    }
}

/// Reads and writes sealed session cookies.
///
/// Holds only the key material and cookie options, both fixed at startup,
/// so one instance is shared by every request.
pub struct SessionStore {
    cipher: Aes256Gcm,
    options: CookieOptions,
}

impl SessionStore {
    pub fn new(key: &[u8; 32], options: CookieOptions) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
            options,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.options.name
    }

    /// Session carried by the request, or a fresh one
    pub fn get(&self, headers: &HeaderMap) -> Session {
        let now = Utc::now().timestamp();
        for value in cookie_values(headers, &self.options.name) {
            match self.open(&value) {
                Some(session) if !session.is_expired(now, self.options.max_age_secs) => {
                    return session;
                }
                Some(_) => debug!("Discarding expired session cookie"),
                None => debug!("Discarding unreadable session cookie"),
            }
        }
        Session::fresh()
    }

    /// Brand-new empty session, ignoring whatever the request carried
    pub fn new_session(&self) -> Session {
        Session::fresh()
    }

    /// Fresh session for a change of privilege; only the anti-forgery
    /// token is carried over from `previous`
    pub fn renew(&self, previous: Option<&Session>) -> Result<Session, SessionError> {
        let mut session = Session::fresh();
        if let Some(token) = previous.and_then(Session::csrf_token) {
            session.set_csrf_token(&token)?;
        }
        Ok(session)
    }

    /// Session cookie carrying the sealed `session`
    pub fn cookie(&self, session: &Session) -> Result<Cookie<'static>, SessionError> {
        Ok(Cookie::build((self.options.name.clone(), self.seal(session)?))
            .path("/")
            .max_age(CookieDuration::seconds(self.options.max_age_secs))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.options.secure)
            .build())
    }

    /// Full `Set-Cookie` header value for `session`
    pub fn save(&self, session: &Session) -> Result<HeaderValue, SessionError> {
        Ok(HeaderValue::from_str(&self.cookie(session)?.to_string())?)
    }

    /// Save `session` onto an outgoing response
    pub fn save_to(&self, session: &Session, response: &mut Response) -> Result<(), SessionError> {
        let cookie = self.save(session)?;
        response.headers_mut().append(SET_COOKIE, cookie);
        Ok(())
    }

    fn seal(&self, session: &Session) -> Result<String, SessionError> {
        let plaintext = serde_json::to_vec(session)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &plaintext,
                    aad: self.options.name.as_bytes(),
                },
            )
            .map_err(|_| SessionError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    fn open(&self, value: &str) -> Option<Session> {
        let sealed = URL_SAFE_NO_PAD.decode(value).ok()?;
        if sealed.len() <= NONCE_LEN {
            return None;
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: self.options.name.as_bytes(),
                },
            )
            .ok()?;
        serde_json::from_slice(&plaintext).ok()
    }
}

/// Values of every cookie called `name` in the request's Cookie headers
fn cookie_values<'a>(headers: &'a HeaderMap, name: &'a str) -> impl Iterator<Item = String> + 'a {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| Cookie::split_parse(h).filter_map(Result::ok))
        .filter(move |c| c.name() == name)
        .map(|c| c.value().to_string())
}
