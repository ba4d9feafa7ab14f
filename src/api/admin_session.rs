//! Cookie-bound admin sessions.
//!
//! The admin is a single configured operator, unrelated to user records.
//! A successful login mints a random session token; only its SHA-256 digest
//! is kept, next to an expiry, in process memory.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::accounts::AuthError;
use crate::tokens::Clock;

pub const ADMIN_COOKIE_NAME: &str = "authgate_admin";
const SESSION_TOKEN_BYTES: usize = 32;

#[derive(Clone, Debug)]
pub struct AdminCredentials {
    username: String,
    password: SecretString,
}

impl AdminCredentials {
    #[must_use]
    pub fn new(username: String, password: SecretString) -> Self {
        Self { username, password }
    }

    // Compare digests so both sides have the same length.
    fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = digest(username) == digest(&self.username);
        let pass_ok = digest(password) == digest(self.password.expose_secret());
        user_ok & pass_ok
    }
}

pub struct AdminSessions {
    credentials: AdminCredentials,
    ttl: Duration,
    cookie_secure: bool,
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<Vec<u8>, DateTime<Utc>>>,
}

impl std::fmt::Debug for AdminSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSessions")
            .field("ttl", &self.ttl)
            .field("cookie_secure", &self.cookie_secure)
            .finish_non_exhaustive()
    }
}

impl AdminSessions {
    #[must_use]
    pub fn new(credentials: AdminCredentials, ttl_seconds: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            credentials,
            ttl: Duration::seconds(ttl_seconds),
            cookie_secure: false,
            clock,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Check the admin credentials and open a session.
    ///
    /// # Errors
    /// `Unauthorized` when the credentials do not match, `ExternalService`
    /// when the OS random source fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if !self.credentials.matches(username, password) {
            return Err(AuthError::Unauthorized);
        }

        let mut bytes = [0u8; SESSION_TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut bytes).map_err(|err| {
            error!("failed to generate admin session token: {err}");
            AuthError::ExternalService("session generation failed".to_string())
        })?;
        let token = Base64UrlUnpadded::encode_string(&bytes);

        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, expires_at| *expires_at > now);
        sessions.insert(digest(&token), now + self.ttl);

        debug!("admin session opened");

        Ok(token)
    }

    /// Whether the cookie in `headers` names a live session.
    pub async fn is_active(&self, headers: &HeaderMap) -> bool {
        let Some(token) = extract_admin_token(headers) else {
            return false;
        };
        let key = digest(&token);
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&key) {
            Some(expires_at) if *expires_at > self.clock.now() => true,
            Some(_) => {
                sessions.remove(&key);
                false
            }
            None => false,
        }
    }

    /// Drop the session named by the cookie in `headers`, if any.
    pub async fn logout(&self, headers: &HeaderMap) {
        if let Some(token) = extract_admin_token(headers) {
            self.sessions.lock().await.remove(&digest(&token));
        }
    }

    /// Build the `HttpOnly` cookie carrying the session token.
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        let max_age = self.ttl.num_seconds();
        let mut cookie = format!(
            "{ADMIN_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    pub fn clear_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!("{ADMIN_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}

fn extract_admin_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next().map(str::trim);
            let val = parts.next().map(str::trim);
            if let (Some(ADMIN_COOKIE_NAME), Some(val)) = (key, val) {
                if !val.is_empty() {
                    return Some(val.to_string());
                }
            }
        }
    }
    None
}

fn digest(value: &str) -> Vec<u8> {
    Sha256::digest(value.as_bytes()).to_vec()
}
