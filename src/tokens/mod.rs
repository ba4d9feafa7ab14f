//! Ephemeral, single-use tokens for email verification and password reset.
//!
//! Both kinds share one lifecycle: `Issued -> {Consumed | Expired}`. Entries
//! are keyed by the SHA-256 digest of the token, so the raw value only exists
//! in the link sent to the user. Expired entries are dropped lazily when they
//! are looked up; [`spawn_sweeper`] optionally purges them in the background,
//! but `consume` always re-checks `expires_at` on its own.
//!
//! Tokens live in process memory and do not survive a restart.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::accounts::AuthError;

const TOKEN_BYTES: usize = 32;
const DEFAULT_VERIFICATION_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_RESET_TTL_SECONDS: i64 = 15 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Verification,
    Reset,
}

impl TokenKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::Reset => "reset",
        }
    }
}

/// Per-kind lifetimes. Defaults: verification 1 hour, reset 15 minutes.
#[derive(Clone, Copy, Debug)]
pub struct TokenTtls {
    verification: Duration,
    reset: Duration,
}

impl TokenTtls {
    #[must_use]
    pub fn new() -> Self {
        Self {
            verification: Duration::seconds(DEFAULT_VERIFICATION_TTL_SECONDS),
            reset: Duration::seconds(DEFAULT_RESET_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_verification_seconds(mut self, seconds: i64) -> Self {
        self.verification = Duration::seconds(seconds);
        self
    }

    #[must_use]
    pub fn with_reset_seconds(mut self, seconds: i64) -> Self {
        self.reset = Duration::seconds(seconds);
        self
    }

    #[must_use]
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Verification => self.verification,
            TokenKind::Reset => self.reset,
        }
    }
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct TokenEntry {
    subject_email: String,
    expires_at: DateTime<Utc>,
}

type TokenMap = HashMap<Vec<u8>, TokenEntry>;

pub struct TokenRegistry {
    ttls: TokenTtls,
    clock: Arc<dyn Clock>,
    verification: Mutex<TokenMap>,
    reset: Mutex<TokenMap>,
}

impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("ttls", &self.ttls)
            .finish_non_exhaustive()
    }
}

impl TokenRegistry {
    #[must_use]
    pub fn new(ttls: TokenTtls, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttls,
            clock,
            verification: Mutex::new(HashMap::new()),
            reset: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, kind: TokenKind) -> &Mutex<TokenMap> {
        match kind {
            TokenKind::Verification => &self.verification,
            TokenKind::Reset => &self.reset,
        }
    }

    /// Issue a new token for `subject_email` and return the raw value.
    ///
    /// Earlier live tokens for the same subject stay valid.
    ///
    /// # Errors
    /// Returns an error if the OS random source fails.
    pub async fn issue(&self, kind: TokenKind, subject_email: &str) -> anyhow::Result<String> {
        let token = generate_token()?;
        let entry = TokenEntry {
            subject_email: subject_email.to_string(),
            expires_at: self.clock.now() + self.ttls.ttl(kind),
        };

        self.slot(kind).lock().await.insert(hash_token(&token), entry);

        debug!(kind = kind.as_str(), "token issued");

        Ok(token)
    }

    /// Validate and remove a token, returning the email it was issued for.
    ///
    /// The entry is removed under the lock before it is inspected, so of two
    /// racing callers at most one sees it.
    ///
    /// # Errors
    /// `NotFound` if unknown or already used, `Expired` if it lapsed (the
    /// entry is dropped, so a retry yields `NotFound`).
    pub async fn consume(&self, kind: TokenKind, token: &str) -> Result<String, AuthError> {
        let entry = self
            .slot(kind)
            .lock()
            .await
            .remove(&hash_token(token))
            .ok_or(AuthError::NotFound)?;

        if entry.expires_at < self.clock.now() {
            debug!(kind = kind.as_str(), "token expired");
            return Err(AuthError::Expired);
        }

        Ok(entry.subject_email)
    }

    /// Drop every lapsed entry of both kinds and return how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        for kind in [TokenKind::Verification, TokenKind::Reset] {
            let mut entries = self.slot(kind).lock().await;
            let before = entries.len();
            entries.retain(|_, entry| entry.expires_at >= now);
            removed += before - entries.len();
        }
        removed
    }

    /// Number of live-or-lapsed entries held for `kind`.
    pub async fn len(&self, kind: TokenKind) -> usize {
        self.slot(kind).lock().await.len()
    }
}

/// Spawn a background task that periodically purges lapsed tokens.
pub fn spawn_sweeper(
    registry: Arc<TokenRegistry>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = registry.purge_expired().await;
            if removed > 0 {
                info!(removed, "purged expired tokens");
            }
        }
    })
}

/// 32 bytes from the OS RNG, base64url without padding.
fn generate_token() -> anyhow::Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|err| {
        error!("failed to generate token: {err}");
        anyhow::anyhow!("failed to generate token")
    })?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registry() -> (Arc<ManualClock>, TokenRegistry) {
        let clock = Arc::new(ManualClock::default());
        let registry = TokenRegistry::new(TokenTtls::new(), clock.clone());
        (clock, registry)
    }

    #[test]
    fn generated_tokens_are_url_safe_and_256_bits() {
        let token = generate_token().unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        let decoded = Base64UrlUnpadded::decode_vec(&token).unwrap();
        assert_eq!(decoded.len(), TOKEN_BYTES);
        assert_ne!(token, generate_token().unwrap());
    }

    #[test]
    fn default_ttls() {
        let ttls = TokenTtls::default();
        assert_eq!(ttls.ttl(TokenKind::Verification), Duration::hours(1));
        assert_eq!(ttls.ttl(TokenKind::Reset), Duration::minutes(15));
    }

    #[tokio::test]
    async fn consume_is_single_use() {
        let (_clock, registry) = registry();
        let token = registry
            .issue(TokenKind::Verification, "a@b.com")
            .await
            .unwrap();

        assert_eq!(
            registry
                .consume(TokenKind::Verification, &token)
                .await
                .unwrap(),
            "a@b.com"
        );
        assert!(matches!(
            registry.consume(TokenKind::Verification, &token).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn kinds_do_not_share_entries() {
        let (_clock, registry) = registry();
        let token = registry.issue(TokenKind::Reset, "a@b.com").await.unwrap();

        assert!(matches!(
            registry.consume(TokenKind::Verification, &token).await,
            Err(AuthError::NotFound)
        ));
        assert!(registry.consume(TokenKind::Reset, &token).await.is_ok());
    }

    #[tokio::test]
    async fn expired_token_is_purged_on_lookup() {
        let (clock, registry) = registry();
        let token = registry.issue(TokenKind::Reset, "a@b.com").await.unwrap();

        clock.advance(Duration::minutes(16));

        assert!(matches!(
            registry.consume(TokenKind::Reset, &token).await,
            Err(AuthError::Expired)
        ));
        assert!(matches!(
            registry.consume(TokenKind::Reset, &token).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn reset_token_is_accepted_at_its_exact_expiry_instant() {
        let (clock, registry) = registry();
        let token = registry.issue(TokenKind::Reset, "a@b.com").await.unwrap();
        let other = registry.issue(TokenKind::Reset, "a@b.com").await.unwrap();

        clock.advance(Duration::minutes(15));

        assert_eq!(registry.purge_expired().await, 0);
        assert_eq!(
            registry.consume(TokenKind::Reset, &token).await.unwrap(),
            "a@b.com"
        );

        clock.advance(Duration::seconds(1));
        assert!(matches!(
            registry.consume(TokenKind::Reset, &other).await,
            Err(AuthError::Expired)
        ));
    }

    #[tokio::test]
    async fn verification_token_survives_until_its_hour_is_up() {
        let (clock, registry) = registry();
        let token = registry
            .issue(TokenKind::Verification, "a@b.com")
            .await
            .unwrap();

        clock.advance(Duration::minutes(59));
        assert!(registry
            .consume(TokenKind::Verification, &token)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn multiple_live_tokens_per_subject() {
        let (_clock, registry) = registry();
        let first = registry.issue(TokenKind::Reset, "a@b.com").await.unwrap();
        let second = registry.issue(TokenKind::Reset, "a@b.com").await.unwrap();

        assert!(registry.consume(TokenKind::Reset, &second).await.is_ok());
        assert!(registry.consume(TokenKind::Reset, &first).await.is_ok());
    }

    #[tokio::test]
    async fn purge_expired_drops_only_lapsed_entries() {
        let (clock, registry) = registry();
        registry.issue(TokenKind::Reset, "a@b.com").await.unwrap();
        let live = registry
            .issue(TokenKind::Verification, "a@b.com")
            .await
            .unwrap();

        clock.advance(Duration::minutes(20));

        assert_eq!(registry.purge_expired().await, 1);
        assert_eq!(registry.len(TokenKind::Reset).await, 0);
        assert_eq!(registry.len(TokenKind::Verification).await, 1);
        assert!(registry
            .consume(TokenKind::Verification, &live)
            .await
            .is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_consume_has_one_winner() {
        let (_clock, registry) = registry();
        let registry = Arc::new(registry);
        let token = registry
            .issue(TokenKind::Verification, "a@b.com")
            .await
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let token = token.clone();
                tokio::spawn(async move { registry.consume(TokenKind::Verification, &token).await })
            })
            .collect();

        let mut successes = 0;
        let mut not_found = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(AuthError::NotFound) => not_found += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(not_found, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_in_background() {
        let clock = Arc::new(ManualClock::default());
        let registry = Arc::new(TokenRegistry::new(TokenTtls::new(), clock.clone()));
        registry.issue(TokenKind::Reset, "a@b.com").await.unwrap();
        clock.advance(Duration::minutes(16));

        let handle = spawn_sweeper(registry.clone(), std::time::Duration::from_secs(60));
        tokio::time::sleep(std::time::Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(registry.len(TokenKind::Reset).await, 0);
        handle.abort();
    }
}
