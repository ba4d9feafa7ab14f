//! Verification, password-reset and login flows.
//!
//! [`AuthService`] glues the [`CredentialStore`] to the [`TokenRegistry`] and
//! the [`Mailer`]. It holds no state of its own.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::accounts::{
    check_password, normalize_email, AuthError, CredentialStore, Profile, UserId, UserSummary,
};
use crate::mail::{MailMessage, Mailer};
use crate::tokens::{TokenKind, TokenRegistry};

/// Builds the absolute links mailed to users.
///
/// Verification links land on this service; reset links land on the
/// frontend page that collects the new password.
#[derive(Clone, Debug)]
pub struct Links {
    verify_base: Url,
    reset_base: Url,
}

impl Links {
    /// # Errors
    /// Returns an error if either base is not an absolute http(s) URL.
    pub fn new(verify_base: &str, reset_base: &str) -> Result<Self> {
        Ok(Self {
            verify_base: parse_base(verify_base)?,
            reset_base: parse_base(reset_base)?,
        })
    }

    #[must_use]
    pub fn verification(&self, token: &str) -> String {
        with_token(&self.verify_base, "verify-email", token)
    }

    #[must_use]
    pub fn password_reset(&self, token: &str) -> String {
        with_token(&self.reset_base, "reset-password", token)
    }
}

fn parse_base(base: &str) -> Result<Url> {
    let url = Url::parse(base).with_context(|| format!("invalid base URL: {base}"))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        anyhow::bail!("base URL must be http(s): {base}");
    }
    Ok(url)
}

fn with_token(base: &Url, page: &str, token: &str) -> String {
    let mut url = base.clone();
    let path = format!("{}/{page}", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut().clear().append_pair("token", token);
    url.to_string()
}

#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    tokens: Arc<TokenRegistry>,
    mailer: Arc<dyn Mailer>,
    links: Links,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("credentials", &self.credentials)
            .field("tokens", &self.tokens)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    #[must_use]
    pub fn new(
        credentials: CredentialStore,
        tokens: Arc<TokenRegistry>,
        mailer: Arc<dyn Mailer>,
        links: Links,
    ) -> Self {
        Self {
            credentials,
            tokens,
            mailer,
            links,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenRegistry> {
        &self.tokens
    }

    /// Create an unverified user and mail a verification link.
    ///
    /// Token issuance and mail delivery are best effort: the user exists as
    /// soon as the insert succeeds, whatever happens afterwards.
    ///
    /// # Errors
    /// `Validation` or `Conflict` from the credential store.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthError> {
        let id = self.credentials.register(username, email, password).await?;
        let email = normalize_email(email);

        let token = match self.tokens.issue(TokenKind::Verification, &email).await {
            Ok(token) => token,
            Err(err) => {
                error!(user_id = %id, "failed to issue verification token: {err:#}");
                return Ok(id);
            }
        };

        let message = MailMessage::verification(&email, &self.links.verification(&token));
        if let Err(err) = self.mailer.send(&message).await {
            warn!(user_id = %id, "verification email not sent: {err}");
        }

        info!(user_id = %id, "user registered");

        Ok(id)
    }

    /// # Errors
    /// See [`CredentialStore::authenticate`].
    pub async fn login(&self, username: &str, password: &str) -> Result<Profile, AuthError> {
        self.credentials.authenticate(username, password).await
    }

    /// # Errors
    /// `NotFound` if no user has this username.
    pub async fn profile(&self, username: &str) -> Result<Profile, AuthError> {
        self.credentials.get_profile(username).await
    }

    /// Consume a verification token and flag its user as verified.
    ///
    /// Returns the verified email.
    ///
    /// # Errors
    /// `NotFound` for unknown or used tokens, `Expired` for lapsed ones.
    #[instrument(skip_all)]
    pub async fn verify_email(&self, token: &str) -> Result<String, AuthError> {
        let email = self
            .tokens
            .consume(TokenKind::Verification, token.trim())
            .await?;
        self.credentials.mark_verified(&email).await?;
        debug!("email verified");
        Ok(email)
    }

    /// Issue a reset token for `email` and mail the link.
    ///
    /// # Errors
    /// `NotFound` if no account uses this email, `ExternalService` when the
    /// mail cannot be delivered.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        if !self.credentials.email_exists(&email).await? {
            return Err(AuthError::NotFound);
        }

        let token = self
            .tokens
            .issue(TokenKind::Reset, &email)
            .await
            .map_err(|err| {
                error!("failed to issue reset token: {err:#}");
                AuthError::ExternalService("token generation failed".to_string())
            })?;

        let message = MailMessage::password_reset(&email, &self.links.password_reset(&token));
        self.mailer.send(&message).await.map_err(|err| {
            warn!("password reset email not sent: {err}");
            AuthError::ExternalService(err.to_string())
        })?;

        Ok(())
    }

    /// Consume a reset token and replace the password of its user.
    ///
    /// The password policy is checked first so a weak password does not burn
    /// the token.
    ///
    /// # Errors
    /// `Validation` for a missing token or a weak password, `NotFound` or
    /// `Expired` for the token.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() || new_password.is_empty() {
            return Err(AuthError::validation("Token and new password required"));
        }
        check_password(new_password)?;

        let email = self.tokens.consume(TokenKind::Reset, token).await?;
        self.credentials
            .replace_password(&email, new_password)
            .await?;

        info!("password reset");

        Ok(())
    }

    /// # Errors
    /// Only storage failures.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AuthError> {
        self.credentials.list_all().await
    }

    /// # Errors
    /// `NotFound` if no user has this id.
    pub async fn delete_user(&self, id: UserId) -> Result<(), AuthError> {
        self.credentials.delete(id).await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// # Errors
    /// Storage unreachable.
    pub async fn ping(&self) -> Result<(), AuthError> {
        self.credentials.ping().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn links_append_page_and_token() {
        let links = Links::new("http://127.0.0.1:5000", "http://127.0.0.1:5500").unwrap();
        assert_eq!(
            links.verification("abc"),
            "http://127.0.0.1:5000/verify-email?token=abc"
        );
        assert_eq!(
            links.password_reset("abc"),
            "http://127.0.0.1:5500/reset-password?token=abc"
        );
    }

    #[test]
    fn links_keep_base_path() {
        let links = Links::new("https://auth.example.com/app/", "https://example.com").unwrap();
        assert_eq!(
            links.verification("t-_1"),
            "https://auth.example.com/app/verify-email?token=t-_1"
        );
    }

    #[test]
    fn links_reject_non_http_base() {
        assert!(Links::new("mailto:someone@example.com", "https://example.com").is_err());
        assert!(Links::new("https://example.com", "not a url").is_err());
    }
}
