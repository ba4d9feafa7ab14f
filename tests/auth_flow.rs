//! End-to-end flows through `AuthService` with in-memory collaborators and a
//! hand-driven clock.

use anyhow::{Context, Result};
use argon2::Params;
use async_trait::async_trait;
use authgate::{
    accounts::{Argon2Hasher, AuthError, CredentialStore, MemoryUserRepository, UserId},
    mail::{MailError, MailMessage, Mailer, MemoryMailer},
    service::{AuthService, Links},
    tokens::{ManualClock, TokenKind, TokenRegistry, TokenTtls},
};
use chrono::Duration;
use std::sync::Arc;

struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: &MailMessage) -> Result<(), MailError> {
        Err(MailError::Unavailable("smtp relay down".to_string()))
    }
}

struct Harness {
    service: AuthService,
    tokens: Arc<TokenRegistry>,
    clock: Arc<ManualClock>,
    mailer: Arc<MemoryMailer>,
}

fn hasher() -> Result<Argon2Hasher> {
    let params = Params::new(8, 1, 1, None).map_err(|err| anyhow::anyhow!("{err}"))?;
    Ok(Argon2Hasher::with_params(params))
}

fn links() -> Result<Links> {
    Links::new("http://127.0.0.1:8080", "http://127.0.0.1:5500")
}

fn harness() -> Result<Harness> {
    let clock = Arc::new(ManualClock::default());
    let tokens = Arc::new(TokenRegistry::new(TokenTtls::new(), clock.clone()));
    let mailer = Arc::new(MemoryMailer::new());
    let credentials = CredentialStore::new(Arc::new(MemoryUserRepository::new()), hasher()?);
    let service = AuthService::new(credentials, tokens.clone(), mailer.clone(), links()?);
    Ok(Harness {
        service,
        tokens,
        clock,
        mailer,
    })
}

fn harness_with_mailer(mailer: Arc<dyn Mailer>) -> Result<AuthService> {
    let clock = Arc::new(ManualClock::default());
    let tokens = Arc::new(TokenRegistry::new(TokenTtls::new(), clock));
    let credentials = CredentialStore::new(Arc::new(MemoryUserRepository::new()), hasher()?);
    Ok(AuthService::new(credentials, tokens, mailer, links()?))
}

fn token_from(mailer: &MemoryMailer, email: &str) -> Result<String> {
    let message = mailer.last_to(email).context("no mail sent")?;
    let (_, rest) = message
        .body
        .split_once("token=")
        .context("mail without token")?;
    rest.split_whitespace()
        .next()
        .map(ToString::to_string)
        .context("empty token")
}

#[tokio::test]
async fn unverified_login_fails_with_unverified_not_invalid_credentials() -> Result<()> {
    let h = harness()?;
    h.service.register("alice", "a@b.com", "secret1").await?;

    for password in ["secret1", "wrong-password"] {
        assert!(matches!(
            h.service.login("alice", password).await,
            Err(AuthError::Unverified)
        ));
    }
    Ok(())
}

#[tokio::test]
async fn verification_unlocks_login() -> Result<()> {
    let h = harness()?;
    h.service.register("alice", "a@b.com", "secret1").await?;
    let token = token_from(&h.mailer, "a@b.com")?;

    let email = h.service.verify_email(&token).await?;
    assert_eq!(email, "a@b.com");

    let profile = h.service.login("alice", "secret1").await?;
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.email, "a@b.com");
    assert!(matches!(
        h.service.login("alice", "secret2").await,
        Err(AuthError::InvalidCredentials)
    ));
    Ok(())
}

#[tokio::test]
async fn verification_link_is_single_use() -> Result<()> {
    let h = harness()?;
    h.service.register("alice", "a@b.com", "secret1").await?;
    let token = token_from(&h.mailer, "a@b.com")?;

    h.service.verify_email(&token).await?;
    assert!(matches!(
        h.service.verify_email(&token).await,
        Err(AuthError::NotFound)
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_consumers_get_exactly_one_success() -> Result<()> {
    let h = harness()?;
    let token = h.tokens.issue(TokenKind::Reset, "a@b.com").await?;

    let first = {
        let tokens = h.tokens.clone();
        let token = token.clone();
        tokio::spawn(async move { tokens.consume(TokenKind::Reset, &token).await })
    };
    let second = {
        let tokens = h.tokens.clone();
        tokio::spawn(async move { tokens.consume(TokenKind::Reset, &token).await })
    };

    let results = [first.await?, second.await?];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::NotFound)))
            .count(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn expired_token_then_not_found() -> Result<()> {
    let h = harness()?;
    h.service.register("alice", "a@b.com", "secret1").await?;
    let token = token_from(&h.mailer, "a@b.com")?;

    h.clock.advance(Duration::minutes(61));

    assert!(matches!(
        h.service.verify_email(&token).await,
        Err(AuthError::Expired)
    ));
    assert!(matches!(
        h.service.verify_email(&token).await,
        Err(AuthError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn register_validation_and_conflict() -> Result<()> {
    let h = harness()?;
    for (username, email, password) in [
        ("ab", "a@b.com", "secret1"),
        ("alice", "not-an-email", "secret1"),
        ("alice", "a@b.com", "123"),
    ] {
        assert!(matches!(
            h.service.register(username, email, password).await,
            Err(AuthError::Validation(_))
        ));
    }

    h.service.register("alice", "a@b.com", "secret1").await?;
    assert!(matches!(
        h.service.register("alice", "a@b.com", "secret1").await,
        Err(AuthError::Conflict)
    ));
    Ok(())
}

#[tokio::test]
async fn reset_replaces_password() -> Result<()> {
    let h = harness()?;
    h.service.register("alice", "a@b.com", "secret1").await?;
    h.service
        .verify_email(&token_from(&h.mailer, "a@b.com")?)
        .await?;

    h.service.forgot_password("a@b.com").await?;
    let reset = h.mailer.last_to("a@b.com").context("reset mail")?;
    assert_eq!(reset.subject, "Password Reset Request");
    assert!(reset
        .body
        .contains("http://127.0.0.1:5500/reset-password?token="));

    h.service
        .reset_password(&token_from(&h.mailer, "a@b.com")?, "secret2")
        .await?;

    assert!(matches!(
        h.service.login("alice", "secret1").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(h.service.login("alice", "secret2").await.is_ok());
    Ok(())
}

#[tokio::test]
async fn reset_token_expires_after_fifteen_minutes() -> Result<()> {
    let h = harness()?;
    h.service.register("alice", "a@b.com", "secret1").await?;
    h.service.forgot_password("a@b.com").await?;
    let token = token_from(&h.mailer, "a@b.com")?;

    h.clock.advance(Duration::minutes(16));

    assert!(matches!(
        h.service.reset_password(&token, "secret2").await,
        Err(AuthError::Expired)
    ));
    Ok(())
}

#[tokio::test]
async fn forgot_password_for_unknown_email_is_not_found() -> Result<()> {
    let h = harness()?;
    assert!(matches!(
        h.service.forgot_password("ghost@b.com").await,
        Err(AuthError::NotFound)
    ));
    assert!(h.mailer.sent().is_empty());
    assert_eq!(h.tokens.len(TokenKind::Reset).await, 0);
    Ok(())
}

#[tokio::test]
async fn mail_failure_is_swallowed_on_register_but_surfaced_on_forgot() -> Result<()> {
    let service = harness_with_mailer(Arc::new(FailingMailer))?;

    service.register("alice", "a@b.com", "secret1").await?;
    assert!(matches!(
        service.login("alice", "secret1").await,
        Err(AuthError::Unverified)
    ));

    assert!(matches!(
        service.forgot_password("a@b.com").await,
        Err(AuthError::ExternalService(_))
    ));
    Ok(())
}

#[tokio::test]
async fn delete_user() -> Result<()> {
    let h = harness()?;
    let id = h.service.register("alice", "a@b.com", "secret1").await?;

    assert!(matches!(
        h.service.delete_user(UserId::new()).await,
        Err(AuthError::NotFound)
    ));

    h.service.delete_user(id).await?;
    assert!(matches!(
        h.service.profile("alice").await,
        Err(AuthError::NotFound)
    ));
    assert!(h.service.list_users().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn verification_after_account_deletion_does_not_resurrect_it() -> Result<()> {
    let h = harness()?;
    let id = h.service.register("alice", "a@b.com", "secret1").await?;
    let token = token_from(&h.mailer, "a@b.com")?;

    h.service.delete_user(id).await?;

    assert_eq!(h.service.verify_email(&token).await?, "a@b.com");
    assert!(matches!(
        h.service.profile("alice").await,
        Err(AuthError::NotFound)
    ));
    assert!(h.service.list_users().await?.is_empty());
    assert!(matches!(
        h.service.verify_email(&token).await,
        Err(AuthError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn reset_after_account_deletion_does_not_resurrect_it() -> Result<()> {
    let h = harness()?;
    let id = h.service.register("alice", "a@b.com", "secret1").await?;
    h.service.forgot_password("a@b.com").await?;
    let token = token_from(&h.mailer, "a@b.com")?;

    h.service.delete_user(id).await?;

    h.service.reset_password(&token, "secret2").await?;
    assert!(matches!(
        h.service.login("alice", "secret2").await,
        Err(AuthError::NotFound)
    ));
    assert!(h.service.list_users().await?.is_empty());
    assert!(matches!(
        h.service.reset_password(&token, "secret3").await,
        Err(AuthError::NotFound)
    ));
    Ok(())
}
