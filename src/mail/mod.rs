//! Outbound mail delivery.
//!
//! Flows hand a fully formed [`MailMessage`] to a [`Mailer`] and decide
//! themselves whether a failure matters: registration logs and moves on,
//! forgot-password reports it to the caller.
//!
//! - [`LogMailer`] logs the message instead of sending it (local dev default).
//! - [`MemoryMailer`] keeps every message in memory.
//! - [`HttpMailer`] posts to a transactional mail HTTP API.

mod http;

pub use http::{HttpMailer, HttpMailerConfig};

use async_trait::async_trait;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    #[must_use]
    pub fn verification(to: &str, link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Verify Your Email".to_string(),
            body: format!(
                "Click to verify your account:\n\n{link}\n\nThis link expires in 1 hour."
            ),
        }
    }

    #[must_use]
    pub fn password_reset(to: &str, link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Password Reset Request".to_string(),
            body: format!(
                "Click the link below to reset your password:\n\n{link}\n\nThis link expires in 15 minutes."
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider rejected message (status={status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("{0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message or report why it could not be delivered.
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "mail send stub"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl MemoryMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Most recent message addressed to `to`.
    #[must_use]
    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .map_err(|_| MailError::Unavailable("mail outbox lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_embed_link_and_expiry() {
        let verify = MailMessage::verification("a@b.com", "http://x/verify-email?token=t");
        assert_eq!(verify.subject, "Verify Your Email");
        assert!(verify.body.contains("http://x/verify-email?token=t"));
        assert!(verify.body.contains("expires in 1 hour"));

        let reset = MailMessage::password_reset("a@b.com", "http://x/reset-password?token=t");
        assert_eq!(reset.subject, "Password Reset Request");
        assert!(reset.body.contains("expires in 15 minutes"));
    }

    #[tokio::test]
    async fn memory_mailer_records_messages() -> anyhow::Result<()> {
        let mailer = MemoryMailer::new();
        mailer
            .send(&MailMessage::verification("a@b.com", "link-1"))
            .await?;
        mailer
            .send(&MailMessage::password_reset("a@b.com", "link-2"))
            .await?;

        assert_eq!(mailer.sent().len(), 2);
        let last = mailer.last_to("a@b.com").map(|m| m.subject);
        assert_eq!(last.as_deref(), Some("Password Reset Request"));
        assert!(mailer.last_to("c@d.com").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        assert!(LogMailer
            .send(&MailMessage::verification("a@b.com", "link"))
            .await
            .is_ok());
    }
}
