//! # authgate
//!
//! Username/password authentication with email verification, password reset
//! and a separate admin session for user management.
//!
//! ## Credentials
//!
//! [`accounts::CredentialStore`] owns user records. Usernames and emails are
//! unique; emails are stored trimmed and lowercased. Passwords are hashed with
//! Argon2id and a fresh salt per hash, and only hash-free projections
//! ([`accounts::Profile`], [`accounts::UserSummary`]) ever leave the store.
//!
//! ## Tokens
//!
//! [`tokens::TokenRegistry`] issues 256-bit, single-use, time-limited tokens
//! for two purposes: email verification (1 hour) and password reset
//! (15 minutes). Tokens live in process memory only and are lost on restart.
//!
//! ## Flows
//!
//! [`service::AuthService`] wires the two together with a [`mail::Mailer`]:
//! register, verify, login, forgot password and reset password. The HTTP
//! surface lives in [`api`], the binary entry point in [`cli`].

pub mod accounts;
pub mod api;
pub mod cli;
pub mod mail;
pub mod service;
pub mod tokens;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
