//! Credential store: identity records, uniqueness and password lifecycle.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use super::error::AuthError;
use super::model::{Profile, UserId, UserRecord, UserSummary};
use super::password::Argon2Hasher;
use super::repo::UserRepository;
use super::validate::{check_email, check_password, check_username, normalize_email};

// Hashed once, then verified against on logins for unknown usernames.
const MISS_PASSWORD: &str = "authgate-unknown-user";

#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn UserRepository>,
    hasher: Argon2Hasher,
    miss_hash: Arc<OnceCell<String>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    #[must_use]
    pub fn new(repo: Arc<dyn UserRepository>, hasher: Argon2Hasher) -> Self {
        Self {
            repo,
            hasher,
            miss_hash: Arc::new(OnceCell::new()),
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))?
    }

    async fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let stored_hash = stored_hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))?
    }

    async fn verify_against_miss_hash(&self, password: &str) {
        let result = match self
            .miss_hash
            .get_or_try_init(|| self.hash_password(MISS_PASSWORD))
            .await
        {
            Ok(hash) => self.verify_password(password, hash).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            debug!("unknown-user hash check failed: {err}");
        }
    }

    /// Validate and insert a new, unverified user.
    ///
    /// Username and email are trimmed; the email is lowercased.
    ///
    /// # Errors
    /// `Validation` for malformed input, `Conflict` if the username or email is taken.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthError> {
        let username = username.trim();
        let email = normalize_email(email);

        check_username(username)?;
        check_password(password)?;
        check_email(&email)?;

        if self
            .repo
            .exists_by_username_or_email(username, &email)
            .await?
        {
            return Err(AuthError::Conflict);
        }

        let record = UserRecord {
            id: UserId::new(),
            username: username.to_string(),
            email,
            password_hash: self.hash_password(password).await?,
            email_verified: false,
        };
        let id = record.id;

        // A concurrent registration can still win the race; the repository reports it as Conflict.
        self.repo.insert(record).await?;

        debug!(user_id = %id, "user registered");

        Ok(id)
    }

    /// Check a username/password pair.
    ///
    /// # Errors
    /// `NotFound` for unknown usernames, `Unverified` before the email is
    /// confirmed (reported ahead of a password mismatch), `InvalidCredentials`
    /// on mismatch. Every path runs one Argon2 verification.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Profile, AuthError> {
        let Some(user) = self.repo.find_by_username(username.trim()).await? else {
            self.verify_against_miss_hash(password).await;
            return Err(AuthError::NotFound);
        };

        let matched = self.verify_password(password, &user.password_hash).await;

        if !user.email_verified {
            return Err(AuthError::Unverified);
        }

        if matched? {
            Ok(user.profile())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// # Errors
    /// `NotFound` if no user has this username.
    pub async fn get_profile(&self, username: &str) -> Result<Profile, AuthError> {
        self.repo
            .find_by_username(username)
            .await?
            .map(|user| user.profile())
            .ok_or(AuthError::NotFound)
    }

    /// Flag the user owning `email` as verified. Idempotent; a missing user is not an error.
    ///
    /// # Errors
    /// Only storage failures.
    pub async fn mark_verified(&self, email: &str) -> Result<(), AuthError> {
        let matched = self.repo.set_email_verified(&normalize_email(email)).await?;
        if !matched {
            debug!("no user left to verify");
        }
        Ok(())
    }

    /// Re-hash `new_password` with a fresh salt and overwrite the stored hash.
    ///
    /// # Errors
    /// Hashing or storage failures.
    #[instrument(skip(self, new_password))]
    pub async fn replace_password(&self, email: &str, new_password: &str) -> Result<(), AuthError> {
        let hash = self.hash_password(new_password).await?;
        let matched = self
            .repo
            .set_password_hash(&normalize_email(email), &hash)
            .await?;
        if !matched {
            debug!("no user left to update");
        }
        Ok(())
    }

    /// # Errors
    /// Only storage failures.
    pub async fn list_all(&self) -> Result<Vec<UserSummary>, AuthError> {
        Ok(self
            .repo
            .list()
            .await?
            .iter()
            .map(UserRecord::summary)
            .collect())
    }

    /// # Errors
    /// `NotFound` if no user has this id.
    pub async fn delete(&self, id: UserId) -> Result<(), AuthError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(AuthError::NotFound)
        }
    }

    /// Whether a user with this (normalized) email exists.
    ///
    /// # Errors
    /// Only storage failures.
    pub async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.repo.find_by_email(email).await?.is_some())
    }

    /// # Errors
    /// Storage unreachable.
    pub async fn ping(&self) -> Result<(), AuthError> {
        Ok(self.repo.ping().await?)
    }
}
