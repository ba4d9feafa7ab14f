//! Persistence seam for user records.
//!
//! Implementations must enforce uniqueness of `username` and `email`
//! themselves and report violations as [`RepoError::Conflict`]; the store's
//! existence check before insert is only an early rejection.

use async_trait::async_trait;

use super::error::RepoError;
use super::model::{UserId, UserRecord};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn exists_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, RepoError>;

    async fn insert(&self, user: UserRecord) -> Result<(), RepoError>;

    /// Returns whether a record matched.
    async fn set_email_verified(&self, email: &str) -> Result<bool, RepoError>;

    /// Returns whether a record matched.
    async fn set_password_hash(&self, email: &str, password_hash: &str)
        -> Result<bool, RepoError>;

    async fn list(&self) -> Result<Vec<UserRecord>, RepoError>;

    /// Returns whether a record was deleted.
    async fn delete(&self, id: UserId) -> Result<bool, RepoError>;

    /// Cheap liveness probe used by `/health`.
    async fn ping(&self) -> Result<(), RepoError>;
}
