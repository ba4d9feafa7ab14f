//! In-process user repository, used when no database is configured and in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::error::RepoError;
use super::model::{UserId, UserRecord};
use super::repo::UserRepository;

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl MemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn exists_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, RepoError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .any(|u| u.username == username || u.email == email))
    }

    async fn insert(&self, user: UserRecord) -> Result<(), RepoError> {
        // Uniqueness is checked under the write lock so concurrent inserts serialize.
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
            || users.contains_key(&user.id)
        {
            return Err(RepoError::Conflict);
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn set_email_verified(&self, email: &str) -> Result<bool, RepoError> {
        let mut users = self.users.write().await;
        let mut matched = false;
        for user in users.values_mut().filter(|u| u.email == email) {
            user.email_verified = true;
            matched = true;
        }
        Ok(matched)
    }

    async fn set_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, RepoError> {
        let mut users = self.users.write().await;
        let mut matched = false;
        for user in users.values_mut().filter(|u| u.email == email) {
            user.password_hash = password_hash.to_string();
            matched = true;
        }
        Ok(matched)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, RepoError> {
        let users = self.users.read().await;
        let mut all: Vec<UserRecord> = users.values().cloned().collect();
        // v7 ids sort by creation time.
        all.sort_by_key(|u| u.id.as_uuid());
        Ok(all)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepoError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
