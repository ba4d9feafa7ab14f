//! User records and the hash-free projections handed out of the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Opaque user identifier (UUID v7 so ids sort by creation time).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Full stored record. Never leaves the `accounts` module boundary as-is:
/// callers get a [`Profile`] or [`UserSummary`].
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
}

impl UserRecord {
    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile {
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            email_verified: self.email_verified,
        }
    }
}

/// Public view of a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub username: String,
    pub email: String,
}

/// Admin listing row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: UserId::new(),
            username: "alice".to_string(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$v=19$...".to_string(),
            email_verified: true,
        }
    }

    #[test]
    fn profile_serializes_without_hash() -> anyhow::Result<()> {
        let value = serde_json::to_value(record().profile())?;
        assert_eq!(value["username"], "alice");
        assert_eq!(value["email"], "a@b.com");
        assert!(value.get("password_hash").is_none());
        Ok(())
    }

    #[test]
    fn summary_keeps_id_and_flag() -> anyhow::Result<()> {
        let user = record();
        let value = serde_json::to_value(user.summary())?;
        assert_eq!(value["id"], user.id.to_string());
        assert_eq!(value["email_verified"], true);
        assert!(value.get("password_hash").is_none());
        Ok(())
    }

    #[test]
    fn user_id_parses_and_rejects() {
        let id = UserId::new();
        assert_eq!(id.to_string().parse::<UserId>().ok(), Some(id));
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }
}
