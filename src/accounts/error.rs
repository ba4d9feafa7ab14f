use thiserror::Error;

/// Failures raised by the user repository.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A record with the same username or email already exists.
    #[error("duplicate username or email")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Typed failures surfaced by the credential store, the token registry and the
/// flows built on top of them. None of them are retried internally.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("username or email already exists")]
    Conflict,
    #[error("not found")]
    NotFound,
    #[error("token expired")]
    Expired,
    #[error("email not verified")]
    Unverified,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("external service failure: {0}")]
    ExternalService(String),
    #[error(transparent)]
    Storage(RepoError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<RepoError> for AuthError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict => Self::Conflict,
            other => Self::Storage(other),
        }
    }
}
