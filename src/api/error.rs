//! Mapping from [`AuthError`] to HTTP responses.
//!
//! Messages are chosen per endpoint, so handlers build an [`ApiError`]
//! explicitly; the shared cases live here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use super::types::ErrorResponse;
use crate::accounts::AuthError;

pub const INVALID_LOGIN: &str = "Invalid username or password.";
pub const UNVERIFIED_LOGIN: &str = "Please verify your email before logging in.";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    /// Log the underlying failure and hide it from the client.
    pub fn internal(err: &AuthError) -> Self {
        error!("request failed: {err}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// How login failures are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoginErrorPolicy {
    /// 403 for an unverified email, 401 for anything else.
    #[default]
    Distinct,
    /// 401 with the same message for every failure, so responses do not
    /// reveal which usernames exist.
    Uniform,
}

impl LoginErrorPolicy {
    #[must_use]
    pub fn from_uniform(uniform: bool) -> Self {
        if uniform {
            Self::Uniform
        } else {
            Self::Distinct
        }
    }

    pub fn map(self, err: &AuthError) -> ApiError {
        match err {
            AuthError::Unverified if self == Self::Distinct => {
                ApiError::new(StatusCode::FORBIDDEN, UNVERIFIED_LOGIN)
            }
            AuthError::NotFound
            | AuthError::InvalidCredentials
            | AuthError::Unverified
            | AuthError::Validation(_) => ApiError::new(StatusCode::UNAUTHORIZED, INVALID_LOGIN),
            other => ApiError::internal(other),
        }
    }
}
