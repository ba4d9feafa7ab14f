//! Forgot-password and reset-password endpoints.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    accounts::AuthError,
    api::{
        error::ApiError,
        types::{ErrorResponse, ForgotPasswordRequest, MessageResponse, ResetPasswordRequest},
        AppState,
    },
};

#[utoipa::path(
    post,
    path = "/api/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link mailed", body = MessageResponse),
        (status = 404, description = "No account with that email", body = ErrorResponse),
        (status = 502, description = "Mail delivery failed", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn forgot_password(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    match state.service().forgot_password(&request.email).await {
        Ok(()) => Json(MessageResponse::new(
            "Password reset link sent to your email.",
        ))
        .into_response(),
        Err(AuthError::NotFound) => {
            ApiError::new(StatusCode::NOT_FOUND, "No account with that email").into_response()
        }
        Err(AuthError::ExternalService(reason)) => ApiError::new(
            StatusCode::BAD_GATEWAY,
            format!("Failed to send email: {reason}"),
        )
        .into_response(),
        Err(err) => ApiError::internal(&err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Missing fields, weak password, unknown or expired token", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn reset_password(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    match state
        .service()
        .reset_password(&request.token, &request.password)
        .await
    {
        Ok(()) => Json(MessageResponse::new("Password reset successful.")).into_response(),
        Err(AuthError::Validation(message)) => ApiError::bad_request(message).into_response(),
        Err(AuthError::NotFound) => ApiError::bad_request("Invalid or expired token").into_response(),
        Err(AuthError::Expired) => ApiError::bad_request("Token expired").into_response(),
        Err(err) => ApiError::internal(&err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use anyhow::Result;
    use axum::http::StatusCode;
    use chrono::Duration;
    use serde_json::json;

    async fn login_status(app: &TestApp, password: &str) -> Result<StatusCode> {
        let (status, _) = app
            .json(
                "POST",
                "/api/login",
                &json!({"username": "alice", "password": password}),
            )
            .await?;
        Ok(status)
    }

    #[tokio::test]
    async fn forgot_password_unknown_email_is_404() -> Result<()> {
        let app = TestApp::new()?;
        let (status, body) = app
            .json(
                "POST",
                "/api/forgot-password",
                &json!({"email": "ghost@b.com"}),
            )
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No account with that email");
        assert!(app.mailer.sent().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn reset_flow_rotates_password_once() -> Result<()> {
        let app = TestApp::new()?;
        app.register_verified("alice", "a@b.com", "secret1").await?;

        let (status, body) = app
            .json(
                "POST",
                "/api/forgot-password",
                &json!({"email": " A@B.COM "}),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password reset link sent to your email.");
        let token = app.last_token("a@b.com")?;

        let (status, body) = app
            .json(
                "POST",
                "/api/reset-password",
                &json!({"token": token, "password": "secret2"}),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password reset successful.");

        assert_eq!(login_status(&app, "secret1").await?, StatusCode::UNAUTHORIZED);
        assert_eq!(login_status(&app, "secret2").await?, StatusCode::OK);

        let (status, body) = app
            .json(
                "POST",
                "/api/reset-password",
                &json!({"token": token, "password": "secret3"}),
            )
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid or expired token");
        Ok(())
    }

    #[tokio::test]
    async fn expired_reset_token_keeps_old_password() -> Result<()> {
        let app = TestApp::new()?;
        app.register_verified("alice", "a@b.com", "secret1").await?;
        app.json("POST", "/api/forgot-password", &json!({"email": "a@b.com"}))
            .await?;
        let token = app.last_token("a@b.com")?;

        app.clock.advance(Duration::minutes(16));

        let (status, body) = app
            .json(
                "POST",
                "/api/reset-password",
                &json!({"token": token, "password": "secret2"}),
            )
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Token expired");
        assert_eq!(login_status(&app, "secret1").await?, StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn reset_requires_token_and_strong_password() -> Result<()> {
        let app = TestApp::new()?;
        app.register_verified("alice", "a@b.com", "secret1").await?;
        app.json("POST", "/api/forgot-password", &json!({"email": "a@b.com"}))
            .await?;
        let token = app.last_token("a@b.com")?;

        let (status, body) = app
            .json("POST", "/api/reset-password", &json!({"password": "secret2"}))
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Token and new password required");

        let (status, body) = app
            .json(
                "POST",
                "/api/reset-password",
                &json!({"token": token, "password": "123"}),
            )
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Password must be at least 6 characters.");

        // The weak attempt did not burn the token.
        let (status, _) = app
            .json(
                "POST",
                "/api/reset-password",
                &json!({"token": token, "password": "secret2"}),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
        Ok(())
    }
}
