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
        types::{ErrorResponse, MessageResponse, RegisterRequest},
        AppState,
    },
};

const REGISTERED: &str = "Registered successfully. Please check your email to verify your account.";

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created, verification email queued", body = MessageResponse),
        (status = 400, description = "Invalid username, password or email", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    match state
        .service()
        .register(&request.username, &request.email, &request.password)
        .await
    {
        Ok(_) => (StatusCode::CREATED, Json(MessageResponse::new(REGISTERED))).into_response(),
        Err(AuthError::Validation(message)) => ApiError::bad_request(message).into_response(),
        Err(AuthError::Conflict) => {
            ApiError::new(StatusCode::CONFLICT, "Username or email already exists.").into_response()
        }
        Err(err) => ApiError::internal(&err).into_response(),
    }
}
