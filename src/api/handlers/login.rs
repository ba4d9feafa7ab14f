use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::api::{
    types::{ErrorResponse, LoginRequest, LoginResponse},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 401, description = "Unknown username or wrong password", body = ErrorResponse),
        (status = 403, description = "Email not verified yet", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    match state
        .service()
        .login(&request.username, &request.password)
        .await
    {
        Ok(profile) => (
            StatusCode::OK,
            Json(LoginResponse {
                message: "Login successful".to_string(),
                profile,
            }),
        )
            .into_response(),
        Err(err) => {
            debug!("login rejected: {err}");
            state.config().login_errors().map(&err).into_response()
        }
    }
}
