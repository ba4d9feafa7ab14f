use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::{
    accounts::AuthError,
    api::{
        error::ApiError,
        types::{ErrorResponse, ProfileResponse},
        AppState,
    },
};

#[utoipa::path(
    get,
    path = "/api/me/{username}",
    params(("username" = String, Path, description = "Exact username")),
    responses(
        (status = 200, description = "Profile of the user", body = ProfileResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn me(
    Path(username): Path<String>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    match state.service().profile(&username).await {
        Ok(profile) => Json(ProfileResponse { profile }).into_response(),
        Err(AuthError::NotFound) => {
            ApiError::new(StatusCode::NOT_FOUND, "User not found").into_response()
        }
        Err(err) => ApiError::internal(&err).into_response(),
    }
}
