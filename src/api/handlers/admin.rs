//! Admin session and user management endpoints.
//!
//! Every route except login and logout requires a live admin cookie.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::{
    accounts::{AuthError, UserId},
    api::{
        error::ApiError,
        types::{
            AdminLoginRequest, DeleteUserRequest, ErrorResponse, MessageResponse, UsersResponse,
        },
        AppState,
    },
};

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Admin session opened, cookie set", body = MessageResponse),
        (status = 401, description = "Invalid admin credentials", body = ErrorResponse),
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn login(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<AdminLoginRequest>>,
) -> impl IntoResponse {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let token = match state
        .admin()
        .login(&request.username, &request.password)
        .await
    {
        Ok(token) => token,
        Err(AuthError::Unauthorized) => {
            info!("admin login rejected");
            return ApiError::new(StatusCode::UNAUTHORIZED, "Invalid admin credentials")
                .into_response();
        }
        Err(err) => return ApiError::internal(&err).into_response(),
    };

    let mut headers = HeaderMap::new();
    match state.admin().session_cookie(&token) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build admin cookie: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    (
        StatusCode::OK,
        headers,
        Json(MessageResponse::new("Admin login successful")),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All users, without password hashes", body = UsersResponse),
        (status = 401, description = "No admin session", body = ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn users(headers: HeaderMap, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    if !state.admin().is_active(&headers).await {
        return ApiError::unauthorized().into_response();
    }

    match state.service().list_users().await {
        Ok(users) => Json(UsersResponse { users }).into_response(),
        Err(err) => ApiError::internal(&err).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/delete-user",
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Missing or malformed user id", body = ErrorResponse),
        (status = 401, description = "No admin session", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn delete_user(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<DeleteUserRequest>>,
) -> impl IntoResponse {
    if !state.admin().is_active(&headers).await {
        return ApiError::unauthorized().into_response();
    }

    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let Some(raw_id) = request.user_id.filter(|id| !id.trim().is_empty()) else {
        return ApiError::bad_request("User ID is required").into_response();
    };
    let Ok(id) = raw_id.parse::<UserId>() else {
        return ApiError::bad_request("Invalid user ID format").into_response();
    };

    match state.service().delete_user(id).await {
        Ok(()) => Json(MessageResponse::new(format!(
            "User {id} deleted successfully"
        )))
        .into_response(),
        Err(AuthError::NotFound) => {
            ApiError::new(StatusCode::NOT_FOUND, "User not found").into_response()
        }
        Err(err) => ApiError::internal(&err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses(
        (status = 200, description = "Admin session closed", body = MessageResponse)
    ),
    tag = "admin"
)]
pub async fn logout(headers: HeaderMap, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    state.admin().logout(&headers).await;

    // Always clear the cookie, even if the session was already gone.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = state.admin().clear_cookie() {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (
        StatusCode::OK,
        response_headers,
        Json(MessageResponse::new("Logged out")),
    )
        .into_response()
}
