use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::IntoParams;

use crate::{
    accounts::AuthError,
    api::{error::ApiError, AppState},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyEmailParams {
    /// Token from the verification link.
    token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/verify-email",
    params(VerifyEmailParams),
    responses(
        (status = 200, description = "Email verified", content_type = "text/html", body = String),
        (status = 400, description = "Unknown, used or expired link", content_type = "text/plain", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify_email(
    Query(params): Query<VerifyEmailParams>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let token = params.token.unwrap_or_default();

    match state.service().verify_email(&token).await {
        Ok(email) => Html(success_page(&email)).into_response(),
        Err(AuthError::Expired) => {
            (StatusCode::BAD_REQUEST, "Verification link expired").into_response()
        }
        Err(AuthError::NotFound) => {
            (StatusCode::BAD_REQUEST, "Invalid or expired verification link").into_response()
        }
        Err(err) => ApiError::internal(&err).into_response(),
    }
}

fn success_page(email: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Email verified</title></head>\
         <body><h1>Email verified</h1><p>{} is now verified. You can log in.</p></body></html>\n",
        escape_html(email)
    )
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}
