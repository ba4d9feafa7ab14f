use utoipa::OpenApi;

use super::handlers::{admin, health, login, me, password, register, verification};
use super::types::{
    AdminLoginRequest, DeleteUserRequest, ErrorResponse, ForgotPasswordRequest, LoginRequest,
    LoginResponse, MessageResponse, ProfileResponse, RegisterRequest, ResetPasswordRequest,
    UsersResponse,
};
use crate::accounts::{Profile, UserId, UserSummary};

// Title, version, description and license are taken from Cargo.toml.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        register::register,
        login::login,
        me::me,
        verification::verify_email,
        password::forgot_password,
        password::reset_password,
        admin::login,
        admin::users,
        admin::delete_user,
        admin::logout,
    ),
    components(schemas(
        health::Health,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        ForgotPasswordRequest,
        ResetPasswordRequest,
        AdminLoginRequest,
        DeleteUserRequest,
        MessageResponse,
        ErrorResponse,
        ProfileResponse,
        UsersResponse,
        Profile,
        UserSummary,
        UserId,
    )),
    tags(
        (name = "auth", description = "Registration, login, email verification and password reset"),
        (name = "admin", description = "Admin session and user management"),
        (name = "health", description = "Liveness and build information"),
    )
)]
pub struct ApiDoc;
