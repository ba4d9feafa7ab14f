//! Shared handler state and HTTP-facing configuration.

use super::{admin_session::AdminSessions, error::LoginErrorPolicy};
use crate::service::AuthService;

const DEFAULT_FRONTEND_BASE_URL: &str = "http://127.0.0.1:5500";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    frontend_base_url: String,
    login_errors: LoginErrorPolicy,
}

impl ApiConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            login_errors: LoginErrorPolicy::Distinct,
        }
    }

    #[must_use]
    pub fn with_uniform_login_errors(mut self, uniform: bool) -> Self {
        self.login_errors = LoginErrorPolicy::from_uniform(uniform);
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn login_errors(&self) -> LoginErrorPolicy {
        self.login_errors
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTEND_BASE_URL.to_string())
    }
}

#[derive(Debug)]
pub struct AppState {
    service: AuthService,
    admin: AdminSessions,
    config: ApiConfig,
}

impl AppState {
    #[must_use]
    pub fn new(service: AuthService, admin: AdminSessions, config: ApiConfig) -> Self {
        Self {
            service,
            admin,
            config,
        }
    }

    #[must_use]
    pub fn service(&self) -> &AuthService {
        &self.service
    }

    #[must_use]
    pub fn admin(&self) -> &AdminSessions {
        &self.admin
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}
