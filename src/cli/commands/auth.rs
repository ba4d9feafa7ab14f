//! Token lifetimes, links, login error policy and admin credentials.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;

pub const ARG_PUBLIC_BASE_URL: &str = "public-base-url";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_VERIFICATION_TTL: &str = "verification-token-ttl-seconds";
pub const ARG_RESET_TTL: &str = "reset-token-ttl-seconds";
pub const ARG_TOKEN_SWEEP: &str = "token-sweep-seconds";
pub const ARG_UNIFORM_LOGIN_ERRORS: &str = "uniform-login-errors";
pub const ARG_ADMIN_USERNAME: &str = "admin-username";
pub const ARG_ADMIN_PASSWORD: &str = "admin-password";
pub const ARG_ADMIN_SESSION_TTL: &str = "admin-session-ttl-seconds";

#[derive(Debug)]
pub struct Options {
    pub public_base_url: String,
    pub frontend_base_url: String,
    pub verification_ttl_seconds: i64,
    pub reset_ttl_seconds: i64,
    pub token_sweep_seconds: u64,
    pub uniform_login_errors: bool,
    pub admin: AdminOptions,
}

#[derive(Debug)]
pub struct AdminOptions {
    pub username: String,
    pub password: SecretString,
    pub session_ttl_seconds: i64,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let admin = AdminOptions {
            username: matches
                .get_one::<String>(ARG_ADMIN_USERNAME)
                .cloned()
                .context("missing required argument: --admin-username")?,
            password: matches
                .get_one::<String>(ARG_ADMIN_PASSWORD)
                .cloned()
                .map(SecretString::from)
                .context("missing required argument: --admin-password")?,
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_ADMIN_SESSION_TTL)
                .copied()
                .unwrap_or(3600),
        };

        Ok(Self {
            public_base_url: matches
                .get_one::<String>(ARG_PUBLIC_BASE_URL)
                .cloned()
                .unwrap_or_else(|| "http://127.0.0.1:8080".to_string()),
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .unwrap_or_else(|| "http://127.0.0.1:5500".to_string()),
            verification_ttl_seconds: matches
                .get_one::<i64>(ARG_VERIFICATION_TTL)
                .copied()
                .unwrap_or(3600),
            reset_ttl_seconds: matches
                .get_one::<i64>(ARG_RESET_TTL)
                .copied()
                .unwrap_or(900),
            token_sweep_seconds: matches
                .get_one::<u64>(ARG_TOKEN_SWEEP)
                .copied()
                .unwrap_or(60),
            uniform_login_errors: matches.get_flag(ARG_UNIFORM_LOGIN_ERRORS),
            admin,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_link_args(command);
    let command = with_token_args(command);
    with_admin_args(command)
}

fn with_link_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PUBLIC_BASE_URL)
                .long(ARG_PUBLIC_BASE_URL)
                .help("Public base URL of this service, used for verification links")
                .env("AUTHGATE_PUBLIC_BASE_URL")
                .default_value("http://127.0.0.1:8080"),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL, used for reset links and as the CORS origin")
                .env("AUTHGATE_FRONTEND_BASE_URL")
                .default_value("http://127.0.0.1:5500"),
        )
        .arg(
            Arg::new(ARG_UNIFORM_LOGIN_ERRORS)
                .long(ARG_UNIFORM_LOGIN_ERRORS)
                .help("Answer every failed login with 401, including unverified emails")
                .env("AUTHGATE_UNIFORM_LOGIN_ERRORS")
                .action(ArgAction::SetTrue),
        )
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERIFICATION_TTL)
                .long(ARG_VERIFICATION_TTL)
                .help("Email verification token TTL in seconds")
                .env("AUTHGATE_VERIFICATION_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_RESET_TTL)
                .long(ARG_RESET_TTL)
                .help("Password reset token TTL in seconds")
                .env("AUTHGATE_RESET_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_TOKEN_SWEEP)
                .long(ARG_TOKEN_SWEEP)
                .help("Interval in seconds between expired token sweeps, 0 disables the sweeper")
                .env("AUTHGATE_TOKEN_SWEEP_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn with_admin_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ADMIN_USERNAME)
                .long(ARG_ADMIN_USERNAME)
                .help("Admin username")
                .env("AUTHGATE_ADMIN_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Admin password")
                .env("AUTHGATE_ADMIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_SESSION_TTL)
                .long(ARG_ADMIN_SESSION_TTL)
                .help("Admin session cookie TTL in seconds")
                .env("AUTHGATE_ADMIN_SESSION_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
}
