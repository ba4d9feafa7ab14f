//! Maps parsed arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, mail, ARG_DB_MAX_CONNECTIONS, ARG_DSN, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>(ARG_DSN).cloned();
    let db_max_connections = matches
        .get_one::<u32>(ARG_DB_MAX_CONNECTIONS)
        .copied()
        .unwrap_or(5);

    let auth_opts = auth::Options::parse(matches)?;
    let mail_opts = mail::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        db_max_connections,
        public_base_url: auth_opts.public_base_url,
        frontend_base_url: auth_opts.frontend_base_url,
        verification_ttl_seconds: auth_opts.verification_ttl_seconds,
        reset_ttl_seconds: auth_opts.reset_ttl_seconds,
        token_sweep_seconds: auth_opts.token_sweep_seconds,
        uniform_login_errors: auth_opts.uniform_login_errors,
        admin_username: auth_opts.admin.username,
        admin_password: auth_opts.admin.password,
        admin_session_ttl_seconds: auth_opts.admin.session_ttl_seconds,
        mail: mail_opts.http,
    }))
}
