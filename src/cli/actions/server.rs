use anyhow::{Context, Result};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::{
    accounts::{Argon2Hasher, CredentialStore, MemoryUserRepository, PgUserRepository, UserRepository},
    api::{self, AdminCredentials, AdminSessions, ApiConfig, AppState},
    mail::{HttpMailer, HttpMailerConfig, LogMailer, Mailer},
    service::{AuthService, Links},
    tokens::{spawn_sweeper, SystemClock, TokenRegistry, TokenTtls},
};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub db_max_connections: u32,
    pub public_base_url: String,
    pub frontend_base_url: String,
    pub verification_ttl_seconds: i64,
    pub reset_ttl_seconds: i64,
    pub token_sweep_seconds: u64,
    pub uniform_login_errors: bool,
    pub admin_username: String,
    pub admin_password: SecretString,
    pub admin_session_ttl_seconds: i64,
    pub mail: Option<HttpMailerConfig>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, a URL is invalid, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let repo: Arc<dyn UserRepository> = match &args.dsn {
        Some(dsn) => {
            let pool = PgPoolOptions::new()
                .min_connections(1)
                .max_connections(args.db_max_connections)
                .max_lifetime(Duration::from_secs(60 * 2))
                .test_before_acquire(true)
                .connect(dsn)
                .await
                .context("Failed to connect to database")?;

            let repo = PgUserRepository::new(pool);
            repo.ensure_schema()
                .await
                .context("Failed to apply database schema")?;
            Arc::new(repo)
        }
        None => {
            warn!("No DSN configured, users are kept in memory");
            Arc::new(MemoryUserRepository::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match args.mail {
        Some(config) => {
            info!(endpoint = config.endpoint(), "Sending mail through HTTP API");
            Arc::new(HttpMailer::new(config).context("Failed to build mail client")?)
        }
        None => {
            warn!("No mail API configured, outgoing mail is only logged");
            Arc::new(LogMailer)
        }
    };

    let clock = Arc::new(SystemClock);
    let ttls = TokenTtls::new()
        .with_verification_seconds(args.verification_ttl_seconds)
        .with_reset_seconds(args.reset_ttl_seconds);
    let tokens = Arc::new(TokenRegistry::new(ttls, clock.clone()));

    if args.token_sweep_seconds > 0 {
        spawn_sweeper(
            tokens.clone(),
            Duration::from_secs(args.token_sweep_seconds),
        );
    }

    let links = Links::new(&args.public_base_url, &args.frontend_base_url)?;
    let credentials = CredentialStore::new(repo, Argon2Hasher::new());
    let service = AuthService::new(credentials, tokens, mailer, links);

    let cookie_secure = args.frontend_base_url.starts_with("https://");
    let admin = AdminSessions::new(
        AdminCredentials::new(args.admin_username, args.admin_password),
        args.admin_session_ttl_seconds,
        clock,
    )
    .with_cookie_secure(cookie_secure);

    let config = ApiConfig::new(args.frontend_base_url)
        .with_uniform_login_errors(args.uniform_login_errors);

    let state = Arc::new(AppState::new(service, admin, config));

    api::serve(args.port, state).await
}
