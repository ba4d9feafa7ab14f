//! Outbound mail provider settings. Without an API URL mail is only logged.

use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

use crate::mail::HttpMailerConfig;

pub const ARG_MAIL_API_URL: &str = "mail-api-url";
pub const ARG_MAIL_API_KEY: &str = "mail-api-key";
pub const ARG_MAIL_FROM: &str = "mail-from";
pub const ARG_MAIL_TIMEOUT: &str = "mail-timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub http: Option<HttpMailerConfig>,
}

impl Options {
    /// # Errors
    /// Returns an error if an API URL is given without a key or sender.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let Some(url) = matches.get_one::<String>(ARG_MAIL_API_URL).cloned() else {
            return Ok(Self { http: None });
        };

        let key = matches
            .get_one::<String>(ARG_MAIL_API_KEY)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --{ARG_MAIL_API_KEY}"))?;
        let from = matches
            .get_one::<String>(ARG_MAIL_FROM)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --{ARG_MAIL_FROM}"))?;
        let timeout = matches
            .get_one::<u64>(ARG_MAIL_TIMEOUT)
            .copied()
            .unwrap_or(10);

        Ok(Self {
            http: Some(
                HttpMailerConfig::new(url, SecretString::from(key), from)
                    .with_timeout_seconds(timeout),
            ),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAIL_API_URL)
                .long(ARG_MAIL_API_URL)
                .help("Transactional mail API endpoint; mail is only logged when unset")
                .env("AUTHGATE_MAIL_API_URL"),
        )
        .arg(
            Arg::new(ARG_MAIL_API_KEY)
                .long(ARG_MAIL_API_KEY)
                .help("Mail API key")
                .env("AUTHGATE_MAIL_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_MAIL_FROM)
                .long(ARG_MAIL_FROM)
                .help("Sender address for outgoing mail")
                .env("AUTHGATE_MAIL_FROM"),
        )
        .arg(
            Arg::new(ARG_MAIL_TIMEOUT)
                .long(ARG_MAIL_TIMEOUT)
                .help("Mail API request timeout in seconds")
                .env("AUTHGATE_MAIL_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64)),
        )
}
