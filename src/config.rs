use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub db: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub address: String,
    /// Deadline applied to every request by the timeout layer.
    pub request_timeout: Duration,
    /// How long in-flight requests may drain before connections are force-closed.
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    /// Host name, optionally with `:port`.
    pub host: String,
    pub name: String,
    /// Note the inverted mapping: `true` yields `sslmode=require`.
    pub disable_tls: bool,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to the
    /// local development defaults for anything unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            web: WebConfig {
                address: var("WEB_ADDRESS", "localhost:8000"),
                request_timeout: Duration::from_secs(
                    var("WEB_REQUEST_TIMEOUT_SECS", "5")
                        .parse()
                        .context("WEB_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
                shutdown_timeout: Duration::from_secs(
                    var("WEB_SHUTDOWN_TIMEOUT_SECS", "5")
                        .parse()
                        .context("WEB_SHUTDOWN_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
            },
            db: DatabaseConfig {
                user: var("DB_USER", "postgres"),
                password: var("DB_PASSWORD", "postgres"),
                host: var("DB_HOST", "localhost"),
                name: var("DB_NAME", "postgres"),
                disable_tls: var("DB_DISABLE_TLS", "false")
                    .parse()
                    .context("DB_DISABLE_TLS must be true or false")?,
                max_connections: var("DB_MAX_CONNECTIONS", "20")
                    .parse()
                    .context("DB_MAX_CONNECTIONS must be a valid number")?,
            },
        })
    }
}
