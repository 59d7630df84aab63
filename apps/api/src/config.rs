use std::time::Duration;

use anyhow::{bail, Context, Result};
use sqlx::postgres::PgConnectOptions;

use crate::errors::ConfigError;

pub const DEFAULT_SERVICE_NAME: &str = "Smart-Assign API (DB)";
pub const DEFAULT_CANDIDATE_VIEW: &str = "cv_search_profile_mv";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:4200";
const DEFAULT_PG_PORT: u16 = 5432;

/// Application configuration loaded from environment variables.
///
/// Startup fails only on malformed values this process owns (port, view name).
/// Database settings are checked lazily, when the first connection is built.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub service_name: String,
    pub candidate_view: String,
    pub cors_allowed_origins: Vec<String>,
    pub database: DatabaseSettings,
}

/// Raw Postgres connection settings, as found in the environment.
#[derive(Debug, Clone, Default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let candidate_view =
            var("CANDIDATE_VIEW").unwrap_or_else(|| DEFAULT_CANDIDATE_VIEW.to_string());
        if !is_plain_identifier(&candidate_view) {
            bail!("CANDIDATE_VIEW '{candidate_view}' is not a valid SQL identifier");
        }

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let database = DatabaseSettings {
            url: var("DATABASE_URL"),
            host: var("PGHOST"),
            port: var("PGPORT"),
            user: var("PGUSER"),
            password: var("PGPASSWORD"),
            database: var("PGDATABASE"),
            max_connections: var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".to_string())
                .parse::<u32>()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            acquire_timeout: Duration::from_secs(
                var("DB_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse::<u64>()
                    .context("DB_ACQUIRE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
        };

        Ok(Config {
            port: var("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            service_name: var("SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            candidate_view,
            cors_allowed_origins,
            database,
        })
    }
}

impl DatabaseSettings {
    /// Resolves the connection target. `DATABASE_URL` wins over the `PG*` variables.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        if let Some(url) = &self.url {
            return url
                .parse::<PgConnectOptions>()
                .map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()));
        }

        let required = [
            ("PGHOST", &self.host),
            ("PGUSER", &self.user),
            ("PGPASSWORD", &self.password),
            ("PGDATABASE", &self.database),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingDatabaseSettings(missing.join(", ")));
        }

        let port = match &self.port {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PG_PORT,
        };

        let (host, user, password, database) = (
            self.host.as_deref().unwrap_or_default(),
            self.user.as_deref().unwrap_or_default(),
            self.password.as_deref().unwrap_or_default(),
            self.database.as_deref().unwrap_or_default(),
        );

        Ok(PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(user)
            .password(password)
            .database(database))
    }
}

/// Accepts `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`.
fn is_plain_identifier(raw: &str) -> bool {
    let parts: Vec<&str> = raw.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
