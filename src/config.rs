//! Runtime settings read from the environment (after `.env` is loaded by the binary).

use crate::error::ConfigError;
use axum::http::HeaderValue;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_PORT: u16 = 8888;
pub const DEFAULT_FRONTEND_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(ConfigError::InvalidValue {
                key: "APP_ENV",
                value: other.to_string(),
            }),
        }
    }
}

/// Either a full URL or the discrete `POSTGRES_*` parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseTarget {
    Url(String),
    Parts {
        user: String,
        password: String,
        host: String,
        port: u16,
        database: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub target: DatabaseTarget,
    pub max_connections: u32,
    pub statement_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let opts = match &self.target {
            DatabaseTarget::Url(url) => PgConnectOptions::from_str(url).map_err(|e| ConfigError::InvalidValue {
                key: "DATABASE_URL",
                value: e.to_string(),
            })?,
            DatabaseTarget::Parts {
                user,
                password,
                host,
                port,
                database,
            } => PgConnectOptions::new()
                .username(user)
                .password(password)
                .host(host)
                .port(*port)
                .database(database),
        };
        Ok(opts.options([("statement_timeout", self.statement_timeout_ms.to_string())]))
    }

    pub async fn connect(&self) -> Result<PgPool, crate::error::AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(self.connect_options()?)
            .await?;
        Ok(pool)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_port: u16,
    pub environment: Environment,
    pub frontend_origin: String,
    pub frontend_port: u16,
    pub body_limit_bytes: usize,
    pub database: DatabaseConfig,
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `DATABASE_URL` wins over the `POSTGRES_*` parts.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup("APP_ENV").filter(|v| !v.trim().is_empty()) {
            Some(v) => v.parse()?,
            None => Environment::Development,
        };
        let target = match lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            Some(url) => DatabaseTarget::Url(url),
            None => {
                let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
                DatabaseTarget::Parts {
                    user: required("POSTGRES_USER")?,
                    password: required("POSTGRES_PASSWORD")?,
                    host: lookup("POSTGRES_HOST").unwrap_or_else(|| "localhost".into()),
                    port: parse_or(&lookup, "DB_PORT", 5432)?,
                    database: required("POSTGRES_DB")?,
                }
            }
        };
        Ok(AppConfig {
            api_port: parse_or(&lookup, "API_PORT", DEFAULT_API_PORT)?,
            environment,
            frontend_origin: lookup("FRONTEND_ORIGIN").unwrap_or_else(|| "localhost".into()),
            frontend_port: parse_or(&lookup, "FRONTEND_PORT", DEFAULT_FRONTEND_PORT)?,
            body_limit_bytes: parse_or(&lookup, "BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?,
            database: DatabaseConfig {
                target,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
                statement_timeout_ms: parse_or(&lookup, "DB_STATEMENT_TIMEOUT_MS", DEFAULT_STATEMENT_TIMEOUT_MS)?,
            },
        })
    }

    /// Origins the CORS layer accepts. Production allows the configured frontend over
    /// http and https; everything else allows the local dev server.
    pub fn allowed_origins(&self) -> Vec<String> {
        match self.environment {
            Environment::Production => vec![
                format!("https://{}:{}", self.frontend_origin, self.frontend_port),
                format!("http://{}:{}", self.frontend_origin, self.frontend_port),
                format!("http://{}", self.frontend_origin),
            ],
            Environment::Development | Environment::Test => {
                vec![format!("http://localhost:{}", self.frontend_port)]
            }
        }
    }

    /// Origins that parse as header values; the rest are dropped with a warning.
    pub fn allowed_origin_headers(&self) -> Vec<HeaderValue> {
        self.allowed_origins()
            .into_iter()
            .filter_map(|o| match HeaderValue::from_str(&o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect()
    }
}
