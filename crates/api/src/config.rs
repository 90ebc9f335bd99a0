use std::str::FromStr;

use studio_media::storage::LocalStorageConfig;

use crate::auth::jwt::JwtConfig;

/// Default upload body limit (2 GiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Read `key` and parse it, falling back to `default` when unset.
pub(crate) fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long background services get to drain after the server stops.
    pub shutdown_timeout_secs: u64,
    /// Public URL of the web client; share links and Mux CORS use it.
    pub app_url: String,
    /// Body limit for upload routes.
    pub max_upload_bytes: usize,
    /// Secret for `mux-signature` verification. Unsigned webhooks are accepted when absent.
    pub mux_webhook_secret: Option<String>,
    /// Local file storage, served back under `/files`.
    pub storage: LocalStorageConfig,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `HOST`                  | `0.0.0.0`                |
    /// | `PORT`                  | `3000`                   |
    /// | `CORS_ORIGINS`          | `http://localhost:3001`  |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `5`                      |
    /// | `NEXT_PUBLIC_APP_URL`   | `http://localhost:3001`  |
    /// | `MAX_UPLOAD_BYTES`      | `2147483648`             |
    /// | `MUX_WEBHOOK_SECRET`    | unset                    |
    ///
    /// Storage and JWT settings are documented on [`LocalStorageConfig`] and [`JwtConfig`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3001".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000)?,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 5)?,
            app_url: std::env::var("NEXT_PUBLIC_APP_URL")
                .unwrap_or_else(|_| "http://localhost:3001".into()),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            mux_webhook_secret: std::env::var("MUX_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            storage: LocalStorageConfig::from_env(),
            jwt: JwtConfig::from_env()?,
        })
    }
}
