//! Server configuration parsed from environment variables.
//!
//! `main` loads `.env` (if present) before calling [`AppConfig::from_env`],
//! so every knob can live in either place.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_JWT_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_secs: u64,
    pub upload_dir: PathBuf,
    /// Prefix for URLs handed back by `/upload`, without trailing slash.
    pub public_base_url: String,
    pub require_email_verification: bool,
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`
    /// - `JWT_SECRET`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `JWT_TTL_SECS`: default seven days
    /// - `UPLOAD_DIR`: default `uploads`
    /// - `PUBLIC_BASE_URL`: default `http://localhost:{PORT}`
    /// - `REQUIRE_EMAIL_VERIFICATION`: default true
    /// - `DB_MAX_CONNECTIONS`: default 5
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let port = env_parse_strict("PORT", DEFAULT_PORT)?;
        let jwt_ttl_secs = env_parse_strict("JWT_TTL_SECS", DEFAULT_JWT_TTL_SECS)?;
        let db_max_connections = env_parse_strict("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR));
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();
        let require_email_verification = env_bool("REQUIRE_EMAIL_VERIFICATION").unwrap_or(true);

        Ok(Self {
            database_url,
            port,
            jwt_secret,
            jwt_ttl_secs,
            upload_dir,
            public_base_url,
            require_email_verification,
            db_max_connections,
        })
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

/// Lenient parse: unset or malformed values fall back to `default`.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_parse_strict<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
