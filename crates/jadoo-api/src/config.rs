//! Environment-driven server configuration.
//!
//! Read once at startup; a missing required variable stops the process
//! before any port is bound or connection opened.

use std::time::Duration;

use thiserror::Error;

use jadoo_core::defaults;
use jadoo_db::PoolConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub gemini_api_key: String,
    /// Cloud Vision key; the Gemini key when not set separately.
    pub vision_api_key: String,
    pub gemini_base_url: String,
    pub vision_base_url: String,
    pub gen_model: String,
    pub embed_model: String,
    pub embed_dimension: usize,
    /// GLiNER sidecar; `None` disables entity extraction, so tags hold
    /// vision labels only and names found in the description are not added.
    pub gliner_base_url: Option<String>,
    pub entity_threshold: f32,
    pub service_timeout_secs: u64,
    pub service_max_retries: u32,
    /// Reject images that are not JPEG or PNG before describing them.
    pub restrict_media_types: bool,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub run_migrations: bool,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let gemini_api_key = required("GEMINI_API_KEY")?;

        Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                get("DB_MAX_CONNECTIONS"),
                defaults::DB_MAX_CONNECTIONS,
            )?,
            db_min_connections: parse_or(
                "DB_MIN_CONNECTIONS",
                get("DB_MIN_CONNECTIONS"),
                defaults::DB_MIN_CONNECTIONS,
            )?,
            db_acquire_timeout_secs: parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                get("DB_ACQUIRE_TIMEOUT_SECS"),
                defaults::DB_ACQUIRE_TIMEOUT_SECS,
            )?,
            vision_api_key: get("GOOGLE_VISION_API_KEY").unwrap_or_else(|| gemini_api_key.clone()),
            gemini_api_key,
            gemini_base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| defaults::GEMINI_URL.to_string()),
            vision_base_url: get("VISION_BASE_URL")
                .unwrap_or_else(|| defaults::VISION_URL.to_string()),
            gen_model: get("GEMINI_GEN_MODEL").unwrap_or_else(|| defaults::GEN_MODEL.to_string()),
            embed_model: get("GEMINI_EMBED_MODEL")
                .unwrap_or_else(|| defaults::EMBED_MODEL.to_string()),
            embed_dimension: parse_or(
                "EMBED_DIMENSION",
                get("EMBED_DIMENSION"),
                defaults::EMBED_DIMENSION,
            )?,
            gliner_base_url: get(defaults::ENV_GLINER_BASE_URL),
            entity_threshold: parse_or(
                "ENTITY_THRESHOLD",
                get("ENTITY_THRESHOLD"),
                defaults::ENTITY_THRESHOLD,
            )?,
            service_timeout_secs: parse_or(
                "SERVICE_TIMEOUT_SECS",
                get("SERVICE_TIMEOUT_SECS"),
                defaults::SERVICE_TIMEOUT_SECS,
            )?,
            service_max_retries: parse_or(
                "SERVICE_MAX_RETRIES",
                get("SERVICE_MAX_RETRIES"),
                defaults::SERVICE_MAX_RETRIES,
            )?,
            restrict_media_types: parse_bool_or(
                "RESTRICT_MEDIA_TYPES",
                get("RESTRICT_MEDIA_TYPES"),
                true,
            )?,
            host: get("HOST").unwrap_or_else(|| defaults::SERVER_HOST.to_string()),
            port: parse_or("PORT", get("PORT"), defaults::SERVER_PORT)?,
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec![defaults::ALLOWED_ORIGIN.to_string()]),
            run_migrations: parse_bool_or("RUN_MIGRATIONS", get("RUN_MIGRATIONS"), true)?,
        }
        .validated()
    }

    fn validated(self) -> ConfigResult<Self> {
        if self.embed_dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "EMBED_DIMENSION",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.entity_threshold) {
            return Err(ConfigError::Invalid {
                key: "ENTITY_THRESHOLD",
                value: self.entity_threshold.to_string(),
                reason: "must be between 0 and 1".to_string(),
            });
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.service_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SERVICE_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(self)
    }

    /// Database pool settings.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::default()
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .acquire_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
    }

    /// Timeout for a single outbound call.
    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_secs)
    }

    /// Deadline for a whole pipeline stage, retries included.
    pub fn stage_timeout(&self) -> Duration {
        self.service_timeout() * (self.service_max_retries + 1)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool_or(key: &'static str, raw: Option<String>, default: bool) -> ConfigResult<bool> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            key,
            value: other.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
