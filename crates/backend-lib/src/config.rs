// ============================
// backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Sources are layered with figment, later ones winning:
//! built-in defaults, a TOML file, `AUTHGATE_*` environment variables
//! (`__` separates nested keys) and finally the bare `JWT_SECRET` variable.
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::password::HashAlgorithm;

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "authgate.toml";

/// Prefix of the environment variables understood by the loader
pub const ENV_PREFIX: &str = "AUTHGATE_";

/// Longest accepted token lifetime (one year)
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors raised while loading or validating settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("JWT secret is not configured (set JWT_SECRET or auth.jwt_secret)")]
    MissingSecret,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    pub auth: AuthSettings,
    pub timeouts: TimeoutSettings,
    pub events: EventSettings,
    pub gateway: GatewaySettings,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Credential and token settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Shared HMAC secret used to sign tokens
    pub jwt_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    /// Algorithm used for newly hashed passwords
    pub hash_algorithm: HashAlgorithm,
    pub bcrypt_cost: u32,
    pub scrypt_log_n: u8,
    /// Salt length in bytes, before encoding
    pub salt_len: usize,
    /// Mark the refresh cookie `Secure`
    pub cookie_secure: bool,
}

/// Per-call bounds for the external collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub store_ms: u64,
    pub cache_ms: u64,
    pub rpc_ms: u64,
    /// Whole-request bound applied by the HTTP layer
    pub request_secs: u64,
}

/// Event bus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    pub user_registered_queue: String,
    /// Deliveries failing more often than this are dead-lettered
    pub max_redeliveries: u32,
}

/// External prefixes of the proxied services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub user_prefix: String,
    pub room_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            auth: AuthSettings::default(),
            timeouts: TimeoutSettings::default(),
            events: EventSettings::default(),
            gateway: GatewaySettings::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60, // 7 days
            hash_algorithm: HashAlgorithm::Bcrypt,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            scrypt_log_n: 15,
            salt_len: 16,
            cookie_secure: true,
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &if self.jwt_secret.is_empty() { "<unset>" } else { "<redacted>" })
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("hash_algorithm", &self.hash_algorithm)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("scrypt_log_n", &self.scrypt_log_n)
            .field("salt_len", &self.salt_len)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            store_ms: 2_000,
            cache_ms: 500,
            rpc_ms: 5_000,
            request_secs: 30,
        }
    }
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            user_registered_queue: authgate_common::USER_REGISTERED_QUEUE.to_string(),
            max_redeliveries: 5,
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            user_prefix: "/user/api/v1/".to_string(),
            room_prefix: "/room/api/v1/".to_string(),
        }
    }
}

impl AuthSettings {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

impl TimeoutSettings {
    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }

    pub fn cache(&self) -> Duration {
        Duration::from_millis(self.cache_ms)
    }

    pub fn rpc(&self) -> Duration {
        Duration::from_millis(self.rpc_ms)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Settings {
    /// Build the layered figment without extracting it
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "auth.jwt_secret".into()))
    }

    /// Load settings from the default sources and validate them
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(path).extract().map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot safely start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!("unknown log level `{}`", self.log_level)));
        }

        let auth = &self.auth;
        if auth.access_ttl_secs == 0 || auth.refresh_ttl_secs == 0 {
            return Err(ConfigError::Invalid("token TTLs must be positive".to_string()));
        }
        if auth.access_ttl_secs > MAX_TTL_SECS || auth.refresh_ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "token TTLs must not exceed {MAX_TTL_SECS} seconds"
            )));
        }
        if auth.access_ttl_secs >= auth.refresh_ttl_secs {
            return Err(ConfigError::Invalid(
                "access token TTL must be shorter than refresh token TTL".to_string(),
            ));
        }
        if !(4..=31).contains(&auth.bcrypt_cost) {
            return Err(ConfigError::Invalid("bcrypt_cost must be within 4..=31".to_string()));
        }
        if !(1..=20).contains(&auth.scrypt_log_n) {
            return Err(ConfigError::Invalid("scrypt_log_n must be within 1..=20".to_string()));
        }
        if auth.salt_len < 8 {
            return Err(ConfigError::Invalid("salt_len must be at least 8 bytes".to_string()));
        }

        let t = &self.timeouts;
        if t.store_ms == 0 || t.cache_ms == 0 || t.rpc_ms == 0 || t.request_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }

        if self.events.user_registered_queue.trim().is_empty() {
            return Err(ConfigError::Invalid("events.user_registered_queue is empty".to_string()));
        }

        for prefix in [&self.gateway.user_prefix, &self.gateway.room_prefix] {
            if prefix.len() < 2 || !prefix.starts_with('/') || !prefix.ends_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "gateway prefix `{prefix}` must start and end with `/`"
                )));
            }
        }
        if self.gateway.user_prefix == self.gateway.room_prefix {
            return Err(ConfigError::Invalid("gateway prefixes must differ".to_string()));
        }

        Ok(())
    }
}
