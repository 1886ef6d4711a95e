use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::auth::providers::AuthProviderId;

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: Option<AuthConfig>,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL used to build media links.
    pub app_url: String,
    /// Base URL of the web client; password reset links point here.
    pub frontend_url: String,
    pub app_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
            app_url: defaults::DEFAULT_APP_URL.to_string(),
            frontend_url: defaults::DEFAULT_FRONTEND_URL.to_string(),
            app_name: defaults::DEFAULT_APP_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_idle")]
    pub min_idle: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default = "default_auth_provider")]
    pub provider: AuthProviderId,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
    #[serde(default = "default_reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub max_file_size_bytes: usize,
    pub max_files: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(defaults::DEFAULT_UPLOAD_DIR),
            max_file_size_bytes: defaults::DEFAULT_MAX_FILE_SIZE_BYTES as usize,
            max_files: defaults::DEFAULT_MAX_FILES as usize,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    pub production: bool,
    /// Falls back to `production` when unset.
    pub csrf_enabled: Option<bool>,
    /// Comma separated list; empty allows any origin.
    pub cors_origins: String,
    pub rate_limit_enabled: bool,
    pub general_rate_limit: u32,
    pub general_rate_window_secs: u64,
    pub general_rate_block_secs: u64,
    pub strict_rate_limit: u32,
    pub strict_rate_window_secs: u64,
    pub strict_rate_block_secs: u64,
}

impl SecurityConfig {
    pub fn csrf_enabled(&self) -> bool {
        self.csrf_enabled.unwrap_or(self.production)
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn general_window(&self) -> (u32, Duration, Duration) {
        (
            self.general_rate_limit,
            Duration::from_secs(self.general_rate_window_secs),
            Duration::from_secs(self.general_rate_block_secs),
        )
    }

    pub fn strict_window(&self) -> (u32, Duration, Duration) {
        (
            self.strict_rate_limit,
            Duration::from_secs(self.strict_rate_window_secs),
            Duration::from_secs(self.strict_rate_block_secs),
        )
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            production: defaults::DEFAULT_PRODUCTION,
            csrf_enabled: None,
            cors_origins: String::new(),
            rate_limit_enabled: defaults::DEFAULT_RATE_LIMIT_ENABLED,
            general_rate_limit: defaults::DEFAULT_GENERAL_RATE_LIMIT as u32,
            general_rate_window_secs: defaults::DEFAULT_GENERAL_RATE_WINDOW_SECS as u64,
            general_rate_block_secs: defaults::DEFAULT_GENERAL_RATE_BLOCK_SECS as u64,
            strict_rate_limit: defaults::DEFAULT_STRICT_RATE_LIMIT as u32,
            strict_rate_window_secs: defaults::DEFAULT_STRICT_RATE_WINDOW_SECS as u64,
            strict_rate_block_secs: defaults::DEFAULT_STRICT_RATE_BLOCK_SECS as u64,
        }
    }
}

fn default_db_max_connections() -> u32 {
    defaults::DEFAULT_DB_MAX_CONNECTIONS as u32
}

fn default_db_min_idle() -> u32 {
    defaults::DEFAULT_DB_MIN_IDLE as u32
}

fn default_auth_provider() -> AuthProviderId {
    AuthProviderId::Local
}

fn default_access_ttl_minutes() -> i64 {
    defaults::DEFAULT_ACCESS_TTL_MINUTES
}

fn default_refresh_ttl_days() -> i64 {
    defaults::DEFAULT_REFRESH_TTL_DAYS
}

fn default_reset_token_ttl_minutes() -> i64 {
    defaults::DEFAULT_RESET_TOKEN_TTL_MINUTES
}
