use anyhow::{Result, bail};

use super::AppConfig;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if !cfg.general.app_url.starts_with("http://") && !cfg.general.app_url.starts_with("https://")
    {
        errors.push("general.app_url must be an http(s) URL".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if !auth.admin_email.contains('@') {
            errors.push("auth.admin_email must be an email address".to_string());
        }

        if auth.admin_password.len() < 8 {
            errors.push("auth.admin_password must be at least 8 characters".to_string());
        }

        if auth.jwt_secret.trim().is_empty() {
            errors.push("auth.jwt_secret must not be empty".to_string());
        }

        if auth.jwt_refresh_secret.trim().is_empty() {
            errors.push("auth.jwt_refresh_secret must not be empty".to_string());
        } else if auth.jwt_refresh_secret == auth.jwt_secret {
            errors.push("auth.jwt_refresh_secret must differ from auth.jwt_secret".to_string());
        }

        if auth.access_ttl_minutes <= 0 {
            errors.push("auth.access_ttl_minutes must be > 0".to_string());
        }

        if auth.refresh_ttl_days <= 0 {
            errors.push("auth.refresh_ttl_days must be > 0".to_string());
        }

        if auth.reset_token_ttl_minutes <= 0 {
            errors.push("auth.reset_token_ttl_minutes must be > 0".to_string());
        }
    }

    if cfg.storage.max_file_size_bytes == 0 {
        errors.push("storage.max_file_size_bytes must be > 0".to_string());
    }

    if cfg.storage.max_files == 0 {
        errors.push("storage.max_files must be > 0".to_string());
    }

    let security = &cfg.security;
    if security.rate_limit_enabled {
        if security.general_rate_limit == 0 || security.general_rate_window_secs == 0 {
            errors.push("security.general_rate_* must be > 0".to_string());
        }

        if security.strict_rate_limit == 0 || security.strict_rate_window_secs == 0 {
            errors.push("security.strict_rate_* must be > 0".to_string());
        }
    }

    if security.production && security.cors_origin_list().is_empty() {
        errors.push("security.cors_origins must be set in production".to_string());
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}
