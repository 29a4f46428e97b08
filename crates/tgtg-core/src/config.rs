use std::path::PathBuf;

use crate::app_config::{AppConfig, ConfigOverrides, Credentials};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "TooGoodToGo/23.5.0 (9843) (iPhone/iPhone 11; iOS 16.0.2; Scale/2.00/iOS)";

/// Webhook calls may never be closer together than this.
const MIN_NOTIFY_INTERVAL_MS: u64 = 1_000;

/// Load application configuration from environment variables, with
/// command-line `overrides` taking precedence.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required values are missing or values are invalid.
pub fn load_app_config(overrides: &ConfigOverrides) -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env(overrides)
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required values are missing or values are invalid.
pub fn load_app_config_from_env(overrides: &ConfigOverrides) -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key), overrides)
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F, overrides: &ConfigOverrides) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let require = |var: &str| -> Result<String, ConfigError> {
        optional(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    // Overrides win; otherwise the variable is required.
    let coordinate = |var: &str, value: Option<f64>| -> Result<f64, ConfigError> {
        let parsed = match value {
            Some(v) => v,
            None => require(var)?
                .parse::<f64>()
                .map_err(|e| invalid(var, e.to_string()))?,
        };
        if parsed.is_finite() {
            Ok(parsed)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let credentials = match optional("TGTG_EMAIL") {
        Some(email) => Credentials::Email { email },
        None => Credentials::Static {
            user_id: require("USER_ID")?,
            cookie: optional("COOKIE"),
            authorization: optional("AUTH"),
        },
    };

    let longitude = coordinate("LONGITUDE", overrides.longitude)?;
    let latitude = coordinate("LATITUDE", overrides.latitude)?;
    let radius_km = coordinate("RADIUS", overrides.radius_km)?;
    if radius_km <= 0.0 {
        return Err(invalid("RADIUS", "must be greater than zero".to_string()));
    }

    let ifttt_key = require("IFTTT_KEY")?;
    let ifttt_event = or_default("TGTG_IFTTT_EVENT", "toogoodtobot");

    let refresh_minutes = match overrides.refresh_minutes {
        Some(m) => m,
        None => parse_u64("TGTG_REFRESH_MINUTES", "5")?,
    };
    if refresh_minutes == 0 {
        return Err(invalid(
            "TGTG_REFRESH_MINUTES",
            "must be at least one minute".to_string(),
        ));
    }

    let cache_path = overrides
        .cache_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(or_default("TGTG_CACHE_PATH", "./cached.json")));

    let log_level = or_default("TGTG_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("TGTG_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("TGTG_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries = parse_u32("TGTG_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("TGTG_RETRY_BACKOFF_BASE_MS", "1000")?;
    let notify_interval_ms = parse_u64("TGTG_NOTIFY_INTERVAL_MS", "1000")?;
    if notify_interval_ms < MIN_NOTIFY_INTERVAL_MS {
        return Err(invalid(
            "TGTG_NOTIFY_INTERVAL_MS",
            format!("must be at least {MIN_NOTIFY_INTERVAL_MS} ms"),
        ));
    }
    let login_poll_secs = parse_u64("TGTG_LOGIN_POLL_SECS", "5")?;
    let login_max_polls = parse_u32("TGTG_LOGIN_MAX_POLLS", "20")?;
    let api_base_url = or_default("TGTG_API_BASE_URL", "https://apptoogoodtogo.com/api/");
    let webhook_base_url = or_default("TGTG_WEBHOOK_BASE_URL", "https://maker.ifttt.com/");

    Ok(AppConfig {
        credentials,
        longitude,
        latitude,
        radius_km,
        ifttt_key,
        ifttt_event,
        refresh_minutes,
        cache_path,
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        notify_interval_ms,
        login_poll_secs,
        login_max_polls,
        api_base_url,
        webhook_base_url,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
