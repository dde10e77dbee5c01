use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Bridge script pinned by the WebView wrapper.
pub const DEFAULT_BRIDGE_SCRIPT_URL: &str = "https://unpkg.com/webtonative@1.0.71/webtonative.min.js";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but its value is invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but its value is invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; absent variables take the defaults of
/// [`AppConfig::default`].
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = AppConfig::default();

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(default),
        }
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Ok(raw) => parse_flag(&raw).ok_or_else(|| invalid(var, format!("expected a boolean, got \"{raw}\""))),
            Err(_) => Ok(default),
        }
    };

    let env = match lookup("PBNATIVE_ENV") {
        Ok(raw) => parse_environment(&raw)?,
        Err(_) => defaults.env,
    };

    let position_timeout_ms = match lookup("PBNATIVE_POSITION_TIMEOUT_MS") {
        Ok(raw) if raw.trim().eq_ignore_ascii_case("default") => None,
        Ok(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid("PBNATIVE_POSITION_TIMEOUT_MS", e.to_string()))?,
        ),
        Err(_) => defaults.position_timeout_ms,
    };

    let gps_check_timeout_ms = parse_u64("PBNATIVE_GPS_CHECK_TIMEOUT_MS", defaults.gps_check_timeout_ms)?;
    if gps_check_timeout_ms == 0 {
        return Err(invalid(
            "PBNATIVE_GPS_CHECK_TIMEOUT_MS",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        log_level: or_default("PBNATIVE_LOG_LEVEL", &defaults.log_level),
        bridge_script_url: or_default("PBNATIVE_BRIDGE_SCRIPT_URL", &defaults.bridge_script_url),
        bridge_load_timeout_ms: parse_u64("PBNATIVE_BRIDGE_LOAD_TIMEOUT_MS", defaults.bridge_load_timeout_ms)?,
        bridge_grace_ms: parse_u64("PBNATIVE_BRIDGE_GRACE_MS", defaults.bridge_grace_ms)?,
        gps_check_timeout_ms,
        position_timeout_ms,
        position_watchdog_grace_ms: parse_u64(
            "PBNATIVE_POSITION_WATCHDOG_GRACE_MS",
            defaults.position_watchdog_grace_ms,
        )?,
        position_default_watchdog_ms: parse_u64(
            "PBNATIVE_POSITION_DEFAULT_WATCHDOG_MS",
            defaults.position_default_watchdog_ms,
        )?,
        position_max_age_ms: parse_u64("PBNATIVE_POSITION_MAX_AGE_MS", defaults.position_max_age_ms)?,
        high_accuracy: parse_bool("PBNATIVE_HIGH_ACCURACY", defaults.high_accuracy)?,
        push_token_timeout_ms: parse_u64("PBNATIVE_PUSH_TOKEN_TIMEOUT_MS", defaults.push_token_timeout_ms)?,
        app_platform: or_default("PBNATIVE_APP_PLATFORM", &defaults.app_platform),
        app_version: or_default("PBNATIVE_APP_VERSION", &defaults.app_version),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PBNATIVE_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
