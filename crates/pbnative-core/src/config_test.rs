use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_is_rejected() {
    let result = parse_environment("staging");
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PBNATIVE_ENV"),
        "expected InvalidEnvVar(PBNATIVE_ENV), got: {result:?}"
    );
}

#[test]
fn build_app_config_empty_env_uses_defaults() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.bridge_script_url, DEFAULT_BRIDGE_SCRIPT_URL);
    assert_eq!(cfg.bridge_load_timeout_ms, 10_000);
    assert_eq!(cfg.bridge_grace_ms, 100);
    assert_eq!(cfg.gps_check_timeout_ms, 5_000);
    assert_eq!(cfg.position_timeout_ms, Some(15_000));
    assert_eq!(cfg.position_watchdog_grace_ms, 5_000);
    assert_eq!(cfg.position_max_age_ms, 0);
    assert!(cfg.high_accuracy);
    assert_eq!(cfg.push_token_timeout_ms, 10_000);
    assert_eq!(cfg.app_platform, "android");
    assert_eq!(cfg.app_version, "1.0.0");
}

#[test]
fn gps_check_timeout_override() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_GPS_CHECK_TIMEOUT_MS", "2500");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.gps_check_timeout_ms, 2_500);
    assert_eq!(cfg.gps_check_timeout().as_millis(), 2_500);
}

#[test]
fn gps_check_timeout_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_GPS_CHECK_TIMEOUT_MS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PBNATIVE_GPS_CHECK_TIMEOUT_MS"),
        "expected InvalidEnvVar(PBNATIVE_GPS_CHECK_TIMEOUT_MS), got: {result:?}"
    );
}

#[test]
fn bridge_grace_invalid() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_BRIDGE_GRACE_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PBNATIVE_BRIDGE_GRACE_MS"),
        "expected InvalidEnvVar(PBNATIVE_BRIDGE_GRACE_MS), got: {result:?}"
    );
}

#[test]
fn position_timeout_default_keyword_defers_to_platform() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_POSITION_TIMEOUT_MS", "default");
    map.insert("PBNATIVE_POSITION_WATCHDOG_GRACE_MS", "3000");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.position_timeout_ms, None);
    assert!(cfg.position_timeout().is_none());
    assert_eq!(cfg.position_watchdog().as_millis(), 20_000);
}

#[test]
fn platform_default_watchdog_is_not_shorter_than_explicit_default() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_POSITION_TIMEOUT_MS", "default");
    let platform = build_app_config(lookup_from_map(&map)).unwrap();
    let explicit = build_app_config(lookup_from_map(&HashMap::new())).unwrap();
    assert!(platform.position_watchdog() >= explicit.position_watchdog());
}

#[test]
fn platform_default_watchdog_override() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_POSITION_TIMEOUT_MS", "default");
    map.insert("PBNATIVE_POSITION_DEFAULT_WATCHDOG_MS", "45000");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.position_default_watchdog_ms, 45_000);
    assert_eq!(cfg.position_watchdog().as_millis(), 45_000);
}

#[test]
fn position_watchdog_adds_grace_to_timeout() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_POSITION_TIMEOUT_MS", "8000");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.position_watchdog().as_millis(), 13_000);
}

#[test]
fn position_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_POSITION_TIMEOUT_MS", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PBNATIVE_POSITION_TIMEOUT_MS"),
        "expected InvalidEnvVar(PBNATIVE_POSITION_TIMEOUT_MS), got: {result:?}"
    );
}

#[test]
fn high_accuracy_accepts_common_spellings() {
    for (raw, expected) in [("false", false), ("0", false), ("YES", true), ("on", true)] {
        let mut map = HashMap::new();
        map.insert("PBNATIVE_HIGH_ACCURACY", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.high_accuracy, expected, "raw value {raw:?}");
    }
}

#[test]
fn high_accuracy_invalid() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_HIGH_ACCURACY", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PBNATIVE_HIGH_ACCURACY"),
        "expected InvalidEnvVar(PBNATIVE_HIGH_ACCURACY), got: {result:?}"
    );
}

#[test]
fn analytics_defaults_override() {
    let mut map = HashMap::new();
    map.insert("PBNATIVE_ENV", "production");
    map.insert("PBNATIVE_APP_PLATFORM", "ios");
    map.insert("PBNATIVE_APP_VERSION", "2.3.1");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.app_platform, "ios");
    assert_eq!(cfg.app_version, "2.3.1");
}
