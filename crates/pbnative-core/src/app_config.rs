use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Script injected when the native bridge global is not present yet.
    pub bridge_script_url: String,
    pub bridge_load_timeout_ms: u64,
    /// Delay between the script `load` event and the second global lookup.
    pub bridge_grace_ms: u64,
    pub gps_check_timeout_ms: u64,
    /// `None` leaves the timeout to the platform.
    pub position_timeout_ms: Option<u64>,
    pub position_watchdog_grace_ms: u64,
    /// Watchdog used when the timeout is left to the platform.
    pub position_default_watchdog_ms: u64,
    pub position_max_age_ms: u64,
    pub high_accuracy: bool,
    pub push_token_timeout_ms: u64,
    pub app_platform: String,
    pub app_version: String,
}

impl AppConfig {
    #[must_use]
    pub fn bridge_load_timeout(&self) -> Duration {
        Duration::from_millis(self.bridge_load_timeout_ms)
    }

    #[must_use]
    pub fn bridge_grace_delay(&self) -> Duration {
        Duration::from_millis(self.bridge_grace_ms)
    }

    #[must_use]
    pub fn gps_check_timeout(&self) -> Duration {
        Duration::from_millis(self.gps_check_timeout_ms)
    }

    #[must_use]
    pub fn position_timeout(&self) -> Option<Duration> {
        self.position_timeout_ms.map(Duration::from_millis)
    }

    /// Upper bound on how long the platform position callback is awaited.
    ///
    /// The platform enforces `position_timeout` itself; the watchdog only
    /// catches platforms that never call back at all. With the platform
    /// default timeout the bound is never shorter than the explicit default.
    #[must_use]
    pub fn position_watchdog(&self) -> Duration {
        let millis = match self.position_timeout_ms {
            Some(timeout) => timeout.saturating_add(self.position_watchdog_grace_ms),
            None => self.position_default_watchdog_ms,
        };
        Duration::from_millis(millis)
    }

    #[must_use]
    pub fn push_token_timeout(&self) -> Duration {
        Duration::from_millis(self.push_token_timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: Environment::Development,
            log_level: "info".to_string(),
            bridge_script_url: crate::config::DEFAULT_BRIDGE_SCRIPT_URL.to_string(),
            bridge_load_timeout_ms: 10_000,
            bridge_grace_ms: 100,
            gps_check_timeout_ms: 5_000,
            position_timeout_ms: Some(15_000),
            position_watchdog_grace_ms: 5_000,
            position_default_watchdog_ms: 20_000,
            position_max_age_ms: 0,
            high_accuracy: true,
            push_token_timeout_ms: 10_000,
            app_platform: "android".to_string(),
            app_version: "1.0.0".to_string(),
        }
    }
}
