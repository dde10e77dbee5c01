//! Page-lifetime resolution of the native bridge.
//!
//! The bridge global may already be present (host-injected), may appear
//! after the bridge script is injected, or may never appear. Resolution
//! happens at most once per page lifetime; [`BridgeLoader::invalidate`]
//! forgets the result after the page context is torn down.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pbnative_core::{await_resolution, pending, AppConfig, WaitError};
use tokio::sync::Mutex;

use crate::api::{BridgeHost, NativeBridge, ScriptLoadEvent};
use crate::error::BridgeError;

#[derive(Clone)]
pub enum BridgeAvailability {
    Available(Arc<dyn NativeBridge>),
    Unavailable(BridgeError),
}

impl BridgeAvailability {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, BridgeAvailability::Available(_))
    }

    #[must_use]
    pub fn bridge(&self) -> Option<Arc<dyn NativeBridge>> {
        match self {
            BridgeAvailability::Available(bridge) => Some(Arc::clone(bridge)),
            BridgeAvailability::Unavailable(_) => None,
        }
    }
}

impl std::fmt::Debug for BridgeAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeAvailability::Available(_) => f.write_str("Available"),
            BridgeAvailability::Unavailable(err) => f.debug_tuple("Unavailable").field(err).finish(),
        }
    }
}

pub struct BridgeLoader {
    host: Arc<dyn BridgeHost>,
    script_url: String,
    load_timeout: Duration,
    grace_delay: Duration,
    cached: Mutex<Option<BridgeAvailability>>,
    injections: AtomicU32,
}

impl BridgeLoader {
    #[must_use]
    pub fn new(
        host: Arc<dyn BridgeHost>,
        script_url: impl Into<String>,
        load_timeout: Duration,
        grace_delay: Duration,
    ) -> Self {
        Self {
            host,
            script_url: script_url.into(),
            load_timeout,
            grace_delay,
            cached: Mutex::new(None),
            injections: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn from_config(host: Arc<dyn BridgeHost>, config: &AppConfig) -> Self {
        Self::new(
            host,
            config.bridge_script_url.clone(),
            config.bridge_load_timeout(),
            config.bridge_grace_delay(),
        )
    }

    /// Resolve bridge availability, loading the bridge script on first use.
    ///
    /// Concurrent callers wait on the same resolution. A cached
    /// `Unavailable` is upgraded if the host has since exposed the global.
    pub async fn resolve(&self) -> BridgeAvailability {
        let mut cached = self.cached.lock().await;

        if let Some(previous) = cached.clone() {
            if previous.is_available() {
                return previous;
            }
            if let Some(bridge) = self.host.lookup() {
                tracing::debug!("bridge global appeared after a failed load");
                let available = BridgeAvailability::Available(bridge);
                *cached = Some(available.clone());
                return available;
            }
            return previous;
        }

        let availability = self.load().await;
        match &availability {
            BridgeAvailability::Available(_) => tracing::debug!("native bridge available"),
            BridgeAvailability::Unavailable(err) => {
                tracing::info!(error = %err, "native bridge unavailable");
            }
        }
        *cached = Some(availability.clone());
        availability
    }

    async fn load(&self) -> BridgeAvailability {
        if let Some(bridge) = self.host.lookup() {
            return BridgeAvailability::Available(bridge);
        }

        let (done, loaded) = pending::<ScriptLoadEvent>();
        self.injections.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(url = %self.script_url, "injecting bridge script");
        if let Err(err) = self.host.inject_script(&self.script_url, done) {
            return BridgeAvailability::Unavailable(err);
        }

        let err = match await_resolution(loaded, self.load_timeout).await {
            Ok(ScriptLoadEvent::Loaded) => {
                // The global is installed by the script body, shortly after `load`.
                tokio::time::sleep(self.grace_delay).await;
                match self.host.lookup() {
                    Some(bridge) => return BridgeAvailability::Available(bridge),
                    None => BridgeError::GlobalMissing {
                        url: self.script_url.clone(),
                    },
                }
            }
            Ok(ScriptLoadEvent::Failed(reason)) => BridgeError::ScriptLoad {
                url: self.script_url.clone(),
                reason,
            },
            Err(WaitError::TimedOut(timeout)) => BridgeError::LoadTimeout {
                url: self.script_url.clone(),
                timeout_ms: timeout.as_millis(),
            },
            Err(WaitError::Abandoned) => BridgeError::ScriptLoad {
                url: self.script_url.clone(),
                reason: "load event handler dropped".to_string(),
            },
        };
        BridgeAvailability::Unavailable(err)
    }

    /// Forget the cached resolution, e.g. after a full navigation.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    pub async fn is_resolved(&self) -> bool {
        self.cached.lock().await.is_some()
    }

    /// How many times the bridge script has been injected.
    #[must_use]
    pub fn injection_count(&self) -> u32 {
        self.injections.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
