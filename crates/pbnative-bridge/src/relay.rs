//! Firebase analytics and push-token calls relayed through the native bridge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use pbnative_core::{await_resolution, pending, AppConfig, WaitError};
use serde_json::{Map, Value};

use crate::api::{AnalyticsApi, NativeBridge};
use crate::error::{BridgeCallError, RelayError};
use crate::loader::{BridgeAvailability, BridgeLoader};

pub struct BridgeRelay {
    loader: Arc<BridgeLoader>,
    default_parameters: Map<String, Value>,
    push_token_timeout: Duration,
    initialized: AtomicBool,
    init_gate: tokio::sync::Mutex<()>,
    push_token: Mutex<Option<String>>,
}

impl BridgeRelay {
    #[must_use]
    pub fn new(loader: Arc<BridgeLoader>, config: &AppConfig) -> Self {
        let mut default_parameters = Map::new();
        default_parameters.insert("app_platform".into(), Value::from(config.app_platform.clone()));
        default_parameters.insert("app_version".into(), Value::from(config.app_version.clone()));
        default_parameters.insert("environment".into(), Value::from(config.env.to_string()));

        Self {
            loader,
            default_parameters,
            push_token_timeout: config.push_token_timeout(),
            initialized: AtomicBool::new(false),
            init_gate: tokio::sync::Mutex::new(()),
            push_token: Mutex::new(None),
        }
    }

    async fn bridge(&self) -> Result<Arc<dyn NativeBridge>, RelayError> {
        match self.loader.resolve().await {
            BridgeAvailability::Available(bridge) => Ok(bridge),
            BridgeAvailability::Unavailable(err) => Err(RelayError::BridgeUnavailable(err)),
        }
    }

    /// Enable analytics collection and register the default event parameters.
    ///
    /// Runs once per page lifetime; later calls return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError`] if the bridge or its analytics API is missing,
    /// or a bridge call fails.
    pub async fn initialize(&self) -> Result<(), RelayError> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        // Held across the bridge wait so overlapping callers initialize once.
        let _gate = self.init_gate.lock().await;
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        let bridge = self.bridge().await?;
        let analytics = analytics_of(bridge.as_ref())?;
        analytics.set_collection(true)?;
        analytics.set_default_event_parameters(&self.default_parameters)?;
        self.initialized.store(true, Ordering::Release);
        tracing::info!("analytics relay initialized");
        Ok(())
    }

    async fn with_analytics<F>(&self, call: F) -> Result<(), RelayError>
    where
        F: FnOnce(&dyn AnalyticsApi) -> Result<(), BridgeCallError>,
    {
        self.initialize().await?;
        let bridge = self.bridge().await?;
        let analytics = analytics_of(bridge.as_ref())?;
        call(analytics).map_err(|err| {
            tracing::warn!(error = %err, "analytics call failed");
            RelayError::Call(err)
        })
    }

    /// # Errors
    ///
    /// See [`BridgeRelay::initialize`].
    pub async fn log_event(&self, event_name: &str, parameters: Map<String, Value>) -> Result<(), RelayError> {
        self.with_analytics(|a| a.log_event(event_name, &parameters)).await?;
        tracing::debug!(event = event_name, "analytics event logged");
        Ok(())
    }

    /// # Errors
    ///
    /// See [`BridgeRelay::initialize`].
    pub async fn set_user_id(&self, user_id: &str) -> Result<(), RelayError> {
        self.with_analytics(|a| a.set_user_id(user_id)).await
    }

    /// # Errors
    ///
    /// See [`BridgeRelay::initialize`].
    pub async fn set_user_property(&self, key: &str, value: &str) -> Result<(), RelayError> {
        self.with_analytics(|a| a.set_user_property(key, value)).await
    }

    /// # Errors
    ///
    /// See [`BridgeRelay::initialize`].
    pub async fn log_screen(&self, screen_name: &str, screen_class: &str) -> Result<(), RelayError> {
        self.with_analytics(|a| a.log_screen(screen_name, screen_class)).await?;
        tracing::debug!(screen = screen_name, "screen view logged");
        Ok(())
    }

    /// Record that a page-triggered notification was shown.
    ///
    /// `options_json` is the raw `data-notification-options` attribute; an
    /// empty value means no options. Option keys are merged over
    /// `notification_title`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidNotificationOptions`] if `options_json` is
    /// not a JSON object, otherwise as [`BridgeRelay::log_event`].
    pub async fn notification_shown(&self, title: &str, options_json: &str) -> Result<(), RelayError> {
        let parameters = notification_parameters(title, options_json)?;
        self.log_event("notification_shown", parameters).await
    }

    /// Request the push registration token from the native layer.
    ///
    /// The token is cached and also available through [`BridgeRelay::push_token`].
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::TokenTimeout`] if the bridge never answers,
    /// [`RelayError::TokenRejected`] on the fail callback, and
    /// [`RelayError::MissingToken`] if the answer carries no usable token.
    pub async fn fetch_push_token(&self) -> Result<String, RelayError> {
        let bridge = self.bridge().await?;
        let (callback, reply) = pending::<Result<Value, Value>>();
        {
            let messaging = bridge
                .firebase()
                .and_then(|firebase| firebase.messaging())
                .ok_or(RelayError::Unsupported("Firebase.Messaging"))?;
            messaging.get_fcm_token(callback)?;
        }

        let data = match await_resolution(reply, self.push_token_timeout).await {
            Ok(Ok(data)) => data,
            Ok(Err(error)) => return Err(RelayError::TokenRejected(error_message(&error))),
            Err(WaitError::TimedOut(timeout)) => return Err(RelayError::TokenTimeout(timeout)),
            Err(WaitError::Abandoned) => {
                return Err(RelayError::TokenRejected("callback dropped".to_string()))
            }
        };

        let token = data
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or(RelayError::MissingToken)?
            .to_string();

        tracing::info!("push token received");
        *self.push_token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(token)
    }

    #[must_use]
    pub fn push_token(&self) -> Option<String> {
        self.push_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Forget per-page state after navigation. The bridge loader is reset separately.
    pub fn reset(&self) {
        self.initialized.store(false, Ordering::Release);
        *self.push_token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn analytics_of(bridge: &dyn NativeBridge) -> Result<&dyn AnalyticsApi, RelayError> {
    let firebase = bridge
        .firebase()
        .ok_or(RelayError::Unsupported("Firebase"))?;
    firebase
        .analytics()
        .ok_or(RelayError::Unsupported("Firebase.Analytics"))
}

fn notification_parameters(title: &str, options_json: &str) -> Result<Map<String, Value>, RelayError> {
    let options = if options_json.trim().is_empty() {
        Map::new()
    } else {
        match serde_json::from_str::<Value>(options_json) {
            Ok(Value::Object(options)) => options,
            Ok(other) => {
                return Err(RelayError::InvalidNotificationOptions(format!(
                    "expected an object, got {other}"
                )))
            }
            Err(err) => return Err(RelayError::InvalidNotificationOptions(err.to_string())),
        }
    };

    let mut parameters = Map::new();
    parameters.insert("notification_title".into(), Value::from(title));
    parameters.extend(options);
    Ok(parameters)
}

fn error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| error.to_string(), str::to_string)
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
