//! Traits implemented by the WebView host and the native bridge it exposes.
//!
//! The bridge reports through callbacks; each callback parameter here is a
//! [`Resolver`] so a bridge may call it late, twice, or never without
//! affecting the caller beyond the first delivery.

use std::sync::Arc;

use pbnative_core::Resolver;
use serde_json::{Map, Value};

use crate::error::{BridgeCallError, BridgeError};

/// Result of a script tag's `load` / `error` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLoadEvent {
    Loaded,
    Failed(String),
}

/// The page hosting the bridge.
pub trait BridgeHost: Send + Sync {
    /// The bridge global, if the page currently exposes one.
    fn lookup(&self) -> Option<Arc<dyn NativeBridge>>;

    /// Append a script element for `src`. `done` receives its load/error event.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Injection`] if the element could not be added.
    fn inject_script(&self, src: &str, done: Resolver<ScriptLoadEvent>) -> Result<(), BridgeError>;
}

/// The native bridge global. Each capability is optional.
pub trait NativeBridge: Send + Sync {
    fn gps(&self) -> Option<&dyn GpsStatusApi> {
        None
    }

    fn firebase(&self) -> Option<&dyn FirebaseApi> {
        None
    }
}

pub trait GpsStatusApi: Send + Sync {
    /// Ask the native layer whether device-level location services are on.
    /// The callback normally receives `{"value": bool}`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeCallError`] when the call fails before any callback.
    fn is_device_gps_enabled(&self, callback: Resolver<Value>) -> Result<(), BridgeCallError>;
}

pub trait FirebaseApi: Send + Sync {
    fn analytics(&self) -> Option<&dyn AnalyticsApi>;
    fn messaging(&self) -> Option<&dyn MessagingApi>;
}

#[allow(clippy::missing_errors_doc)]
pub trait AnalyticsApi: Send + Sync {
    fn set_collection(&self, enabled: bool) -> Result<(), BridgeCallError>;
    fn set_default_event_parameters(&self, parameters: &Map<String, Value>) -> Result<(), BridgeCallError>;
    fn log_event(&self, event_name: &str, parameters: &Map<String, Value>) -> Result<(), BridgeCallError>;
    fn set_user_id(&self, user_id: &str) -> Result<(), BridgeCallError>;
    fn set_user_property(&self, key: &str, value: &str) -> Result<(), BridgeCallError>;
    fn log_screen(&self, screen_name: &str, screen_class: &str) -> Result<(), BridgeCallError>;
}

pub trait MessagingApi: Send + Sync {
    /// Request the FCM registration token. The callback receives `Ok(data)`
    /// from the bridge's success callback or `Err(error)` from its fail callback.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeCallError`] when the call fails before any callback.
    fn get_fcm_token(&self, callback: Resolver<Result<Value, Value>>) -> Result<(), BridgeCallError>;
}

/// Classified answer of the GPS status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsStatus {
    Enabled,
    Disabled,
    /// Not an object, no `value` field, or `value` is not a boolean.
    Ambiguous,
}

impl GpsStatus {
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        match payload.get("value") {
            Some(Value::Bool(true)) => GpsStatus::Enabled,
            Some(Value::Bool(false)) => GpsStatus::Disabled,
            _ => GpsStatus::Ambiguous,
        }
    }
}
