//! Scripted host and bridge with configurable behaviour.
//!
//! Used by the `pbnative` harness to replay field conditions (bridge never
//! loads, GPS query hangs, malformed payloads) and by tests. Every callback
//! is delivered from a spawned task, so these require a tokio runtime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use pbnative_core::Resolver;
use serde_json::{json, Map, Value};

use crate::api::{
    AnalyticsApi, BridgeHost, FirebaseApi, GpsStatusApi, MessagingApi, NativeBridge,
    ScriptLoadEvent,
};
use crate::error::{BridgeCallError, BridgeError};

/// What happens when the host is asked to inject the bridge script.
#[derive(Clone)]
pub enum ScriptBehavior {
    /// `load` fires after `after` and the bridge global is installed.
    InstallsBridge {
        bridge: Arc<dyn NativeBridge>,
        after: Duration,
    },
    /// `load` fires but the script never installs the global.
    LoadsWithoutGlobal { after: Duration },
    /// The script's `error` event fires.
    Fails { after: Duration, reason: String },
    /// Neither `load` nor `error` ever fires.
    NeverSettles,
    /// The script element cannot be added at all.
    RejectsInjection(String),
}

pub struct ScriptedHost {
    present: Arc<Mutex<Option<Arc<dyn NativeBridge>>>>,
    behavior: ScriptBehavior,
    injected: Mutex<Vec<String>>,
    stalled: Mutex<Vec<Resolver<ScriptLoadEvent>>>,
}

impl ScriptedHost {
    /// A page where the bridge global is already present.
    #[must_use]
    pub fn with_bridge(bridge: Arc<dyn NativeBridge>) -> Self {
        let host = Self::new(ScriptBehavior::InstallsBridge {
            bridge: Arc::clone(&bridge),
            after: Duration::ZERO,
        });
        *lock(&host.present) = Some(bridge);
        host
    }

    /// A page without the bridge global; injection behaves per `behavior`.
    #[must_use]
    pub fn new(behavior: ScriptBehavior) -> Self {
        Self {
            present: Arc::new(Mutex::new(None)),
            behavior,
            injected: Mutex::new(Vec::new()),
            stalled: Mutex::new(Vec::new()),
        }
    }

    /// Drop the bridge global, as a full navigation would.
    pub fn teardown(&self) {
        *lock(&self.present) = None;
    }

    /// Script URLs injected so far, in order.
    #[must_use]
    pub fn injected_scripts(&self) -> Vec<String> {
        lock(&self.injected).clone()
    }
}

impl BridgeHost for ScriptedHost {
    fn lookup(&self) -> Option<Arc<dyn NativeBridge>> {
        lock(&self.present).clone()
    }

    fn inject_script(&self, src: &str, done: Resolver<ScriptLoadEvent>) -> Result<(), BridgeError> {
        if let ScriptBehavior::RejectsInjection(reason) = &self.behavior {
            return Err(BridgeError::Injection(reason.clone()));
        }
        lock(&self.injected).push(src.to_string());

        match self.behavior.clone() {
            ScriptBehavior::InstallsBridge { bridge, after } => {
                let present = Arc::clone(&self.present);
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    *lock(&present) = Some(bridge);
                    done.resolve(ScriptLoadEvent::Loaded);
                });
            }
            ScriptBehavior::LoadsWithoutGlobal { after } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    done.resolve(ScriptLoadEvent::Loaded);
                });
            }
            ScriptBehavior::Fails { after, reason } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    done.resolve(ScriptLoadEvent::Failed(reason));
                });
            }
            ScriptBehavior::NeverSettles => park(&self.stalled, done),
            ScriptBehavior::RejectsInjection(_) => {}
        }
        Ok(())
    }
}

/// Scripted answers to the GPS status query.
#[derive(Debug, Clone)]
pub enum GpsReply {
    /// Invoke the callback with each payload at its offset from the call.
    Callbacks(Vec<(Duration, Value)>),
    /// Never invoke the callback.
    Silent,
    /// Fail synchronously.
    Throws(String),
}

impl GpsReply {
    #[must_use]
    pub fn value(enabled: bool, after: Duration) -> Self {
        GpsReply::Callbacks(vec![(after, json!({ "value": enabled }))])
    }

    #[must_use]
    pub fn payload(payload: Value, after: Duration) -> Self {
        GpsReply::Callbacks(vec![(after, payload)])
    }
}

pub struct ScriptedGps {
    reply: GpsReply,
    calls: AtomicUsize,
    stalled: Mutex<Vec<Resolver<Value>>>,
}

impl ScriptedGps {
    #[must_use]
    pub fn new(reply: GpsReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            stalled: Mutex::new(Vec::new()),
        }
    }
}

impl GpsStatusApi for ScriptedGps {
    fn is_device_gps_enabled(&self, callback: Resolver<Value>) -> Result<(), BridgeCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            GpsReply::Throws(reason) => {
                return Err(BridgeCallError::new("isDeviceGPSEnabled", reason.clone()))
            }
            GpsReply::Silent => park(&self.stalled, callback),
            GpsReply::Callbacks(script) => {
                let script = script.clone();
                let start = tokio::time::Instant::now();
                tokio::spawn(async move {
                    for (offset, payload) in script {
                        tokio::time::sleep_until(start + offset).await;
                        callback.resolve(payload);
                    }
                });
            }
        }
        Ok(())
    }
}

/// One call recorded by [`ScriptedAnalytics`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsCall {
    SetCollection(bool),
    DefaultParameters(Map<String, Value>),
    Event {
        name: String,
        parameters: Map<String, Value>,
    },
    UserId(String),
    UserProperty {
        key: String,
        value: String,
    },
    Screen {
        name: String,
        class: String,
    },
}

#[derive(Default)]
pub struct ScriptedAnalytics {
    calls: Mutex<Vec<AnalyticsCall>>,
    failing: Option<&'static str>,
}

impl ScriptedAnalytics {
    /// Analytics whose `call` method fails synchronously.
    #[must_use]
    pub fn failing(call: &'static str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Some(call),
        }
    }

    #[must_use]
    pub fn calls(&self) -> Vec<AnalyticsCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, name: &'static str, call: AnalyticsCall) -> Result<(), BridgeCallError> {
        if self.failing == Some(name) {
            return Err(BridgeCallError::new(name, "scripted failure"));
        }
        lock(&self.calls).push(call);
        Ok(())
    }
}

impl AnalyticsApi for ScriptedAnalytics {
    fn set_collection(&self, enabled: bool) -> Result<(), BridgeCallError> {
        self.record("setCollection", AnalyticsCall::SetCollection(enabled))
    }

    fn set_default_event_parameters(&self, parameters: &Map<String, Value>) -> Result<(), BridgeCallError> {
        self.record(
            "setDefaultEventParameters",
            AnalyticsCall::DefaultParameters(parameters.clone()),
        )
    }

    fn log_event(&self, event_name: &str, parameters: &Map<String, Value>) -> Result<(), BridgeCallError> {
        self.record(
            "logEvent",
            AnalyticsCall::Event {
                name: event_name.to_string(),
                parameters: parameters.clone(),
            },
        )
    }

    fn set_user_id(&self, user_id: &str) -> Result<(), BridgeCallError> {
        self.record("setUserId", AnalyticsCall::UserId(user_id.to_string()))
    }

    fn set_user_property(&self, key: &str, value: &str) -> Result<(), BridgeCallError> {
        self.record(
            "setUserProperty",
            AnalyticsCall::UserProperty {
                key: key.to_string(),
                value: value.to_string(),
            },
        )
    }

    fn log_screen(&self, screen_name: &str, screen_class: &str) -> Result<(), BridgeCallError> {
        self.record(
            "logScreen",
            AnalyticsCall::Screen {
                name: screen_name.to_string(),
                class: screen_class.to_string(),
            },
        )
    }
}

/// Scripted answers to the FCM token request.
#[derive(Debug, Clone)]
pub enum TokenReply {
    /// Success callback with `{"token": token}`.
    Token { token: String, after: Duration },
    /// Success callback with an arbitrary payload.
    Data(Value),
    /// Fail callback with `{"message": reason}`.
    Fails(String),
    Silent,
    Throws(String),
}

pub struct ScriptedMessaging {
    reply: TokenReply,
    calls: AtomicUsize,
    stalled: Mutex<Vec<Resolver<Result<Value, Value>>>>,
}

impl ScriptedMessaging {
    #[must_use]
    pub fn new(reply: TokenReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            stalled: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MessagingApi for ScriptedMessaging {
    fn get_fcm_token(&self, callback: Resolver<Result<Value, Value>>) -> Result<(), BridgeCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (after, reply) = match &self.reply {
            TokenReply::Throws(reason) => {
                return Err(BridgeCallError::new("getFCMToken", reason.clone()))
            }
            TokenReply::Silent => {
                park(&self.stalled, callback);
                return Ok(());
            }
            TokenReply::Token { token, after } => (*after, Ok(json!({ "token": token }))),
            TokenReply::Data(data) => (Duration::ZERO, Ok(data.clone())),
            TokenReply::Fails(reason) => (Duration::ZERO, Err(json!({ "message": reason }))),
        };
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            callback.resolve(reply);
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct ScriptedFirebase {
    analytics: Option<ScriptedAnalytics>,
    messaging: Option<ScriptedMessaging>,
}

impl ScriptedFirebase {
    #[must_use]
    pub fn with_analytics(mut self, analytics: ScriptedAnalytics) -> Self {
        self.analytics = Some(analytics);
        self
    }

    #[must_use]
    pub fn with_messaging(mut self, messaging: ScriptedMessaging) -> Self {
        self.messaging = Some(messaging);
        self
    }
}

impl FirebaseApi for ScriptedFirebase {
    fn analytics(&self) -> Option<&dyn AnalyticsApi> {
        self.analytics.as_ref().map(|a| a as &dyn AnalyticsApi)
    }

    fn messaging(&self) -> Option<&dyn MessagingApi> {
        self.messaging.as_ref().map(|m| m as &dyn MessagingApi)
    }
}

#[derive(Default)]
pub struct ScriptedBridge {
    gps: Option<ScriptedGps>,
    firebase: Option<ScriptedFirebase>,
}

impl ScriptedBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_gps(mut self, reply: GpsReply) -> Self {
        self.gps = Some(ScriptedGps::new(reply));
        self
    }

    #[must_use]
    pub fn with_firebase(mut self, firebase: ScriptedFirebase) -> Self {
        self.firebase = Some(firebase);
        self
    }

    /// Number of GPS status queries received.
    #[must_use]
    pub fn gps_calls(&self) -> usize {
        self.gps
            .as_ref()
            .map_or(0, |gps| gps.calls.load(Ordering::SeqCst))
    }

    #[must_use]
    pub fn analytics_calls(&self) -> Vec<AnalyticsCall> {
        self.firebase
            .as_ref()
            .and_then(|f| f.analytics.as_ref())
            .map(ScriptedAnalytics::calls)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn token_calls(&self) -> usize {
        self.firebase
            .as_ref()
            .and_then(|f| f.messaging.as_ref())
            .map_or(0, ScriptedMessaging::calls)
    }
}

impl NativeBridge for ScriptedBridge {
    fn gps(&self) -> Option<&dyn GpsStatusApi> {
        self.gps.as_ref().map(|g| g as &dyn GpsStatusApi)
    }

    fn firebase(&self) -> Option<&dyn FirebaseApi> {
        self.firebase.as_ref().map(|f| f as &dyn FirebaseApi)
    }
}

/// Keep a silent callback alive while its waiter is still listening.
fn park<T>(stalled: &Mutex<Vec<Resolver<T>>>, resolver: Resolver<T>) {
    let mut stalled = lock(stalled);
    stalled.retain(|parked| !parked.is_settled());
    stalled.push(resolver);
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
