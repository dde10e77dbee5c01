use std::time::Duration;

use thiserror::Error;

/// Why the native bridge could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("bridge script {url} failed to load: {reason}")]
    ScriptLoad { url: String, reason: String },

    #[error("bridge script {url} loaded but the bridge global is still missing")]
    GlobalMissing { url: String },

    #[error("bridge script {url} did not finish loading within {timeout_ms}ms")]
    LoadTimeout { url: String, timeout_ms: u128 },

    #[error("could not inject bridge script: {0}")]
    Injection(String),
}

/// A bridge function failed synchronously when called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bridge call {call} failed: {reason}")]
pub struct BridgeCallError {
    pub call: &'static str,
    pub reason: String,
}

impl BridgeCallError {
    #[must_use]
    pub fn new(call: &'static str, reason: impl Into<String>) -> Self {
        Self {
            call,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("native bridge unavailable: {0}")]
    BridgeUnavailable(#[from] BridgeError),

    #[error("bridge does not expose {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Call(#[from] BridgeCallError),

    #[error("push token not received within {0:?}")]
    TokenTimeout(Duration),

    #[error("push token request failed: {0}")]
    TokenRejected(String),

    #[error("push token response carried no token")]
    MissingToken,

    #[error("invalid notification options: {0}")]
    InvalidNotificationOptions(String),
}
