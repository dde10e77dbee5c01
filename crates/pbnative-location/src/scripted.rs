//! Scripted platform geolocation for the harness and tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use pbnative_core::Resolver;

use crate::geolocation::{
    Geolocation, GeolocationFault, PositionOptions, PositionReply, RawPosition, RawPositionError,
};

#[derive(Debug, Clone)]
pub enum PositionScript {
    /// Deliver `reply` after `after`.
    Reply { reply: PositionReply, after: Duration },
    /// Never call back.
    Silent,
    /// Fail synchronously.
    Fault(String),
}

impl PositionScript {
    #[must_use]
    pub fn fix(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        PositionScript::Reply {
            reply: Ok(RawPosition::fix(latitude, longitude, accuracy)),
            after: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn error(code: u16, message: &str) -> Self {
        PositionScript::Reply {
            reply: Err(RawPositionError {
                code,
                message: message.to_string(),
            }),
            after: Duration::ZERO,
        }
    }

    /// Delay a scripted reply. No effect on `Silent` and `Fault`.
    #[must_use]
    pub fn after(self, delay: Duration) -> Self {
        match self {
            PositionScript::Reply { reply, .. } => PositionScript::Reply {
                reply,
                after: delay,
            },
            other => other,
        }
    }
}

pub struct ScriptedGeolocation {
    script: PositionScript,
    calls: AtomicUsize,
    last_options: Mutex<Option<PositionOptions>>,
    stalled: Mutex<Vec<Resolver<PositionReply>>>,
}

impl ScriptedGeolocation {
    #[must_use]
    pub fn new(script: PositionScript) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
            stalled: Mutex::new(Vec::new()),
        }
    }

    /// Number of position requests received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_options(&self) -> Option<PositionOptions> {
        *self
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Geolocation for ScriptedGeolocation {
    fn get_current_position(
        &self,
        options: PositionOptions,
        reply: Resolver<PositionReply>,
    ) -> Result<(), GeolocationFault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(options);

        match &self.script {
            PositionScript::Fault(reason) => return Err(GeolocationFault(reason.clone())),
            PositionScript::Silent => {
                let mut stalled = self.stalled.lock().unwrap_or_else(PoisonError::into_inner);
                stalled.retain(|parked| !parked.is_settled());
                stalled.push(reply);
            }
            PositionScript::Reply { reply: scripted, after } => {
                let scripted = scripted.clone();
                let after = *after;
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    reply.resolve(scripted);
                });
            }
        }
        Ok(())
    }
}
