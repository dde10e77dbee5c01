//! Page-side hooks notified while a location request runs.

use std::sync::{Mutex, PoisonError};

use pbnative_core::LatLng;
use serde::Serialize;

/// Optional UI hooks. Every method defaults to a no-op, so a page that
/// registers none of them still gets a complete request.
pub trait LocationHooks: Send + Sync {
    fn on_loading_changed(&self, _loading: bool) {}

    /// `None` clears a previously shown error.
    fn on_error(&self, _message: Option<&str>) {}

    fn on_location_resolved(&self, _location: LatLng) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl LocationHooks for NoopHooks {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "hook", rename_all = "snake_case")]
pub enum HookEvent {
    Loading { loading: bool },
    Error { message: Option<String> },
    Resolved { location: LatLng },
}

/// Records every hook invocation in order.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
}

impl RecordingHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<HookEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `on_loading_changed(false)` calls.
    #[must_use]
    pub fn loading_cleared(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, HookEvent::Loading { loading: false }))
            .count()
    }

    /// Last non-empty error message shown.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            HookEvent::Error { message } => message,
            _ => None,
        })
    }

    fn push(&self, event: HookEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl LocationHooks for RecordingHooks {
    fn on_loading_changed(&self, loading: bool) {
        self.push(HookEvent::Loading { loading });
    }

    fn on_error(&self, message: Option<&str>) {
        self.push(HookEvent::Error {
            message: message.map(str::to_string),
        });
    }

    fn on_location_resolved(&self, location: LatLng) {
        self.push(HookEvent::Resolved { location });
    }
}
