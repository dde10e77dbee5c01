//! Per-trigger request state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use pbnative_core::{ErrorKind, LocationError, Outcome};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::hooks::LocationHooks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    CheckingBridgeAvailability,
    CheckingGpsCapability,
    AwaitingPosition,
    Succeeded,
    Failed,
}

impl RequestState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Succeeded | RequestState::Failed)
    }
}

/// Why the bridge check was skipped in favour of the platform API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    BridgeUnavailable,
    NoGpsQuery,
    CallFailed,
    AmbiguousPayload,
    CapabilityTimeout,
    CallbackDropped,
}

/// One in-flight "use current location" action.
#[derive(Debug)]
pub struct LocationRequest {
    id: Uuid,
    state: RequestState,
    started_at: Instant,
    started_wall: DateTime<Utc>,
    fallback: Option<FallbackReason>,
    gps_confirmed: bool,
    outcome: Option<Outcome>,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationRequest {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RequestState::Idle,
            started_at: Instant::now(),
            started_wall: Utc::now(),
            fallback: None,
            gps_confirmed: false,
            outcome: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> RequestState {
        self.state
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Move to a non-terminal state. Ignored once the request is terminal.
    pub fn transition(&mut self, next: RequestState) {
        if self.state.is_terminal() {
            tracing::warn!(request = %self.id, state = ?self.state, ?next, "transition after completion ignored");
            return;
        }
        tracing::debug!(request = %self.id, from = ?self.state, to = ?next, "location request transition");
        self.state = next;
    }

    pub(crate) fn record_fallback(&mut self, reason: FallbackReason) {
        self.fallback = Some(reason);
    }

    pub(crate) fn record_gps_confirmed(&mut self) {
        self.gps_confirmed = true;
    }

    #[must_use]
    pub fn fallback(&self) -> Option<FallbackReason> {
        self.fallback
    }

    /// Enter the terminal state for `outcome` and notify `hooks`.
    ///
    /// Only the first call has any effect; it returns `false` afterwards.
    pub fn complete(&mut self, outcome: Outcome, hooks: &dyn LocationHooks) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        match &outcome {
            Ok(coords) => {
                self.state = RequestState::Succeeded;
                tracing::info!(
                    request = %self.id,
                    elapsed_ms = self.elapsed_ms(),
                    accuracy = ?coords.accuracy_meters,
                    "location resolved"
                );
                hooks.on_location_resolved(coords.lat_lng());
            }
            Err(err) => {
                self.state = RequestState::Failed;
                tracing::info!(
                    request = %self.id,
                    elapsed_ms = self.elapsed_ms(),
                    kind = %err.kind,
                    detail = err.detail.as_deref().unwrap_or(""),
                    "location request failed"
                );
                hooks.on_error(Some(&err.user_message()));
            }
        }
        hooks.on_loading_changed(false);
        self.outcome = Some(outcome);
        true
    }

    #[must_use]
    pub fn report(&self) -> RequestReport {
        RequestReport {
            id: Some(self.id),
            started_at: self.started_wall,
            elapsed_ms: self.elapsed_ms(),
            final_state: self.state,
            fallback: self.fallback,
            gps_confirmed: self.gps_confirmed,
            outcome: self.outcome.clone().unwrap_or_else(|| {
                Err(LocationError::with_detail(
                    ErrorKind::UnknownPositionError,
                    "request reported before completion",
                ))
            }),
        }
    }
}

/// Summary of a finished (or rejected) request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestReport {
    /// `None` for a trigger rejected while another request was active.
    pub id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub final_state: RequestState,
    pub fallback: Option<FallbackReason>,
    pub gps_confirmed: bool,
    pub outcome: Outcome,
}

impl RequestReport {
    pub(crate) fn rejected() -> Self {
        Self {
            id: None,
            started_at: Utc::now(),
            elapsed_ms: 0,
            final_state: RequestState::Failed,
            fallback: None,
            gps_confirmed: false,
            outcome: Err(LocationError::new(ErrorKind::AlreadyInProgress)),
        }
    }
}
