//! GPS-capability check with platform-geolocation fallback.
//!
//! Order of operations for one trigger:
//!
//! 1. Resolve the native bridge (cached per page lifetime).
//! 2. If it exposes a GPS status query, ask it, bounded by `gps_check_timeout`.
//!    `{"value": false}` ends the request with [`ErrorKind::GpsDisabled`].
//! 3. Otherwise, or on `{"value": true}`, request a position from the
//!    platform, bounded by the position watchdog.
//!
//! Every bridge-side failure (absent, no query, synchronous failure,
//! malformed payload, timeout) falls through to step 3.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pbnative_bridge::{BridgeAvailability, BridgeLoader, GpsStatus};
use pbnative_core::{
    await_resolution, pending, AppConfig, ErrorKind, LocationError, Outcome, WaitError,
};
use serde_json::Value;

use crate::geolocation::{classify_reply, Geolocation, PositionOptions, PositionReply};
use crate::hooks::LocationHooks;
use crate::request::{FallbackReason, LocationRequest, RequestReport, RequestState};

enum GpsVerdict {
    Enabled,
    Disabled,
    Fallback(FallbackReason),
}

pub struct LocationAcquisitionSequencer {
    loader: Arc<BridgeLoader>,
    geolocation: Option<Arc<dyn Geolocation>>,
    gps_check_timeout: Duration,
    position_options: PositionOptions,
    position_watchdog: Duration,
    active: AtomicBool,
}

/// Clears the active flag when the request ends, however it ends.
struct ActiveGuard<'a>(&'a AtomicBool);

impl<'a> ActiveGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LocationAcquisitionSequencer {
    /// `geolocation` is `None` on platforms without a geolocation API.
    #[must_use]
    pub fn new(
        loader: Arc<BridgeLoader>,
        geolocation: Option<Arc<dyn Geolocation>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            loader,
            geolocation,
            gps_check_timeout: config.gps_check_timeout(),
            position_options: PositionOptions::from_config(config),
            position_watchdog: config.position_watchdog(),
            active: AtomicBool::new(false),
        }
    }

    /// Whether a request is currently in flight on this surface.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Run one location request and return its terminal outcome.
    ///
    /// A trigger while another request is active returns
    /// [`ErrorKind::AlreadyInProgress`] at once without touching `hooks`.
    pub async fn acquire_location(&self, hooks: &dyn LocationHooks) -> Outcome {
        self.acquire_location_report(hooks).await.outcome
    }

    /// Like [`acquire_location`](Self::acquire_location), with a summary of the path taken.
    pub async fn acquire_location_report(&self, hooks: &dyn LocationHooks) -> RequestReport {
        let Some(_active) = ActiveGuard::acquire(&self.active) else {
            tracing::info!("location request ignored: another request is in progress");
            return RequestReport::rejected();
        };

        let mut request = LocationRequest::new();
        tracing::debug!(request = %request.id(), "location request started");
        hooks.on_loading_changed(true);
        hooks.on_error(None);

        let outcome = self.drive(&mut request).await;
        request.complete(outcome, hooks);
        request.report()
    }

    async fn drive(&self, request: &mut LocationRequest) -> Outcome {
        let Some(geolocation) = self.geolocation.as_deref() else {
            // Nothing the bridge answers can produce a position.
            return Err(LocationError::new(ErrorKind::UnsupportedPlatform));
        };

        request.transition(RequestState::CheckingBridgeAvailability);
        match self.check_gps(request).await {
            GpsVerdict::Disabled => return Err(LocationError::new(ErrorKind::GpsDisabled)),
            GpsVerdict::Enabled => request.record_gps_confirmed(),
            GpsVerdict::Fallback(reason) => {
                tracing::info!(
                    request = %request.id(),
                    ?reason,
                    kind = %ErrorKind::BridgeUnavailable,
                    "falling back to platform geolocation"
                );
                request.record_fallback(reason);
            }
        }

        request.transition(RequestState::AwaitingPosition);
        self.request_position(geolocation).await
    }

    async fn check_gps(&self, request: &mut LocationRequest) -> GpsVerdict {
        let bridge = match self.loader.resolve().await {
            BridgeAvailability::Available(bridge) => bridge,
            BridgeAvailability::Unavailable(err) => {
                tracing::debug!(request = %request.id(), error = %err, "bridge unavailable");
                return GpsVerdict::Fallback(FallbackReason::BridgeUnavailable);
            }
        };

        let (callback, answer) = pending::<Value>();
        {
            let Some(gps) = bridge.gps() else {
                return GpsVerdict::Fallback(FallbackReason::NoGpsQuery);
            };
            request.transition(RequestState::CheckingGpsCapability);
            if let Err(err) = gps.is_device_gps_enabled(callback) {
                tracing::warn!(request = %request.id(), error = %err, "GPS status query failed");
                return GpsVerdict::Fallback(FallbackReason::CallFailed);
            }
        }

        match await_resolution(answer, self.gps_check_timeout).await {
            Ok(payload) => match GpsStatus::from_payload(&payload) {
                GpsStatus::Enabled => GpsVerdict::Enabled,
                GpsStatus::Disabled => GpsVerdict::Disabled,
                GpsStatus::Ambiguous => {
                    tracing::warn!(request = %request.id(), %payload, "unrecognised GPS status payload");
                    GpsVerdict::Fallback(FallbackReason::AmbiguousPayload)
                }
            },
            Err(WaitError::TimedOut(timeout)) => {
                tracing::warn!(request = %request.id(), ?timeout, "GPS status query timed out");
                GpsVerdict::Fallback(FallbackReason::CapabilityTimeout)
            }
            Err(WaitError::Abandoned) => GpsVerdict::Fallback(FallbackReason::CallbackDropped),
        }
    }

    async fn request_position(&self, geolocation: &dyn Geolocation) -> Outcome {
        let (reply, position) = pending::<PositionReply>();
        if let Err(fault) = geolocation.get_current_position(self.position_options, reply) {
            return Err(LocationError::with_detail(
                ErrorKind::UnknownPositionError,
                fault.to_string(),
            ));
        }

        match await_resolution(position, self.position_watchdog).await {
            Ok(reply) => classify_reply(reply),
            Err(WaitError::TimedOut(timeout)) => Err(LocationError::with_detail(
                ErrorKind::Timeout,
                format!("no position callback within {}ms", timeout.as_millis()),
            )),
            Err(WaitError::Abandoned) => Err(LocationError::with_detail(
                ErrorKind::UnknownPositionError,
                "position callback dropped",
            )),
        }
    }
}

#[cfg(test)]
#[path = "sequencer_test.rs"]
mod tests;
