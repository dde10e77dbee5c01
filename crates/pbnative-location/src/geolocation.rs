//! The platform geolocation API and classification of its replies.

use std::time::Duration;

use pbnative_core::{Coordinates, ErrorKind, LocationError, Outcome, Resolver};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PERMISSION_DENIED: u16 = 1;
pub const POSITION_UNAVAILABLE: u16 = 2;
pub const TIMEOUT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    /// `None` leaves the timeout to the platform.
    pub timeout: Option<Duration>,
    pub maximum_age: Duration,
}

impl PositionOptions {
    #[must_use]
    pub fn from_config(config: &pbnative_core::AppConfig) -> Self {
        Self {
            enable_high_accuracy: config.high_accuracy,
            timeout: config.position_timeout(),
            maximum_age: Duration::from_millis(config.position_max_age_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCoords {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub coords: Option<RawCoords>,
}

impl RawPosition {
    #[must_use]
    pub fn fix(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            coords: Some(RawCoords {
                latitude: Some(latitude),
                longitude: Some(longitude),
                accuracy: Some(accuracy),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPositionError {
    pub code: u16,
    pub message: String,
}

/// What the platform hands to its success or error callback.
pub type PositionReply = Result<RawPosition, RawPositionError>;

/// The request could not be issued at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error requesting location: {0}")]
pub struct GeolocationFault(pub String);

pub trait Geolocation: Send + Sync {
    /// Issue a one-shot position request. `reply` receives the success or
    /// error callback; platforms honour `options.timeout` themselves.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationFault`] if the request could not be issued.
    fn get_current_position(
        &self,
        options: PositionOptions,
        reply: Resolver<PositionReply>,
    ) -> Result<(), GeolocationFault>;
}

#[must_use]
pub fn error_kind_for_code(code: u16) -> ErrorKind {
    match code {
        PERMISSION_DENIED => ErrorKind::PermissionDenied,
        POSITION_UNAVAILABLE => ErrorKind::PositionUnavailable,
        TIMEOUT => ErrorKind::Timeout,
        _ => ErrorKind::UnknownPositionError,
    }
}

/// Turn a platform reply into a terminal outcome.
///
/// # Errors
///
/// Platform errors map through [`error_kind_for_code`]; a success without
/// finite latitude and longitude is [`ErrorKind::InvalidPosition`].
pub fn classify_reply(reply: PositionReply) -> Outcome {
    match reply {
        Ok(position) => {
            let coords = position.coords.unwrap_or_default();
            match (coords.latitude, coords.longitude) {
                (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                    Ok(Coordinates {
                        latitude,
                        longitude,
                        accuracy_meters: coords.accuracy.filter(|a| a.is_finite()),
                    })
                }
                (latitude, longitude) => Err(LocationError::with_detail(
                    ErrorKind::InvalidPosition,
                    format!("latitude={latitude:?} longitude={longitude:?}"),
                )),
            }
        }
        Err(error) => {
            let kind = error_kind_for_code(error.code);
            Err(LocationError {
                kind,
                detail: Some(error.message).filter(|m| !m.is_empty()),
            })
        }
    }
}
