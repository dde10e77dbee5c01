//! Location results and the error taxonomy surfaced to UI callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resolved position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

impl Coordinates {
    #[must_use]
    pub fn lat_lng(&self) -> LatLng {
        LatLng {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

/// Shape handed to the page's location-resolved hook.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AlreadyInProgress,
    /// Informational: the bridge path was skipped and the platform API used instead.
    BridgeUnavailable,
    GpsDisabled,
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    UnknownPositionError,
    InvalidPosition,
    UnsupportedPlatform,
}

impl ErrorKind {
    /// Fixed human-readable message for this kind.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::AlreadyInProgress => "Location fetch already in progress",
            ErrorKind::BridgeUnavailable => {
                "Native GPS check not available. Using standard geolocation."
            }
            ErrorKind::GpsDisabled => {
                "Device GPS is disabled. Please enable location services in your device settings."
            }
            ErrorKind::PermissionDenied => {
                "Location access denied. Please enable location permissions in your device settings."
            }
            ErrorKind::PositionUnavailable => {
                "Location information is unavailable. Please check your GPS settings."
            }
            ErrorKind::Timeout => "The request to get user location timed out. Please try again.",
            ErrorKind::UnknownPositionError => {
                "An unknown error occurred while retrieving location."
            }
            ErrorKind::InvalidPosition => "Invalid coordinates received",
            ErrorKind::UnsupportedPlatform => "Geolocation is not supported by this browser.",
        }
    }

    /// Whether a failure of this kind is shown through the page's error hook.
    #[must_use]
    pub fn is_user_visible(self) -> bool {
        !matches!(self, ErrorKind::BridgeUnavailable | ErrorKind::AlreadyInProgress)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::AlreadyInProgress => "already_in_progress",
            ErrorKind::BridgeUnavailable => "bridge_unavailable",
            ErrorKind::GpsDisabled => "gps_disabled",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::PositionUnavailable => "position_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UnknownPositionError => "unknown_position_error",
            ErrorKind::InvalidPosition => "invalid_position",
            ErrorKind::UnsupportedPlatform => "unsupported_platform",
        };
        f.write_str(name)
    }
}

/// A classified location failure. `detail` carries whatever the collaborator
/// reported (platform error message, bridge fault) for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}", self.user_message())]
pub struct LocationError {
    pub kind: ErrorKind,
    pub detail: Option<String>,
}

impl LocationError {
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, detail: None }
    }

    #[must_use]
    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    /// Message handed to the page's error hook.
    ///
    /// Unknown platform errors that came with a message surface it, the
    /// rest use the fixed text of their kind.
    #[must_use]
    pub fn user_message(&self) -> String {
        match (self.kind, self.detail.as_deref()) {
            (ErrorKind::UnknownPositionError, Some(detail)) if !detail.trim().is_empty() => {
                format!("An unexpected error occurred: {detail}")
            }
            (kind, _) => kind.message().to_string(),
        }
    }
}

/// Terminal result of one location request.
pub type Outcome = Result<Coordinates, LocationError>;
