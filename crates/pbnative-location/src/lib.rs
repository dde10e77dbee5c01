//! "Use current location" sequencing for the WebView shell.
//!
//! [`LocationAcquisitionSequencer`] asks the native bridge whether device
//! GPS is on before falling back to the platform geolocation API, and
//! reports exactly one terminal outcome per trigger.

pub mod geolocation;
pub mod hooks;
pub mod intercept;
pub mod request;
pub mod scripted;
pub mod sequencer;

pub use geolocation::{
    classify_reply, Geolocation, GeolocationFault, PositionOptions, PositionReply, RawCoords,
    RawPosition, RawPositionError,
};
pub use hooks::{HookEvent, LocationHooks, NoopHooks, RecordingHooks};
pub use intercept::InterceptRegistry;
pub use request::{FallbackReason, LocationRequest, RequestReport, RequestState};
pub use sequencer::LocationAcquisitionSequencer;
