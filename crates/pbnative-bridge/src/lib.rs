//! Seam to the optional native bridge exposed inside the WebView host.
//!
//! The bridge is loaded lazily by [`BridgeLoader`] and consumed by the
//! location sequencer (GPS status) and by [`BridgeRelay`] (Firebase
//! analytics and push tokens).

pub mod api;
pub mod error;
pub mod loader;
pub mod relay;
pub mod scripted;

pub use api::{
    AnalyticsApi, BridgeHost, FirebaseApi, GpsStatus, GpsStatusApi, MessagingApi, NativeBridge,
    ScriptLoadEvent,
};
pub use error::{BridgeCallError, BridgeError, RelayError};
pub use loader::{BridgeAvailability, BridgeLoader};
pub use relay::BridgeRelay;
