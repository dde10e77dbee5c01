//! Builds scripted collaborators from command-line choices.

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use pbnative_bridge::scripted::{
    GpsReply, ScriptBehavior, ScriptedAnalytics, ScriptedBridge, ScriptedFirebase, ScriptedHost,
    ScriptedMessaging, TokenReply,
};
use pbnative_bridge::NativeBridge;
use pbnative_location::geolocation::{PERMISSION_DENIED, POSITION_UNAVAILABLE, TIMEOUT};
use pbnative_location::scripted::{PositionScript, ScriptedGeolocation};
use pbnative_location::Geolocation;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BridgeMode {
    /// Bridge global already on the page.
    Present,
    /// Script injection installs the bridge.
    Loads,
    /// Script loads but never defines the global.
    LoadsWithoutGlobal,
    /// Script injection reports an error.
    Fails,
    /// Script never fires load or error.
    NeverLoads,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GpsMode {
    Enabled,
    Disabled,
    /// Query accepted, callback never invoked.
    Silent,
    /// Query throws synchronously.
    Throws,
    /// Callback payload has no boolean `value`.
    Malformed,
    /// Bridge has no GPS query.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeoMode {
    Fix,
    Denied,
    Unavailable,
    Timeout,
    /// Error with a code outside the standard three.
    Unknown,
    /// Success callback without coordinates.
    Null,
    Silent,
    Fault,
    /// Platform has no geolocation API.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TokenMode {
    Token,
    /// Success callback without a token.
    Empty,
    Fails,
    Silent,
    Throws,
}

/// Everything needed to stage one `locate` run.
#[derive(Debug, Clone)]
pub struct LocateScenario {
    pub bridge: BridgeMode,
    pub script_delay_ms: u64,
    pub gps: GpsMode,
    pub gps_delay_ms: u64,
    pub geo: GeoMode,
    pub geo_delay_ms: u64,
    pub fix: (f64, f64, f64),
}

impl LocateScenario {
    pub fn host(&self) -> ScriptedHost {
        let bridge = ScriptedBridge::new();
        let bridge = match gps_reply(self.gps, Duration::from_millis(self.gps_delay_ms)) {
            Some(reply) => bridge.with_gps(reply),
            None => bridge,
        };
        build_host(self.bridge, self.script_delay_ms, Arc::new(bridge))
    }

    pub fn geolocation(&self) -> Option<Arc<dyn Geolocation>> {
        let (lat, lng, accuracy) = self.fix;
        let script = match self.geo {
            GeoMode::Unsupported => return None,
            GeoMode::Fix => PositionScript::fix(lat, lng, accuracy),
            GeoMode::Denied => PositionScript::error(PERMISSION_DENIED, "User denied Geolocation"),
            GeoMode::Unavailable => {
                PositionScript::error(POSITION_UNAVAILABLE, "Position unavailable")
            }
            GeoMode::Timeout => PositionScript::error(TIMEOUT, "Timeout expired"),
            GeoMode::Unknown => PositionScript::error(99, "Unrecognized failure"),
            GeoMode::Null => PositionScript::Reply {
                reply: Ok(pbnative_location::RawPosition { coords: None }),
                after: Duration::ZERO,
            },
            GeoMode::Silent => PositionScript::Silent,
            GeoMode::Fault => PositionScript::Fault("geolocation object is not callable".into()),
        };
        let script = script.after(Duration::from_millis(self.geo_delay_ms));
        Some(Arc::new(ScriptedGeolocation::new(script)))
    }
}

fn gps_reply(mode: GpsMode, after: Duration) -> Option<GpsReply> {
    match mode {
        GpsMode::Enabled => Some(GpsReply::value(true, after)),
        GpsMode::Disabled => Some(GpsReply::value(false, after)),
        GpsMode::Silent => Some(GpsReply::Silent),
        GpsMode::Throws => Some(GpsReply::Throws("isDeviceGPSEnabled threw".into())),
        GpsMode::Malformed => Some(GpsReply::payload(json!({ "status": "on" }), after)),
        GpsMode::Missing => None,
    }
}

/// Bridge with Firebase analytics and messaging for the `relay` command.
pub fn relay_host(mode: BridgeMode, script_delay_ms: u64, token: TokenMode) -> ScriptedHost {
    let reply = match token {
        TokenMode::Token => TokenReply::Token {
            token: "fcm-demo-token".into(),
            after: Duration::from_millis(50),
        },
        TokenMode::Empty => TokenReply::Data(json!({})),
        TokenMode::Fails => TokenReply::Fails("messaging/permission-blocked".into()),
        TokenMode::Silent => TokenReply::Silent,
        TokenMode::Throws => TokenReply::Throws("getFCMToken threw".into()),
    };
    let firebase = ScriptedFirebase::default()
        .with_analytics(ScriptedAnalytics::default())
        .with_messaging(ScriptedMessaging::new(reply));
    let bridge = ScriptedBridge::new().with_firebase(firebase);
    build_host(mode, script_delay_ms, Arc::new(bridge))
}

fn build_host(mode: BridgeMode, script_delay_ms: u64, bridge: Arc<dyn NativeBridge>) -> ScriptedHost {
    let after = Duration::from_millis(script_delay_ms);
    match mode {
        BridgeMode::Present => ScriptedHost::with_bridge(bridge),
        BridgeMode::Loads => ScriptedHost::new(ScriptBehavior::InstallsBridge { bridge, after }),
        BridgeMode::LoadsWithoutGlobal => {
            ScriptedHost::new(ScriptBehavior::LoadsWithoutGlobal { after })
        }
        BridgeMode::Fails => ScriptedHost::new(ScriptBehavior::Fails {
            after,
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        }),
        BridgeMode::NeverLoads => ScriptedHost::new(ScriptBehavior::NeverSettles),
    }
}
