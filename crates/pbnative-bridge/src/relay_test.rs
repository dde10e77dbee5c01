use std::sync::Arc;
use std::time::Duration;

use pbnative_core::AppConfig;
use serde_json::{json, Map, Value};

use super::*;
use crate::scripted::{
    AnalyticsCall, ScriptBehavior, ScriptedAnalytics, ScriptedBridge, ScriptedFirebase,
    ScriptedHost, ScriptedMessaging, TokenReply,
};

fn relay_with(bridge: Arc<ScriptedBridge>) -> BridgeRelay {
    let config = AppConfig::default();
    let host = Arc::new(ScriptedHost::with_bridge(bridge));
    let loader = Arc::new(BridgeLoader::from_config(host, &config));
    BridgeRelay::new(loader, &config)
}

fn firebase_bridge(messaging: TokenReply) -> Arc<ScriptedBridge> {
    Arc::new(
        ScriptedBridge::new().with_firebase(
            ScriptedFirebase::default()
                .with_analytics(ScriptedAnalytics::default())
                .with_messaging(ScriptedMessaging::new(messaging)),
        ),
    )
}

#[tokio::test(start_paused = true)]
async fn initialize_enables_collection_with_default_parameters() {
    let bridge = firebase_bridge(TokenReply::Silent);
    let relay = relay_with(Arc::clone(&bridge));

    relay.initialize().await.unwrap();
    relay.initialize().await.unwrap();

    let mut expected = Map::new();
    expected.insert("app_platform".into(), json!("android"));
    expected.insert("app_version".into(), json!("1.0.0"));
    expected.insert("environment".into(), json!("development"));
    assert_eq!(
        bridge.analytics_calls(),
        vec![
            AnalyticsCall::SetCollection(true),
            AnalyticsCall::DefaultParameters(expected),
        ]
    );
    assert!(relay.is_initialized());
}

#[tokio::test(start_paused = true)]
async fn log_event_initializes_lazily() {
    let bridge = firebase_bridge(TokenReply::Silent);
    let relay = relay_with(Arc::clone(&bridge));

    let mut parameters = Map::new();
    parameters.insert("launch_source".into(), json!("auto"));
    relay.log_event("app_open", parameters.clone()).await.unwrap();
    relay.set_user_id("user-123").await.unwrap();
    relay.set_user_property("name", "Webtonative").await.unwrap();
    relay.log_screen("Dashboard", "Main").await.unwrap();

    let calls = bridge.analytics_calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(
        calls[2],
        AnalyticsCall::Event {
            name: "app_open".to_string(),
            parameters,
        }
    );
    assert_eq!(calls[3], AnalyticsCall::UserId("user-123".to_string()));
    assert_eq!(
        calls[5],
        AnalyticsCall::Screen {
            name: "Dashboard".to_string(),
            class: "Main".to_string(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn missing_firebase_is_unsupported() {
    let relay = relay_with(Arc::new(ScriptedBridge::new()));
    let result = relay.log_event("app_open", Map::new()).await;
    assert_eq!(result, Err(RelayError::Unsupported("Firebase")));
    assert!(!relay.is_initialized());
}

#[tokio::test(start_paused = true)]
async fn failing_analytics_call_is_reported() {
    let bridge = Arc::new(ScriptedBridge::new().with_firebase(
        ScriptedFirebase::default().with_analytics(ScriptedAnalytics::failing("logScreen")),
    ));
    let relay = relay_with(bridge);

    let result = relay.log_screen("Dashboard", "Main").await;
    assert!(matches!(result, Err(RelayError::Call(ref e)) if e.call == "logScreen"), "got {result:?}");
    // Initialization itself succeeded.
    assert!(relay.is_initialized());
}

#[tokio::test(start_paused = true)]
async fn absent_bridge_reports_unavailable() {
    let config = AppConfig::default();
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::Fails {
        after: Duration::ZERO,
        reason: "offline".to_string(),
    }));
    let loader = Arc::new(BridgeLoader::from_config(host, &config));
    let relay = BridgeRelay::new(loader, &config);

    let result = relay.initialize().await;
    assert!(matches!(result, Err(RelayError::BridgeUnavailable(_))), "got {result:?}");
}

#[tokio::test(start_paused = true)]
async fn push_token_is_fetched_and_cached() {
    let bridge = firebase_bridge(TokenReply::Token {
        token: "fcm-abc".to_string(),
        after: Duration::from_millis(250),
    });
    let relay = relay_with(Arc::clone(&bridge));

    assert_eq!(relay.fetch_push_token().await, Ok("fcm-abc".to_string()));
    assert_eq!(relay.push_token(), Some("fcm-abc".to_string()));
    assert_eq!(bridge.token_calls(), 1);

    relay.reset();
    assert_eq!(relay.push_token(), None);
    assert!(!relay.is_initialized());
}

#[tokio::test(start_paused = true)]
async fn push_token_fail_callback_is_rejected() {
    let relay = relay_with(firebase_bridge(TokenReply::Fails("SERVICE_NOT_AVAILABLE".to_string())));
    assert_eq!(
        relay.fetch_push_token().await,
        Err(RelayError::TokenRejected("SERVICE_NOT_AVAILABLE".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn push_token_without_token_field_is_missing() {
    let relay = relay_with(firebase_bridge(TokenReply::Data(json!({ "token": "" }))));
    assert_eq!(relay.fetch_push_token().await, Err(RelayError::MissingToken));

    let relay = relay_with(firebase_bridge(TokenReply::Data(Value::Null)));
    assert_eq!(relay.fetch_push_token().await, Err(RelayError::MissingToken));
}

#[tokio::test(start_paused = true)]
async fn silent_messaging_times_out() {
    let relay = relay_with(firebase_bridge(TokenReply::Silent));
    assert_eq!(
        relay.fetch_push_token().await,
        Err(RelayError::TokenTimeout(Duration::from_millis(10_000)))
    );
    assert_eq!(relay.push_token(), None);
}

#[tokio::test(start_paused = true)]
async fn throwing_messaging_call_is_reported() {
    let relay = relay_with(firebase_bridge(TokenReply::Throws("not registered".to_string())));
    let result = relay.fetch_push_token().await;
    assert!(matches!(result, Err(RelayError::Call(_))), "got {result:?}");
}

#[tokio::test(start_paused = true)]
async fn overlapping_initialize_calls_run_setup_once() {
    let config = AppConfig::default();
    let bridge = firebase_bridge(TokenReply::Silent);
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::InstallsBridge {
        bridge: Arc::clone(&bridge) as _,
        after: Duration::from_millis(50),
    }));
    let loader = Arc::new(BridgeLoader::from_config(host, &config));
    let relay = BridgeRelay::new(loader, &config);

    let (first, second) = tokio::join!(relay.initialize(), relay.initialize());

    assert_eq!(first, Ok(()));
    assert_eq!(second, Ok(()));
    let calls = bridge.analytics_calls();
    assert_eq!(calls.len(), 2, "got {calls:?}");
    assert_eq!(calls[0], AnalyticsCall::SetCollection(true));
    assert!(matches!(calls[1], AnalyticsCall::DefaultParameters(_)));
}

// ---------------------------------------------------------------------------
// Notification events
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn notification_shown_merges_options_over_title() {
    let bridge = firebase_bridge(TokenReply::Silent);
    let relay = relay_with(Arc::clone(&bridge));

    relay
        .notification_shown("Match starts soon", r#"{"body":"Court 3","tag":"match-42"}"#)
        .await
        .unwrap();

    let mut expected = Map::new();
    expected.insert("notification_title".into(), json!("Match starts soon"));
    expected.insert("body".into(), json!("Court 3"));
    expected.insert("tag".into(), json!("match-42"));
    assert_eq!(
        bridge.analytics_calls().last(),
        Some(&AnalyticsCall::Event {
            name: "notification_shown".to_string(),
            parameters: expected,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn notification_without_options_logs_title_only() {
    let bridge = firebase_bridge(TokenReply::Silent);
    let relay = relay_with(Arc::clone(&bridge));

    relay.notification_shown("Welcome", "").await.unwrap();

    let mut expected = Map::new();
    expected.insert("notification_title".into(), json!("Welcome"));
    assert_eq!(
        bridge.analytics_calls().last(),
        Some(&AnalyticsCall::Event {
            name: "notification_shown".to_string(),
            parameters: expected,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_notification_options_are_rejected_without_logging() {
    let bridge = firebase_bridge(TokenReply::Silent);
    let relay = relay_with(Arc::clone(&bridge));

    let malformed = relay.notification_shown("Welcome", "{body:").await;
    assert!(
        matches!(malformed, Err(RelayError::InvalidNotificationOptions(_))),
        "got {malformed:?}"
    );
    let not_object = relay.notification_shown("Welcome", "[1, 2]").await;
    assert!(
        matches!(not_object, Err(RelayError::InvalidNotificationOptions(_))),
        "got {not_object:?}"
    );
    assert!(!bridge
        .analytics_calls()
        .iter()
        .any(|call| matches!(call, AnalyticsCall::Event { .. })));
}
