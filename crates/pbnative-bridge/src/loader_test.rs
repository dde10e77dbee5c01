use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::scripted::{ScriptBehavior, ScriptedBridge, ScriptedHost};

const SCRIPT: &str = "https://unpkg.com/webtonative@1.0.71/webtonative.min.js";

fn loader_for(host: Arc<ScriptedHost>) -> BridgeLoader {
    BridgeLoader::new(
        host,
        SCRIPT,
        Duration::from_millis(10_000),
        Duration::from_millis(100),
    )
}

#[tokio::test(start_paused = true)]
async fn present_bridge_resolves_without_injection() {
    let host = Arc::new(ScriptedHost::with_bridge(Arc::new(ScriptedBridge::new())));
    let loader = loader_for(Arc::clone(&host));

    assert!(loader.resolve().await.is_available());
    assert_eq!(loader.injection_count(), 0);
    assert!(host.injected_scripts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn injected_script_installing_bridge_resolves_available() {
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::InstallsBridge {
        bridge: Arc::new(ScriptedBridge::new()),
        after: Duration::from_millis(300),
    }));
    let loader = loader_for(Arc::clone(&host));

    assert!(loader.resolve().await.is_available());
    assert_eq!(host.injected_scripts(), vec![SCRIPT.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn load_without_global_is_unavailable_after_grace() {
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::LoadsWithoutGlobal {
        after: Duration::from_millis(50),
    }));
    let loader = loader_for(host);

    let started = tokio::time::Instant::now();
    let availability = loader.resolve().await;
    assert!(
        matches!(availability, BridgeAvailability::Unavailable(BridgeError::GlobalMissing { .. })),
        "got {availability:?}"
    );
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test(start_paused = true)]
async fn script_error_is_unavailable() {
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::Fails {
        after: Duration::from_millis(20),
        reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
    }));
    let loader = loader_for(host);

    let availability = loader.resolve().await;
    assert!(
        matches!(availability, BridgeAvailability::Unavailable(BridgeError::ScriptLoad { ref reason, .. }) if reason.contains("ERR_NAME")),
        "got {availability:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn script_that_never_settles_times_out() {
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::NeverSettles));
    let loader = loader_for(host);

    let availability = loader.resolve().await;
    assert!(
        matches!(availability, BridgeAvailability::Unavailable(BridgeError::LoadTimeout { timeout_ms: 10_000, .. })),
        "got {availability:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn rejected_injection_is_unavailable() {
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::RejectsInjection(
        "document.head missing".to_string(),
    )));
    let loader = loader_for(host);

    let availability = loader.resolve().await;
    assert!(
        matches!(availability, BridgeAvailability::Unavailable(BridgeError::Injection(_))),
        "got {availability:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn resolution_is_cached_for_the_page_lifetime() {
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::Fails {
        after: Duration::ZERO,
        reason: "blocked".to_string(),
    }));
    let loader = loader_for(Arc::clone(&host));

    assert!(!loader.resolve().await.is_available());
    assert!(!loader.resolve().await.is_available());
    assert!(loader.is_resolved().await);
    assert_eq!(loader.injection_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_resolutions_inject_once() {
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::InstallsBridge {
        bridge: Arc::new(ScriptedBridge::new()),
        after: Duration::from_millis(500),
    }));
    let loader = loader_for(Arc::clone(&host));

    let (a, b) = tokio::join!(loader.resolve(), loader.resolve());
    assert!(a.is_available());
    assert!(b.is_available());
    assert_eq!(host.injected_scripts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn invalidate_forces_re_resolution_after_teardown() {
    let host = Arc::new(ScriptedHost::new(ScriptBehavior::InstallsBridge {
        bridge: Arc::new(ScriptedBridge::new()),
        after: Duration::from_millis(10),
    }));
    let loader = loader_for(Arc::clone(&host));

    assert!(loader.resolve().await.is_available());
    host.teardown();
    loader.invalidate().await;
    assert!(!loader.is_resolved().await);

    assert!(loader.resolve().await.is_available());
    assert_eq!(loader.injection_count(), 2);
}
