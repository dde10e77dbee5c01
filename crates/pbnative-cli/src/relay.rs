use std::sync::Arc;

use anyhow::Context;
use pbnative_bridge::{BridgeLoader, BridgeRelay, RelayError};
use pbnative_core::AppConfig;
use serde::Serialize;
use serde_json::Map;

use crate::scenario::{relay_host, BridgeMode, TokenMode};

#[derive(Debug, Default, Serialize)]
struct RelaySummary {
    initialized: bool,
    analytics_errors: Vec<String>,
    push_token: Option<String>,
    push_token_error: Option<String>,
}

/// Page-level inputs to the page-open flow.
#[derive(Debug, Default)]
pub(crate) struct PageOpen<'a> {
    pub user_id: Option<&'a str>,
    /// Notification title and its raw JSON options.
    pub notification: Option<(&'a str, &'a str)>,
}

pub(crate) async fn run_relay(
    config: &AppConfig,
    bridge: BridgeMode,
    script_delay_ms: u64,
    token: TokenMode,
    page: &PageOpen<'_>,
) -> anyhow::Result<()> {
    let loader = Arc::new(BridgeLoader::from_config(
        Arc::new(relay_host(bridge, script_delay_ms, token)),
        config,
    ));
    let relay = BridgeRelay::new(loader, config);
    let summary = relay_page_open(&relay, page).await;

    let rendered =
        serde_json::to_string_pretty(&summary).context("failed to render relay summary")?;
    println!("{rendered}");
    Ok(())
}

/// Page-open flow: analytics setup and events first, then the push token.
/// Analytics failures are recorded and never stop the token fetch.
async fn relay_page_open(relay: &BridgeRelay, page: &PageOpen<'_>) -> RelaySummary {
    let mut summary = RelaySummary::default();

    match relay.initialize().await {
        Ok(()) => {
            let mut results = vec![relay.log_event("app_open", Map::new()).await];
            if let Some(user_id) = page.user_id {
                results.push(relay.set_user_id(user_id).await);
                results.push(relay.set_user_property("user_type", "registered").await);
            }
            results.push(relay.log_screen("home", "HomePage").await);
            if let Some((title, options)) = page.notification {
                results.push(relay.notification_shown(title, options).await);
            }
            summary.analytics_errors = results
                .into_iter()
                .filter_map(Result::err)
                .map(|err| log_relay_error("analytics", &err))
                .collect();
        }
        Err(err) => summary.analytics_errors.push(log_relay_error("analytics", &err)),
    }
    summary.initialized = relay.is_initialized();

    match relay.fetch_push_token().await {
        Ok(token) => summary.push_token = Some(token),
        Err(err) => summary.push_token_error = Some(log_relay_error("push token", &err)),
    }
    summary
}

fn log_relay_error(stage: &str, err: &RelayError) -> String {
    tracing::warn!(stage, error = %err, "bridge relay call failed");
    err.to_string()
}
