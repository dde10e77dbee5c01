use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use pbnative_bridge::BridgeLoader;
use pbnative_core::AppConfig;
use pbnative_location::{HookEvent, LocationAcquisitionSequencer, RecordingHooks, RequestReport};
use serde::Serialize;

use crate::scenario::LocateScenario;

#[derive(Debug, Serialize)]
struct TriggerResult {
    trigger: usize,
    report: RequestReport,
    hooks: Vec<HookEvent>,
}

pub(crate) async fn run_locate(
    config: &AppConfig,
    scenario: &LocateScenario,
    triggers: usize,
) -> anyhow::Result<()> {
    let results = locate(config, scenario, triggers).await;
    let rendered =
        serde_json::to_string_pretty(&results).context("failed to render location reports")?;
    println!("{rendered}");
    Ok(())
}

/// Fire `triggers` concurrent requests against one sequencer.
async fn locate(
    config: &AppConfig,
    scenario: &LocateScenario,
    triggers: usize,
) -> Vec<TriggerResult> {
    let host = Arc::new(scenario.host());
    let loader = Arc::new(BridgeLoader::from_config(host, config));
    let sequencer = LocationAcquisitionSequencer::new(loader, scenario.geolocation(), config);

    let hooks: Vec<RecordingHooks> = (0..triggers.max(1)).map(|_| RecordingHooks::new()).collect();
    let reports = join_all(
        hooks
            .iter()
            .map(|hooks| sequencer.acquire_location_report(hooks)),
    )
    .await;

    reports
        .into_iter()
        .zip(&hooks)
        .enumerate()
        .map(|(trigger, (report, hooks))| {
            tracing::info!(
                trigger,
                state = ?report.final_state,
                fallback = ?report.fallback,
                elapsed_ms = report.elapsed_ms,
                "trigger finished"
            );
            TriggerResult {
                trigger,
                report,
                hooks: hooks.events(),
            }
        })
        .collect()
}
