//! Long-running monitor: mounts the root health check plus the selected
//! view's bindings and logs every update until Ctrl-C.

use anyhow::Result;
use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use wildguard_client::api::{
    AgentStatusResponse, AnalyticsSummary, HealthResponse, HotspotsResponse, WildlifeRecord,
};
use wildguard_client::{Binding, Bindings, FetchError};
use wildguard_core::{BindingName, ClientStore, NotificationKind};

/// Log each settled update of `binding`. A new failure also becomes a
/// store notification; a repeat of the same failure does not.
async fn watch<T: DeserializeOwned + Send + 'static>(
    name: BindingName,
    mut binding: Binding<T>,
    store: ClientStore,
    describe: fn(&T) -> String,
) {
    let mut last_error: Option<FetchError> = None;
    while binding.changed().await {
        let state = binding.state();
        if state.is_loading {
            continue;
        }
        match (&state.error, &state.value) {
            (Some(e), _) if last_error.as_ref() != Some(e) => {
                tracing::warn!("{}: {e}", name.key());
                store.add_notification(
                    NotificationKind::Error,
                    format!("{} failed", name.key()),
                    e.to_string(),
                );
            }
            (None, Some(value)) => {
                if last_error.is_some() {
                    tracing::info!("{}: recovered", name.key());
                }
                tracing::info!("{}: {}", name.key(), describe(value));
            }
            _ => {}
        }
        last_error = state.error;
    }
}

fn mount(tasks: &mut JoinSet<()>, bindings: &Bindings, store: &ClientStore, name: BindingName) {
    let store = store.clone();
    match name {
        BindingName::HealthCheck => {
            tasks.spawn(watch(name, bindings.health_check(), store, |h: &HealthResponse| {
                h.status.clone()
            }));
        }
        BindingName::WildlifePositions => {
            tasks.spawn(watch(
                name,
                bindings.wildlife_positions(),
                store,
                |records: &Vec<WildlifeRecord>| format!("{} animals tracked", records.len()),
            ));
        }
        BindingName::Hotspots => {
            tasks.spawn(watch(name, bindings.hotspots(), store, |h: &HotspotsResponse| {
                format!("{} hotspots", h.hotspots.len())
            }));
        }
        BindingName::AgentStatus => {
            tasks.spawn(watch(name, bindings.agent_status(), store, |s: &AgentStatusResponse| {
                s.label().to_string()
            }));
        }
        BindingName::AnalyticsSummary => {
            tasks.spawn(watch(
                name,
                bindings.analytics_summary(),
                store,
                |a: &AnalyticsSummary| format!("{} threat events", a.threat_timeline.len()),
            ));
        }
        // Both wait on user input (a payload, a trigger) the monitor never gives.
        BindingName::MovementAnalysis | BindingName::Orchestration => {
            tracing::debug!("{} idle until requested", name.key());
        }
    }
}

pub async fn run(bindings: &Bindings, store: &ClientStore) -> Result<()> {
    let view = store.snapshot().active_view();
    tracing::info!(
        "Monitoring {} ({} mode, live tracking {})",
        view.title(),
        store.backend_mode().key(),
        if store.is_live() { "on" } else { "paused" }
    );

    let mut tasks = JoinSet::new();
    for name in BindingName::ROOT.iter().chain(view.bindings()) {
        mount(&mut tasks, bindings, store, *name);
    }

    tokio::signal::ctrl_c().await?;
    tasks.shutdown().await;

    let notifications = store.notifications();
    if !notifications.is_empty() {
        tracing::info!("{} notifications raised:", notifications.len());
        for n in &notifications {
            tracing::info!("  [{}] {}: {}", n.created_at.format("%H:%M:%S"), n.title, n.message);
        }
    }
    Ok(())
}
