use std::path::Path;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use wildguard_client::api::MovementRequest;
use wildguard_client::summary::{AnalyticsView, DashboardMetrics, DataSource, Metric};
use wildguard_client::{Bindings, ResourceState};
use wildguard_core::{BindingName, View};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The value of a settled state, or its error.
fn require<T>(what: &str, state: ResourceState<T>) -> Result<T> {
    match (state.value, state.error) {
        (_, Some(e)) => Err(anyhow!("{what}: {e}")),
        (Some(value), None) => Ok(value),
        (None, None) => bail!("{what}: no data"),
    }
}

pub async fn health(bindings: &Bindings) -> Result<()> {
    let health = require("health check", bindings.health_check().settled().await)?;
    print_json(&health)
}

pub async fn positions(bindings: &Bindings) -> Result<()> {
    let records = require("wildlife positions", bindings.wildlife_positions().settled().await)?;
    for r in &records {
        let status = r.status.map(|s| format!("{s:?}").to_lowercase());
        println!(
            "{}\t{:.4}\t{:.4}\t{:.1} km/h\t{}",
            r.rhino_id,
            r.latitude,
            r.longitude,
            r.speed_kmh,
            status.as_deref().unwrap_or("-")
        );
    }
    println!("({} animals)", records.len());
    Ok(())
}

pub async fn hotspots(bindings: &Bindings) -> Result<()> {
    let response = require("hotspots", bindings.hotspots().settled().await)?;
    for h in &response.hotspots {
        println!(
            "{}\t{:.4}\t{:.4}\t{}",
            h.name.as_deref().or(h.id.as_deref()).unwrap_or("-"),
            h.latitude,
            h.longitude,
            h.risk_level.as_deref().unwrap_or("-")
        );
    }
    println!("({} hotspots)", response.hotspots.len());
    Ok(())
}

pub async fn agents(bindings: &Bindings) -> Result<()> {
    let mut binding = bindings.agent_status();
    if !binding.is_enabled() {
        println!("AI agents are disabled in offline mode");
        return Ok(());
    }
    let status = require("agent status", binding.settled().await)?;
    println!("{}", status.label());
    for agent in &status.agents {
        println!("  - {agent}");
    }
    if let Some(message) = &status.message {
        println!("{message}");
    }
    for step in &status.setup_instructions {
        println!("  {step}");
    }
    Ok(())
}

pub async fn movement(bindings: &Bindings) -> Result<()> {
    let data = require("wildlife positions", bindings.wildlife_positions().settled().await)?;
    let payload = serde_json::to_value(MovementRequest { data })?;

    let mut analysis = bindings.movement_analysis(Some(payload));
    if !analysis.is_enabled() {
        println!("Movement analysis is disabled in offline mode");
        return Ok(());
    }
    let report = require("movement analysis", analysis.settled().await)?;
    for alert in &report.movement_alerts {
        println!(
            "{}\t{}%\t{}",
            alert.rhino_id,
            alert.confidence_percent(),
            alert.reason_text()
        );
    }
    println!("({} alerts)", report.movement_alerts.len());
    Ok(())
}

pub async fn orchestrate(bindings: &Bindings) -> Result<()> {
    let mut orchestration = bindings.orchestration(true);
    if !orchestration.is_enabled() {
        println!("The agent pipeline is disabled in offline mode");
        return Ok(());
    }
    let report = require("orchestration", orchestration.settled().await)?;
    print_json(&report)
}

pub async fn analytics(bindings: &Bindings, export: Option<&Path>) -> Result<()> {
    let state = bindings.analytics_summary().settled().await;
    let view = AnalyticsView::from_state(&state);
    if let Some(e) = &view.error {
        tracing::warn!("analytics unavailable, showing illustrative data: {e}");
    }

    let document = view.export(chrono::Utc::now());
    match export {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
            println!("Exported analytics to {}", path.display());
            Ok(())
        }
        None => print_json(&document),
    }
}

fn metric_line<T: std::fmt::Display>(title: &str, metric: &Metric<T>) {
    let tag = match metric.source {
        DataSource::Live => "",
        DataSource::Fallback => "\t(illustrative)",
    };
    println!("{title}\t{}{tag}", metric.value);
}

pub async fn dashboard(bindings: &Bindings) -> Result<()> {
    let (mut wildlife, mut agents) = (bindings.wildlife_positions(), bindings.agent_status());
    let orchestration = bindings.orchestration(false);

    let metrics = DashboardMetrics::derive(
        &wildlife.settled().await,
        &agents.settled().await,
        &orchestration.state(),
    );
    metric_line("Active Alerts", &metrics.active_alerts);
    metric_line("Species Detected", &metrics.species_detected);
    metric_line("Active Cameras", &metrics.active_cameras);
    metric_line("AI Agents", &metrics.agents_active);
    metric_line("Threats Identified", &metrics.threats_identified);
    metric_line("Risk Score", &metrics.risk_score);
    println!("Threat Level\t{}", metrics.risk_level);
    Ok(())
}

pub fn views() {
    for view in View::ALL {
        let mounted: Vec<&str> = BindingName::ROOT
            .iter()
            .chain(view.bindings())
            .map(BindingName::key)
            .collect();
        println!("{}\t{}\t{}", view.key(), view.title(), mounted.join(", "));
    }
    println!("({} views)", View::ALL.len());
}
