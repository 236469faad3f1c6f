//! End-to-end binding behaviour against a scripted transport.
//! Polling scenarios run on a paused clock, so `sleep` advances virtual time.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wildguard_client::mock::MockTransport;
use wildguard_client::{Bindings, Fetcher, HttpMethod, Registry};
use wildguard_core::{BackendMode, ClientStore, View};

const BASE: &str = "http://localhost:5000";

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

fn setup() -> (Arc<MockTransport>, ClientStore, Bindings) {
    let mock = Arc::new(MockTransport::new());
    let store = ClientStore::default();
    let registry = Registry::new(store.clone(), Fetcher::new(mock.clone()));
    (mock, store, Bindings::new(registry))
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn sample_positions() -> serde_json::Value {
    json!([
        {"rhino_id": "RH001", "latitude": -25.7461, "longitude": 28.1881, "speed_kmh": 4.2},
        {"rhino_id": "RH002", "latitude": -25.7512, "longitude": 28.1923, "speed_kmh": 0.1}
    ])
}

#[tokio::test]
async fn concurrent_bindings_share_one_request() {
    let (mock, _store, bindings) = setup();
    mock.set_latency(Duration::from_millis(50));
    mock.respond(HttpMethod::Get, &url("/api/data"), 200, sample_positions());

    let mut map_positions = bindings.wildlife_positions();
    let mut dashboard_positions = bindings.wildlife_positions();

    let a = map_positions.settled().await;
    let b = dashboard_positions.settled().await;

    assert_eq!(mock.count_for(HttpMethod::Get, &url("/api/data")), 1);
    assert_eq!(a.value.as_ref().map(Vec::len), Some(2));
    assert_eq!(a.value, b.value);
}

#[tokio::test]
async fn offline_mode_silences_agent_status() {
    let (mock, store, bindings) = setup();
    store.set_backend_mode(BackendMode::Offline);

    let agents = bindings.agent_status();
    settle().await;

    assert!(!agents.is_enabled());
    let state = agents.state();
    assert!(state.value.is_none());
    assert!(!state.is_loading);
    assert_eq!(mock.count_for(HttpMethod::Get, &url("/api/agents/status")), 0);
}

#[tokio::test]
async fn switching_back_online_fetches_agent_status() {
    let (mock, store, bindings) = setup();
    mock.respond(
        HttpMethod::Get,
        &url("/api/agents/status"),
        200,
        json!({"status": "operational", "agent_type": "simulated", "agents": ["movement", "vision"]}),
    );
    store.set_backend_mode(BackendMode::Offline);

    let mut agents = bindings.agent_status();
    settle().await;
    assert_eq!(mock.request_count(), 0);

    store.set_backend_mode(BackendMode::Simulated);
    settle().await;
    let state = agents.settled().await;

    assert_eq!(mock.count_for(HttpMethod::Get, &url("/api/agents/status")), 1);
    assert!(state.value.is_some_and(|s| s.is_operational()));
}

#[tokio::test(start_paused = true)]
async fn pausing_live_stops_position_polling() {
    let (mock, store, bindings) = setup();
    mock.respond(HttpMethod::Get, &url("/api/data"), 200, sample_positions());
    let data_url = url("/api/data");

    let _positions = bindings.wildlife_positions();
    settle().await;
    assert_eq!(mock.count_for(HttpMethod::Get, &data_url), 1);

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(mock.count_for(HttpMethod::Get, &data_url), 2);

    store.set_is_live(false);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(mock.count_for(HttpMethod::Get, &data_url), 2);

    store.set_is_live(true);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(mock.count_for(HttpMethod::Get, &data_url), 3);
}

#[tokio::test(start_paused = true)]
async fn pausing_live_leaves_other_bindings_polling() {
    let (mock, store, bindings) = setup();
    mock.respond(HttpMethod::Get, &url("/api/health"), 200, json!({"status": "ok"}));
    store.set_is_live(false);

    let _health = bindings.health_check();
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(mock.count_for(HttpMethod::Get, &url("/api/health")), 3);
}

#[tokio::test]
async fn failed_refresh_keeps_last_value() {
    let (mock, _store, bindings) = setup();
    let health_url = url("/api/health");
    mock.respond(HttpMethod::Get, &health_url, 200, json!({"status": "WildGuard AI Backend Running"}));
    mock.fail(
        HttpMethod::Get,
        &health_url,
        wildguard_client::FetchError::Network("connection refused".into()),
    );

    let mut health = bindings.health_check();
    let first = health.settled().await;
    assert!(first.error.is_none());

    assert!(health.refresh());
    let second = health.settled().await;

    assert!(second.is_stale());
    assert_eq!(second.value, first.value);
    assert!(matches!(
        second.error,
        Some(wildguard_client::FetchError::Network(_))
    ));
}

#[tokio::test]
async fn movement_payload_change_rekeys() {
    let (mock, _store, bindings) = setup();
    let movement_url = url("/api/movement");
    mock.respond(
        HttpMethod::Post,
        &movement_url,
        200,
        json!({"movement_alerts": [], "total_alerts": 0}),
    );

    let mut analysis = bindings.movement_analysis(None);
    settle().await;
    assert!(!analysis.is_enabled());
    assert_eq!(mock.request_count(), 0);

    let first = json!({"data": [{"rhino_id": "RH001", "latitude": -25.7, "longitude": 28.1}]});
    analysis.set_payload(Some(first.clone()));
    analysis.settled().await;

    let second = json!({"data": [{"rhino_id": "RH002", "latitude": -25.8, "longitude": 28.2}]});
    analysis.set_payload(Some(second.clone()));
    let state = analysis.settled().await;
    assert_eq!(state.value.map(|r| r.total_alerts), Some(0));

    let bodies: Vec<serde_json::Value> = mock
        .requests()
        .iter()
        .filter_map(|r| r.body.as_deref())
        .map(|b| serde_json::from_slice(b).unwrap())
        .collect();
    assert_eq!(bodies, vec![first, second.clone()]);

    // Only the current payload's resource is still held.
    let keys = bindings.registry().active_keys();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].params, second.to_string());
}

#[tokio::test]
async fn orchestration_waits_for_trigger() {
    let (mock, _store, bindings) = setup();
    let orchestrate_url = url("/api/orchestrate");
    mock.respond(
        HttpMethod::Post,
        &orchestrate_url,
        200,
        json!({
            "movement_alerts": [],
            "risk_assessment": {"risk_score": 72, "threat_level": "HIGH", "recommendations": []},
            "pipeline_status": "complete"
        }),
    );

    let mut orchestration = bindings.orchestration(false);
    settle().await;
    assert!(orchestration.state().value.is_none());
    assert_eq!(mock.count_for(HttpMethod::Post, &orchestrate_url), 0);

    orchestration.trigger();
    let state = orchestration.settled().await;
    assert_eq!(mock.count_for(HttpMethod::Post, &orchestrate_url), 1);
    assert_eq!(mock.requests()[0].body.as_deref(), Some(&b"{}"[..]));
    assert_eq!(
        state.value.and_then(|r| r.risk_assessment).map(|r| r.risk_score),
        Some(72)
    );

    orchestration.reset();
    assert!(orchestration.state().value.is_none());
}

#[tokio::test(start_paused = true)]
async fn health_survives_view_switches() {
    let (mock, store, bindings) = setup();
    mock.respond(HttpMethod::Get, &url("/api/health"), 200, json!({"status": "ok"}));

    let _health = bindings.health_check();

    let dashboard = (
        bindings.wildlife_positions(),
        bindings.agent_status(),
        bindings.orchestration(false),
    );
    tokio::time::sleep(Duration::from_secs(5)).await;

    store.set_selected_view(View::Map.key());
    drop(dashboard);
    let _map = (bindings.wildlife_positions(), bindings.hotspots());

    store.set_selected_view("no-such-view");
    tokio::time::sleep(Duration::from_secs(56)).await;

    assert_eq!(mock.count_for(HttpMethod::Get, &url("/api/health")), 3);
    assert_eq!(mock.count_for(HttpMethod::Get, &url("/api/hotspots")), 1);
    assert_eq!(store.selected_view(), "no-such-view");
}

#[tokio::test]
async fn blank_base_url_targets_default_backend() {
    let (mock, store, bindings) = setup();
    store.set_api_base_url("");
    mock.respond(HttpMethod::Get, &url("/api/health"), 200, json!({"status": "ok"}));

    let mut health = bindings.health_check();
    let state = health.settled().await;

    assert!(state.value.is_some());
    assert_eq!(mock.requests()[0].url, "http://localhost:5000/api/health");
}

#[tokio::test]
async fn custom_base_url_is_used() {
    let (mock, store, bindings) = setup();
    store.set_api_base_url("http://ranger-station:8080/");

    let mut hotspots = bindings.hotspots();
    let state = hotspots.settled().await;

    assert_eq!(mock.requests()[0].url, "http://ranger-station:8080/api/hotspots");
    assert_eq!(state.error.and_then(|e| e.status()), Some(404));
}
