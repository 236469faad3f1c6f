//! The seven named remote resource bindings.
//!
//! | Binding            | Request                    | Refresh | Enabled when                  |
//! |--------------------|----------------------------|---------|-------------------------------|
//! | health_check       | GET  /api/health           | 30s     | always                        |
//! | wildlife_positions | GET  /api/data             | 10s     | always (paused when not live) |
//! | hotspots           | GET  /api/hotspots         | once    | always                        |
//! | agent_status       | GET  /api/agents/status    | 15s     | backend not offline           |
//! | movement_analysis  | POST /api/movement         | 20s     | payload set, not offline      |
//! | orchestration      | POST /api/orchestrate {}   | once    | triggered, not offline        |
//! | analytics_summary  | GET  /api/analytics        | 30s     | always                        |

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use wildguard_core::{BindingName, ClientState};

use crate::api::{
    AgentStatusResponse, AnalyticsSummary, HealthResponse, HotspotsResponse, MovementReport,
    OrchestrationReport, WildlifeRecord,
};
use crate::fetch::ApiRequest;
use crate::registry::{shape_of, BindingSpec, Registry, ResourceKey, ResourceState, SubscriptionHandle};

pub const HEALTH_INTERVAL: Duration = Duration::from_secs(30);
pub const WILDLIFE_INTERVAL: Duration = Duration::from_secs(10);
pub const AGENT_STATUS_INTERVAL: Duration = Duration::from_secs(15);
pub const MOVEMENT_INTERVAL: Duration = Duration::from_secs(20);
pub const ANALYTICS_INTERVAL: Duration = Duration::from_secs(30);

fn always(_: &ClientState) -> bool {
    true
}

fn agents_enabled(state: &ClientState) -> bool {
    state.agents_enabled()
}

fn spec<T: DeserializeOwned>(
    name: BindingName,
    request: ApiRequest,
    refresh_interval: Duration,
    enabled: fn(&ClientState) -> bool,
) -> BindingSpec {
    BindingSpec {
        name,
        request,
        refresh_interval,
        live_gated: false,
        enabled: Arc::new(enabled),
        check: shape_of::<T>,
    }
}

// ── Specs ───────────────────────────────────────────────────────────────

pub fn health_check_spec() -> BindingSpec {
    spec::<HealthResponse>(
        BindingName::HealthCheck,
        ApiRequest::get("/api/health"),
        HEALTH_INTERVAL,
        always,
    )
}

pub fn wildlife_positions_spec() -> BindingSpec {
    BindingSpec {
        live_gated: true,
        ..spec::<Vec<WildlifeRecord>>(
            BindingName::WildlifePositions,
            ApiRequest::get("/api/data"),
            WILDLIFE_INTERVAL,
            always,
        )
    }
}

pub fn hotspots_spec() -> BindingSpec {
    spec::<HotspotsResponse>(
        BindingName::Hotspots,
        ApiRequest::get("/api/hotspots"),
        Duration::ZERO,
        always,
    )
}

pub fn agent_status_spec() -> BindingSpec {
    spec::<AgentStatusResponse>(
        BindingName::AgentStatus,
        ApiRequest::get("/api/agents/status"),
        AGENT_STATUS_INTERVAL,
        agents_enabled,
    )
}

pub fn movement_analysis_spec(payload: Value) -> BindingSpec {
    spec::<MovementReport>(
        BindingName::MovementAnalysis,
        ApiRequest::post("/api/movement", payload),
        MOVEMENT_INTERVAL,
        agents_enabled,
    )
}

pub fn orchestration_spec() -> BindingSpec {
    spec::<OrchestrationReport>(
        BindingName::Orchestration,
        ApiRequest::post("/api/orchestrate", json!({})),
        Duration::ZERO,
        agents_enabled,
    )
}

pub fn analytics_summary_spec() -> BindingSpec {
    spec::<AnalyticsSummary>(
        BindingName::AnalyticsSummary,
        ApiRequest::get("/api/analytics"),
        ANALYTICS_INTERVAL,
        always,
    )
}

// ── Typed handles ───────────────────────────────────────────────────────

/// A typed subscription. Dropping it unmounts the binding.
pub struct Binding<T> {
    handle: SubscriptionHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Binding<T> {
    fn mount(registry: &Registry, spec: BindingSpec) -> Self {
        Self {
            handle: registry.subscribe(spec),
            _marker: PhantomData,
        }
    }

    pub fn state(&self) -> ResourceState<T> {
        self.handle.state().decode()
    }

    pub fn value(&self) -> Option<T> {
        self.state().value
    }

    pub fn key(&self) -> &ResourceKey {
        self.handle.key()
    }

    pub fn is_enabled(&self) -> bool {
        self.handle.is_enabled()
    }

    /// Force a revalidation; joins one already in flight.
    pub fn refresh(&self) -> bool {
        self.handle.refresh()
    }

    pub async fn changed(&mut self) -> bool {
        self.handle.changed().await
    }

    pub async fn settled(&mut self) -> ResourceState<T> {
        self.handle.settled().await.decode()
    }
}

/// Movement analysis over a caller-supplied payload. With no payload the
/// binding is disabled and holds no subscription.
pub struct MovementAnalysis {
    registry: Registry,
    payload: Option<Value>,
    binding: Option<Binding<MovementReport>>,
}

impl MovementAnalysis {
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Swap the payload. A different payload is a different resource, so
    /// the old subscription (and, if unshared, its cache) is released.
    pub fn set_payload(&mut self, payload: Option<Value>) {
        if payload == self.payload {
            return;
        }
        self.binding = None;
        if let Some(payload) = &payload {
            tracing::debug!("movement analysis payload changed");
            let spec = movement_analysis_spec(payload.clone());
            self.binding = Some(Binding::mount(&self.registry, spec));
        }
        self.payload = payload;
    }

    pub fn state(&self) -> ResourceState<MovementReport> {
        self.binding.as_ref().map(Binding::state).unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.binding.as_ref().is_some_and(Binding::is_enabled)
    }

    pub fn refresh(&self) -> bool {
        self.binding.as_ref().is_some_and(Binding::refresh)
    }

    pub async fn settled(&mut self) -> ResourceState<MovementReport> {
        match self.binding.as_mut() {
            Some(binding) => binding.settled().await,
            None => ResourceState::default(),
        }
    }
}

/// The full agent pipeline, run once per trigger.
pub struct Orchestration {
    registry: Registry,
    binding: Option<Binding<OrchestrationReport>>,
}

impl Orchestration {
    pub fn is_triggered(&self) -> bool {
        self.binding.is_some()
    }

    /// Arm the binding. A no-op when already triggered.
    pub fn trigger(&mut self) {
        if self.binding.is_none() {
            tracing::debug!("orchestration triggered");
            self.binding = Some(Binding::mount(&self.registry, orchestration_spec()));
        }
    }

    pub fn reset(&mut self) {
        self.binding = None;
    }

    pub fn state(&self) -> ResourceState<OrchestrationReport> {
        self.binding.as_ref().map(Binding::state).unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.binding.as_ref().is_some_and(Binding::is_enabled)
    }

    /// Re-run the pipeline; only meaningful once triggered.
    pub fn refresh(&self) -> bool {
        self.binding.as_ref().is_some_and(Binding::refresh)
    }

    pub async fn settled(&mut self) -> ResourceState<OrchestrationReport> {
        match self.binding.as_mut() {
            Some(binding) => binding.settled().await,
            None => ResourceState::default(),
        }
    }
}

/// Factory for every named binding over one registry.
#[derive(Clone)]
pub struct Bindings {
    registry: Registry,
}

impl Bindings {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn health_check(&self) -> Binding<HealthResponse> {
        Binding::mount(&self.registry, health_check_spec())
    }

    pub fn wildlife_positions(&self) -> Binding<Vec<WildlifeRecord>> {
        Binding::mount(&self.registry, wildlife_positions_spec())
    }

    pub fn hotspots(&self) -> Binding<HotspotsResponse> {
        Binding::mount(&self.registry, hotspots_spec())
    }

    pub fn agent_status(&self) -> Binding<AgentStatusResponse> {
        Binding::mount(&self.registry, agent_status_spec())
    }

    pub fn movement_analysis(&self, payload: Option<Value>) -> MovementAnalysis {
        let mut analysis = MovementAnalysis {
            registry: self.registry.clone(),
            payload: None,
            binding: None,
        };
        analysis.set_payload(payload);
        analysis
    }

    pub fn orchestration(&self, trigger: bool) -> Orchestration {
        let mut orchestration = Orchestration {
            registry: self.registry.clone(),
            binding: None,
        };
        if trigger {
            orchestration.trigger();
        }
        orchestration
    }

    pub fn analytics_summary(&self) -> Binding<AnalyticsSummary> {
        Binding::mount(&self.registry, analytics_summary_spec())
    }
}
