//! Subscription registry: keyed, reference-counted, de-duplicated polling.
//!
//! Every distinct [`ResourceKey`] (method + path + serialized body) owns one
//! cache entry, one poller task and at most one in-flight request. Any
//! number of [`SubscriptionHandle`]s may share an entry; the entry and its
//! poller go away with the last handle.
//!
//! ```text
//!  subscribe ──► Entry{key} ──► poller task ──tick / store change──► revalidate
//!                   │                                                   │
//!                   │◄────────── apply(result) ◄── spawned fetch ◄──────┘
//!                   ▼
//!             watch::Sender<ResourceState>  ──►  every handle's receiver
//! ```
//!
//! Requests run in their own task, so dropping the last handle stops the
//! polling but never cancels a request already sent. A response that
//! arrives for a removed (or since recreated) entry is discarded.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use wildguard_core::{BindingName, ClientState, ClientStore};

use crate::error::FetchError;
use crate::fetch::{ApiRequest, Fetcher};

/// Predicate deciding, from the current client state, whether a binding
/// may issue requests.
pub type EnabledFn = Arc<dyn Fn(&ClientState) -> bool + Send + Sync>;

/// Validates that a parsed body has the shape the binding expects.
pub type ShapeCheck = fn(&Value) -> Result<(), String>;

/// `ShapeCheck` for any deserializable `T`.
pub fn shape_of<T: DeserializeOwned>(value: &Value) -> Result<(), String> {
    T::deserialize(value).map(|_| ()).map_err(|e| e.to_string())
}

// ── Keys and state ──────────────────────────────────────────────────────

/// Identity of a cached resource: logical endpoint plus serialized params.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub endpoint: String,
    pub params: String,
}

impl ResourceKey {
    pub fn for_request(request: &ApiRequest) -> Self {
        // serde_json maps are ordered, so equal bodies serialize identically.
        let params = request
            .body
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();
        Self {
            endpoint: format!("{} {}", request.method, request.path),
            params,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.endpoint)
        } else {
            write!(f, "{} {}", self.endpoint, self.params)
        }
    }
}

/// Latest known state of a resource. `value` survives failed refreshes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub value: Option<T>,
    pub is_loading: bool,
    pub error: Option<FetchError>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            value: None,
            is_loading: false,
            error: None,
            updated_at: None,
        }
    }
}

impl<T> ResourceState<T> {
    /// A value is on hand but the latest refresh failed.
    pub fn is_stale(&self) -> bool {
        self.value.is_some() && self.error.is_some()
    }

    /// Nothing to show and the latest attempt failed.
    pub fn is_fallback_needed(&self) -> bool {
        self.value.is_none() && self.error.is_some()
    }
}

impl ResourceState<Value> {
    /// Decode the cached JSON into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> ResourceState<T> {
        let mut error = self.error.clone();
        let value = match &self.value {
            Some(v) => match T::deserialize(v) {
                Ok(t) => Some(t),
                Err(e) => {
                    error = Some(FetchError::Decode(e.to_string()));
                    None
                }
            },
            None => None,
        };
        ResourceState {
            value,
            is_loading: self.is_loading,
            error,
            updated_at: self.updated_at,
        }
    }
}

// ── Binding spec ────────────────────────────────────────────────────────

/// Everything the registry needs to run one binding.
#[derive(Clone)]
pub struct BindingSpec {
    pub name: BindingName,
    pub request: ApiRequest,
    /// Zero means fetch once, with no automatic refresh.
    pub refresh_interval: Duration,
    /// Interval refreshes are skipped while `is_live` is false.
    pub live_gated: bool,
    pub enabled: EnabledFn,
    pub check: ShapeCheck,
}

impl BindingSpec {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::for_request(&self.request)
    }

    pub fn is_enabled(&self, state: &ClientState) -> bool {
        (self.enabled)(state)
    }
}

impl fmt::Debug for BindingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingSpec")
            .field("name", &self.name)
            .field("request", &self.request)
            .field("refresh_interval", &self.refresh_interval)
            .field("live_gated", &self.live_gated)
            .finish_non_exhaustive()
    }
}

// ── Registry ────────────────────────────────────────────────────────────

struct Entry {
    name: BindingName,
    generation: u64,
    request: ApiRequest,
    check: ShapeCheck,
    live_gated: bool,
    state_tx: watch::Sender<ResourceState<Value>>,
    subscribers: HashMap<u64, EnabledFn>,
    in_flight: bool,
    poller: Option<JoinHandle<()>>,
}

impl Entry {
    fn any_enabled(&self, state: &ClientState) -> bool {
        self.subscribers.values().any(|enabled| enabled(state))
    }
}

struct Shared {
    store: ClientStore,
    fetcher: Fetcher,
    entries: Mutex<HashMap<ResourceKey, Entry>>,
    next_id: AtomicU64,
}

/// Shared registry of live subscriptions. Cheap to clone.
#[derive(Clone)]
pub struct Registry {
    shared: Arc<Shared>,
}

impl Registry {
    pub fn new(store: ClientStore, fetcher: Fetcher) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                fetcher,
                entries: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn store(&self) -> &ClientStore {
        &self.shared.store
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.shared.fetcher
    }

    /// Subscribe to a binding. Must be called inside a Tokio runtime.
    ///
    /// If the binding is enabled, a revalidation is requested straight
    /// away; it joins any request for the same key already in flight.
    pub fn subscribe(&self, spec: BindingSpec) -> SubscriptionHandle {
        let key = spec.key();
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let state = self.shared.store.snapshot();
        let enabled_now = spec.is_enabled(&state);

        let mut rx = {
            let mut entries = self.shared.lock();
            let entry = entries.entry(key.clone()).or_insert_with(|| {
                tracing::debug!("new resource entry {key}");
                let (state_tx, _) = watch::channel(ResourceState::default());
                let generation = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
                Entry {
                    name: spec.name,
                    generation,
                    request: spec.request.clone(),
                    check: spec.check,
                    live_gated: spec.live_gated,
                    state_tx,
                    subscribers: HashMap::new(),
                    in_flight: false,
                    poller: None,
                }
            });
            entry.subscribers.insert(id, Arc::clone(&spec.enabled));
            if entry.poller.is_none() {
                entry.poller = Some(tokio::spawn(poll(
                    Arc::downgrade(&self.shared),
                    key.clone(),
                    spec.refresh_interval,
                    self.shared.store.subscribe(),
                    enabled_now,
                )));
            }
            entry.state_tx.subscribe()
        };

        if enabled_now {
            self.shared.revalidate(&key);
        }
        let _ = rx.borrow_and_update();

        SubscriptionHandle {
            registry: self.clone(),
            key,
            id,
            enabled: spec.enabled,
            rx,
        }
    }

    /// Explicit teardown; equivalent to dropping the handle.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        drop(handle);
    }

    /// Request a refresh of `key`. Returns false when the key is unknown or
    /// a request for it is already in flight.
    pub fn revalidate(&self, key: &ResourceKey) -> bool {
        self.shared.revalidate(key)
    }

    /// Keys that currently have at least one subscriber.
    pub fn active_keys(&self) -> Vec<ResourceKey> {
        self.shared.lock().keys().cloned().collect()
    }

    pub fn subscriber_count(&self, key: &ResourceKey) -> usize {
        self.shared
            .lock()
            .get(key)
            .map_or(0, |e| e.subscribers.len())
    }

    fn release(&self, key: &ResourceKey, id: u64) {
        let mut entries = self.shared.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.subscribers.remove(&id);
        if entry.subscribers.is_empty() {
            if let Some(entry) = entries.remove(key) {
                tracing::debug!("last subscriber left {key}, stopping poller");
                if let Some(poller) = entry.poller {
                    poller.abort();
                }
            }
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn revalidate(self: &Arc<Self>, key: &ResourceKey) -> bool {
        let (request, check, generation, name) = {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(key) else {
                return false;
            };
            if entry.in_flight {
                tracing::trace!("{key}: joining in-flight request");
                return false;
            }
            entry.in_flight = true;
            entry.state_tx.send_modify(|s| s.is_loading = true);
            (entry.request.clone(), entry.check, entry.generation, entry.name)
        };

        let shared = Arc::clone(self);
        let key = key.clone();
        tokio::spawn(async move {
            let state = shared.store.snapshot();
            let result = shared
                .fetcher
                .fetch(&state, &request)
                .await
                .and_then(|value| check(&value).map(|_| value).map_err(FetchError::Decode));
            if let Err(e) = &result {
                tracing::warn!("{} fetch failed: {e}", name.key());
            }
            shared.apply(&key, generation, result);
        });
        true
    }

    fn apply(&self, key: &ResourceKey, generation: u64, result: Result<Value, FetchError>) {
        let mut entries = self.lock();
        let Some(entry) = entries
            .get_mut(key)
            .filter(|entry| entry.generation == generation)
        else {
            tracing::debug!("{key}: discarding response for an unsubscribed resource");
            return;
        };

        entry.in_flight = false;
        entry.state_tx.send_modify(|s| {
            s.is_loading = false;
            match result {
                Ok(value) => {
                    s.value = Some(value);
                    s.error = None;
                    s.updated_at = Some(Utc::now());
                }
                Err(e) => s.error = Some(e),
            }
        });
    }

    /// Whether a timer tick should refresh `key` under `state`.
    fn tick_due(&self, key: &ResourceKey, state: &ClientState) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|e| e.any_enabled(state) && (!e.live_gated || state.is_live))
    }

    fn any_enabled(&self, key: &ResourceKey, state: &ClientState) -> bool {
        self.lock().get(key).is_some_and(|e| e.any_enabled(state))
    }
}

/// Poller for one key: refreshes on every interval tick and whenever the
/// store flips the binding from disabled to enabled.
async fn poll(
    shared: Weak<Shared>,
    key: ResourceKey,
    interval: Duration,
    mut store_rx: watch::Receiver<ClientState>,
    mut was_enabled: bool,
) {
    let mut ticker = (!interval.is_zero()).then(|| {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    loop {
        tokio::select! {
            _ = next_tick(&mut ticker) => {
                let Some(shared) = shared.upgrade() else { break };
                let state = store_rx.borrow().clone();
                if shared.tick_due(&key, &state) {
                    shared.revalidate(&key);
                } else {
                    tracing::trace!("{key}: tick skipped");
                }
            }
            changed = store_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(shared) = shared.upgrade() else { break };
                let state = store_rx.borrow_and_update().clone();
                let enabled = shared.any_enabled(&key, &state);
                if enabled && !was_enabled {
                    tracing::debug!("{key}: enabled, revalidating");
                    shared.revalidate(&key);
                }
                was_enabled = enabled;
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ── Handles ─────────────────────────────────────────────────────────────

/// One subscriber's view of a shared resource. Dropping it unsubscribes.
pub struct SubscriptionHandle {
    registry: Registry,
    key: ResourceKey,
    id: u64,
    enabled: EnabledFn,
    rx: watch::Receiver<ResourceState<Value>>,
}

impl SubscriptionHandle {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        (self.enabled)(&self.registry.store().snapshot())
    }

    /// Current state. A disabled binding always reports an empty, idle state.
    pub fn state(&self) -> ResourceState<Value> {
        if !self.is_enabled() {
            return ResourceState::default();
        }
        self.rx.borrow().clone()
    }

    /// Force a refresh if the binding is enabled.
    pub fn refresh(&self) -> bool {
        self.is_enabled() && self.registry.revalidate(&self.key)
    }

    /// Wait for the next broadcast. Returns false once the entry is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Wait until no request is outstanding, then return the state.
    pub async fn settled(&mut self) -> ResourceState<Value> {
        loop {
            let state = self.state();
            if !state.is_loading || !self.changed().await {
                return self.state();
            }
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.registry.release(&self.key, self.id);
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::transport::HttpMethod;
    use serde_json::json;
    use wildguard_core::BackendMode;

    const HEALTH_URL: &str = "http://localhost:5000/api/health";

    fn setup() -> (Arc<MockTransport>, Registry) {
        let mock = Arc::new(MockTransport::new());
        let registry = Registry::new(ClientStore::default(), Fetcher::new(mock.clone()));
        (mock, registry)
    }

    fn health_spec(interval: Duration) -> BindingSpec {
        BindingSpec {
            name: BindingName::HealthCheck,
            request: ApiRequest::get("/api/health"),
            refresh_interval: interval,
            live_gated: false,
            enabled: Arc::new(|_| true),
            check: shape_of::<Value>,
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn keys_include_serialized_body() {
        let a = ResourceKey::for_request(&ApiRequest::post("/api/movement", json!({"b": 1, "a": 2})));
        let b = ResourceKey::for_request(&ApiRequest::post("/api/movement", json!({"a": 2, "b": 1})));
        let c = ResourceKey::for_request(&ApiRequest::post("/api/movement", json!({"a": 3})));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            ResourceKey::for_request(&ApiRequest::get("/api/health")).to_string(),
            "GET /api/health"
        );
    }

    #[test]
    fn decode_reports_shape_mismatch() {
        let state = ResourceState {
            value: Some(json!({"unexpected": true})),
            ..Default::default()
        };
        let decoded = state.decode::<crate::api::HealthResponse>();
        assert!(decoded.value.is_none());
        assert!(matches!(decoded.error, Some(FetchError::Decode(_))));
    }

    #[test]
    fn stale_and_fallback_flags() {
        let mut state: ResourceState<u32> = ResourceState::default();
        assert!(!state.is_stale() && !state.is_fallback_needed());
        state.error = Some(FetchError::Network("down".into()));
        assert!(state.is_fallback_needed());
        state.value = Some(1);
        assert!(state.is_stale());
    }

    #[tokio::test]
    async fn subscribe_fetches_once_and_caches() {
        let (mock, registry) = setup();
        mock.respond(HttpMethod::Get, HEALTH_URL, 200, json!({"status": "ok"}));

        let mut handle = registry.subscribe(health_spec(Duration::ZERO));
        assert!(handle.state().is_loading);

        let state = handle.settled().await;
        assert_eq!(state.value, Some(json!({"status": "ok"})));
        assert!(!state.is_loading);
        assert!(state.updated_at.is_some());
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_subscribers_share_one_request() {
        let (mock, registry) = setup();
        mock.respond(HttpMethod::Get, HEALTH_URL, 200, json!({"status": "ok"}));

        let mut a = registry.subscribe(health_spec(Duration::ZERO));
        let b = registry.subscribe(health_spec(Duration::ZERO));
        assert_eq!(registry.subscriber_count(a.key()), 2);

        a.settled().await;
        settle().await;
        assert_eq!(mock.request_count(), 1);
        assert_eq!(a.state().value, b.state().value);
    }

    #[tokio::test]
    async fn failure_keeps_previous_value() {
        let (mock, registry) = setup();
        mock.respond(HttpMethod::Get, HEALTH_URL, 200, json!({"status": "ok"}));
        mock.respond(HttpMethod::Get, HEALTH_URL, 500, json!({"error": "Internal server error"}));

        let mut handle = registry.subscribe(health_spec(Duration::ZERO));
        handle.settled().await;

        assert!(handle.refresh());
        let state = handle.settled().await;
        assert_eq!(state.value, Some(json!({"status": "ok"})));
        assert_eq!(state.error.as_ref().and_then(FetchError::status), Some(500));
        assert!(state.is_stale());
    }

    #[tokio::test]
    async fn last_unsubscribe_removes_entry() {
        let (mock, registry) = setup();
        mock.respond(HttpMethod::Get, HEALTH_URL, 200, json!({"status": "ok"}));

        let a = registry.subscribe(health_spec(Duration::ZERO));
        let b = registry.subscribe(health_spec(Duration::ZERO));
        let key = a.key().clone();

        registry.unsubscribe(a);
        assert_eq!(registry.subscriber_count(&key), 1);
        drop(b);
        assert!(registry.active_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_after_unsubscribe_is_discarded() {
        let mock = Arc::new(MockTransport::new().with_latency(Duration::from_secs(2)));
        mock.respond(HttpMethod::Get, HEALTH_URL, 200, json!({"status": "ok"}));
        let registry = Registry::new(ClientStore::default(), Fetcher::new(mock.clone()));

        let handle = registry.subscribe(health_spec(Duration::ZERO));
        settle().await;
        assert_eq!(mock.request_count(), 1);
        drop(handle);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(registry.active_keys().is_empty());

        // A fresh subscription starts from an empty cache.
        let handle = registry.subscribe(health_spec(Duration::ZERO));
        assert!(handle.state().value.is_none());
        settle().await;
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_polls_until_unsubscribed() {
        let (mock, registry) = setup();
        mock.respond(HttpMethod::Get, HEALTH_URL, 200, json!({"status": "ok"}));

        let handle = registry.subscribe(health_spec(Duration::from_secs(30)));
        settle().await;
        assert_eq!(mock.request_count(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(mock.request_count(), 3);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_binding_keeps_polling() {
        let (mock, registry) = setup();
        mock.fail(HttpMethod::Get, HEALTH_URL, FetchError::Network("connection refused".into()));

        let handle = registry.subscribe(health_spec(Duration::from_secs(30)));
        tokio::time::sleep(Duration::from_secs(91)).await;

        assert_eq!(mock.request_count(), 4);
        assert!(handle.state().is_fallback_needed());
    }

    #[tokio::test]
    async fn shape_mismatch_is_decode_error() {
        let (mock, registry) = setup();
        mock.respond(HttpMethod::Get, HEALTH_URL, 200, json!([1, 2, 3]));

        let mut spec = health_spec(Duration::ZERO);
        spec.check = shape_of::<crate::api::HealthResponse>;
        let mut handle = registry.subscribe(spec);
        let state = handle.settled().await;

        assert!(matches!(state.error, Some(FetchError::Decode(_))));
        assert!(state.value.is_none());
    }

    #[tokio::test]
    async fn enabling_via_store_triggers_fetch() {
        let (mock, registry) = setup();
        let url = "http://localhost:5000/api/agents/status";
        mock.respond(HttpMethod::Get, url, 200, json!({"status": "operational"}));
        registry.store().set_backend_mode(BackendMode::Offline);

        let spec = BindingSpec {
            name: BindingName::AgentStatus,
            request: ApiRequest::get("/api/agents/status"),
            refresh_interval: Duration::ZERO,
            live_gated: false,
            enabled: Arc::new(|s: &ClientState| s.agents_enabled()),
            check: shape_of::<Value>,
        };
        let handle = registry.subscribe(spec);
        settle().await;
        assert_eq!(mock.request_count(), 0);
        assert_eq!(handle.state(), ResourceState::default());
        assert!(!handle.refresh());

        registry.store().set_backend_mode(BackendMode::Simulated);
        settle().await;
        assert_eq!(mock.count_for(HttpMethod::Get, url), 1);
        assert_eq!(handle.state().value, Some(json!({"status": "operational"})));
    }
}
