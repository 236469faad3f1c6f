//! Scripted in-memory transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};

type Scripted = Result<HttpResponse, FetchError>;

/// Replays scripted responses per `(method, url)` and records every
/// request it receives.
///
/// Responses queue up in the order they are scripted; the last one keeps
/// being replayed once the queue is down to it. Unscripted URLs get a 404.
pub struct MockTransport {
    responses: Mutex<HashMap<(HttpMethod, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Mutex<Duration>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    /// Every response is delayed by `latency` (virtual time under a paused clock).
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    fn push(&self, method: HttpMethod, url: &str, scripted: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(scripted);
    }

    pub fn respond(&self, method: HttpMethod, url: &str, status: u16, body: Value) {
        let body = serde_json::to_vec(&body).unwrap();
        self.respond_raw(method, url, status, body);
    }

    pub fn respond_raw(&self, method: HttpMethod, url: &str, status: u16, body: Vec<u8>) {
        self.push(method, url, Ok(HttpResponse { status, body }));
    }

    pub fn fail(&self, method: HttpMethod, url: &str, error: FetchError) {
        self.push(method, url, Err(error));
    }

    /// Drop all scripted responses for `(method, url)`.
    pub fn clear(&self, method: HttpMethod, url: &str) {
        self.responses
            .lock()
            .unwrap()
            .remove(&(method, url.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn count_for(&self, method: HttpMethod, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    fn next_response(&self, method: HttpMethod, url: &str) -> Scripted {
        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(&(method, url.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(HttpResponse {
                status: 404,
                body: br#"{"error": "Endpoint not found"}"#.to_vec(),
            }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let (method, url) = (request.method, request.url.clone());
        self.requests.lock().unwrap().push(request);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.next_response(method, &url)
    }
}
