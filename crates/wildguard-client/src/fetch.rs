//! Shared fetch primitive used by every binding.
//!
//! Resolves a path against the store's API base URL, issues exactly one
//! request, and turns the outcome into a JSON value or a [`FetchError`].
//! There are no retries here; a binding's polling interval is the only
//! retry mechanism.

use std::sync::Arc;

use serde_json::Value;
use url::Url;
use wildguard_core::{ClientState, DEFAULT_API_BASE_URL};

use crate::error::{FetchError, FetchResult};
use crate::transport::{HttpMethod, HttpRequest, Transport};

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Resolve `path` against `base`. Paths that already carry a scheme pass
/// through untouched; a blank base means [`DEFAULT_API_BASE_URL`].
pub fn resolve_url(base: &str, path: &str) -> FetchResult<String> {
    if path.contains("://") && Url::parse(path).is_ok() {
        return Ok(path.to_string());
    }

    let base = match base.trim() {
        "" => DEFAULT_API_BASE_URL,
        b => b,
    };
    let joined = match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base.trim_end_matches('/'), path),
        (false, false) if !path.is_empty() => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    };

    match Url::parse(&joined) {
        Ok(_) => Ok(joined),
        Err(e) => Err(FetchError::InvalidUrl(format!("{joined}: {e}"))),
    }
}

#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Issue `request` against the state's effective base URL.
    pub async fn fetch(&self, state: &ClientState, request: &ApiRequest) -> FetchResult<Value> {
        self.fetch_from(state.effective_api_base_url(), request).await
    }

    pub async fn fetch_from(&self, base_url: &str, request: &ApiRequest) -> FetchResult<Value> {
        let url = resolve_url(base_url, &request.path)?;
        let body = match &request.body {
            Some(value) => Some(serde_json::to_vec(value)?),
            None => None,
        };

        tracing::debug!("{} {}", request.method, url);
        let resp = self
            .transport
            .execute(HttpRequest {
                method: request.method,
                url: url.clone(),
                body,
            })
            .await?;

        if !resp.is_success() {
            return Err(FetchError::Status {
                status: resp.status,
                url,
            });
        }
        if resp.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&resp.body)?)
    }
}
