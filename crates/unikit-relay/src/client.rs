//! JSON-RPC 2.0 HTTP client for the pairing relay.
//!
//! Every method is a POST to `{url}/rpc`. Auth and project headers are baked
//! into the underlying `reqwest::Client` once, at construction. Transient
//! failures (connect errors, timeouts, 5xx, `BUSY`) are retried with
//! exponential backoff.

use crate::error::RelayError;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Header carrying the relay project id.
const PROJECT_ID_HEADER: &str = "x-project-id";

/// Longest error body kept in `RelayError::HttpStatus`.
const MAX_ERROR_BODY: usize = 500;

#[derive(Serialize)]
struct Envelope<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ReplyError>,
}

#[derive(Deserialize)]
struct ReplyError {
    code: i64,
    message: String,
}

/// Basic-auth credentials for relays behind a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Base URL, e.g. `https://relay.unikit.dev`.
    pub url: String,
    /// Project id issued by the relay operator.
    pub project_id: Option<String>,
    pub credentials: Option<Credentials>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts after a transient failure.
    pub retries: u32,
    /// First backoff delay; doubles on every further attempt.
    pub retry_delay: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: crate::DEFAULT_RELAY_URL.to_string(),
            project_id: None,
            credentials: None,
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl RelayConfig {
    fn endpoint(&self) -> String {
        format!("{}/rpc", self.url)
    }

    fn headers(&self) -> Result<HeaderMap, RelayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(creds) = &self.credentials {
            let token = base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", creds.username, creds.password));
            let value = HeaderValue::from_str(&format!("Basic {}", token))
                .map_err(|_| RelayError::Other("credentials are not a valid header".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(project) = &self.project_id {
            let value = HeaderValue::from_str(project)
                .map_err(|_| RelayError::Other(format!("invalid project id: {:?}", project)))?;
            headers.insert(HeaderName::from_static(PROJECT_ID_HEADER), value);
        }
        Ok(headers)
    }

    /// Delay before attempt `attempt` (1-based retry count).
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

pub struct RelayClient {
    http: reqwest::Client,
    config: RelayConfig,
    endpoint: String,
    next_id: AtomicU64,
}

impl RelayClient {
    pub fn new(url: &str) -> Result<Self, RelayError> {
        Self::with_config(RelayConfig {
            url: url.to_string(),
            ..Default::default()
        })
    }

    pub fn with_config(mut config: RelayConfig) -> Result<Self, RelayError> {
        config.url = config.url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(config.headers()?)
            .build()
            .map_err(|e| RelayError::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Call `method` and return its `result`, retrying transient failures.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RelayError> {
        let mut attempt = 0;
        loop {
            match self.call_once(method, &params).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.config.retries => {
                    attempt += 1;
                    let delay = self.config.backoff(attempt);
                    log::debug!("{} failed ({}), retry {} in {:?}", method, e, attempt, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once(&self, method: &str, params: &Value) -> Result<Value, RelayError> {
        let envelope = Envelope {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let http_err = |source: reqwest::Error| RelayError::Http {
            method: method.to_string(),
            url: self.endpoint.clone(),
            source,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(http_err)?;

        match resp.status().as_u16() {
            401 | 403 => {
                return Err(RelayError::AuthFailed {
                    url: self.endpoint.clone(),
                })
            }
            status if status >= 400 => {
                let body = resp.text().await.unwrap_or_default();
                return Err(RelayError::HttpStatus {
                    method: method.to_string(),
                    url: self.endpoint.clone(),
                    status,
                    body: body.chars().take(MAX_ERROR_BODY).collect(),
                });
            }
            _ => {}
        }

        let reply: Reply = resp.json().await.map_err(http_err)?;
        unwrap_reply(reply, method)
    }

    /// True if `GET {url}/health` answers with a success status.
    pub async fn is_reachable(&self) -> bool {
        let url = format!("{}/health", self.config.url);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                log::debug!("relay health check failed: {}", e);
                false
            }
        }
    }
}

fn unwrap_reply(reply: Reply, method: &str) -> Result<Value, RelayError> {
    match (reply.result, reply.error) {
        (_, Some(err)) if err.message == "BUSY" => Err(RelayError::Busy {
            context: method.to_string(),
        }),
        (_, Some(err)) => Err(RelayError::Rpc {
            code: err.code,
            message: err.message,
            method: method.to_string(),
        }),
        (Some(result), None) => Ok(result),
        (None, None) => Err(RelayError::NoResult {
            context: method.to_string(),
        }),
    }
}
