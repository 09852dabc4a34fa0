//! HTTP client with bounded retries
//!
//! Every request is an authenticated GET. The retry policy follows how the
//! WorkRamp API misbehaves in practice:
//! - 429 waits a long fixed cooldown and tries again
//! - 5xx and transport failures wait a shorter fixed cooldown and try again
//! - any other non-2xx status fails immediately
//!
//! All retries share one attempt budget. Running out of it is an error,
//! never a silent fall-through with the last response.

use crate::error::{is_retryable_status, Error, Result};
use crate::types::{JsonObject, JsonValue};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Base URL of the WorkRamp v1 API
pub const BASE_URL: &str = "https://app.workramp.com/api/v1";

/// Retry budget and cooldowns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one
    pub max_attempts: u32,
    /// Wait after a 429 response
    pub rate_limit_wait: Duration,
    /// Wait after a 5xx response or a transport failure
    pub server_error_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            rate_limit_wait: Duration::from_secs(60),
            server_error_wait: Duration::from_secs(10),
        }
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL relative paths are resolved against
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
    /// Client-side request rate; bursts up to the same number of requests
    pub requests_per_second: Option<NonZeroU32>,
    /// Token sent in the `Authorization: Bearer` header
    pub bearer_token: Option<String>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
            requests_per_second: None,
            bearer_token: None,
            default_headers: HashMap::new(),
            user_agent: format!("tap-workramp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the full retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set the attempt budget
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    /// Set both cooldowns
    pub fn waits(mut self, rate_limit: Duration, server_error: Duration) -> Self {
        self.config.retry.rate_limit_wait = rate_limit;
        self.config.retry.server_error_wait = server_error;
        self
    }

    /// Limit the request rate; zero disables the limiter
    pub fn requests_per_second(mut self, rps: u32) -> Self {
        self.config.requests_per_second = NonZeroU32::new(rps);
        self
    }

    /// Set the bearer token
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.config.bearer_token = Some(token.into());
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Snapshot of what the client has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryCounts {
    /// Requests sent, retries included
    pub requests: u32,
    /// Cooldowns taken after a 429
    pub rate_limit_waits: u32,
    /// Cooldowns taken after a 5xx
    pub server_error_waits: u32,
    /// Cooldowns taken after a transport failure
    pub transport_waits: u32,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU32,
    rate_limit_waits: AtomicU32,
    server_error_waits: AtomicU32,
    transport_waits: AtomicU32,
}

impl Counters {
    fn bump(counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Why an attempt is being retried
#[derive(Debug, Clone, Copy)]
enum RetryReason {
    RateLimited,
    ServerError(u16),
    Transport,
}

/// Authenticated HTTP client for the WorkRamp API
///
/// Read-only after construction. Requests are issued one at a time by the
/// sync engine; the client itself holds no per-request state.
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<DefaultDirectRateLimiter>,
    counters: Counters,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        url::Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config
            .requests_per_second
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            config,
            rate_limiter,
            counters: Counters::default(),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Counters accumulated since construction
    pub fn retry_counts(&self) -> RetryCounts {
        RetryCounts {
            requests: self.counters.requests.load(Ordering::Relaxed),
            rate_limit_waits: self.counters.rate_limit_waits.load(Ordering::Relaxed),
            server_error_waits: self.counters.server_error_waits.load(Ordering::Relaxed),
            transport_waits: self.counters.transport_waits.load(Ordering::Relaxed),
        }
    }

    /// GET a path or absolute URL and read the body, retrying per the policy
    ///
    /// Returns the body of the first 2xx response. A body that cannot be
    /// read counts as a transport failure.
    pub async fn get(&self, path_or_url: &str) -> Result<String> {
        let url = self.build_url(path_or_url);
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut last_status = None;

        for attempt in 1..=max_attempts {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.until_ready().await;
            }

            info!("workramp get request {url} (attempt {attempt}/{max_attempts})");
            Counters::bump(&self.counters.requests);

            let reason = match self.build_request(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    last_status = Some(status.as_u16());

                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => {
                                debug!("Request succeeded: GET {url} -> {}", status.as_u16());
                                return Ok(body);
                            }
                            Err(e) => {
                                warn!("Failed to read body from {url}: {e}");
                                RetryReason::Transport
                            }
                        }
                    } else if !is_retryable_status(status.as_u16()) {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::http_status(status.as_u16(), body));
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        RetryReason::RateLimited
                    } else {
                        RetryReason::ServerError(status.as_u16())
                    }
                }
                Err(e) => {
                    warn!("Transport error for {url}: {e}");
                    RetryReason::Transport
                }
            };

            if attempt == max_attempts {
                break;
            }

            let wait = self.wait_for(reason);
            match reason {
                RetryReason::RateLimited => {
                    Counters::bump(&self.counters.rate_limit_waits);
                    warn!(
                        "api query workramp rate limit, attempt {attempt}/{max_attempts}, waiting {wait:?}"
                    );
                }
                RetryReason::ServerError(status) => {
                    Counters::bump(&self.counters.server_error_waits);
                    warn!(
                        "api query workramp {status} error, attempt {attempt}/{max_attempts}, waiting {wait:?}"
                    );
                }
                RetryReason::Transport => {
                    Counters::bump(&self.counters.transport_waits);
                    warn!(
                        "api query workramp connection failure, attempt {attempt}/{max_attempts}, waiting {wait:?}"
                    );
                }
            }
            tokio::time::sleep(wait).await;
        }

        warn!("Giving up on {url} after {max_attempts} attempts");
        Err(Error::MaxRetriesExceeded {
            max_retries: max_attempts,
            last_status,
        })
    }

    /// GET and parse the body as JSON
    pub async fn fetch(&self, path_or_url: &str) -> Result<JsonValue> {
        let body = self.get(path_or_url).await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("invalid JSON from {path_or_url}: {e}")))
    }

    /// GET a collection endpoint; the body must be an array of objects
    pub async fn fetch_records(&self, path_or_url: &str) -> Result<Vec<JsonObject>> {
        match self.fetch(path_or_url).await? {
            JsonValue::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    JsonValue::Object(record) => Ok(record),
                    other => Err(Error::decode(format!(
                        "element {i} from {path_or_url} is not an object: {other}"
                    ))),
                })
                .collect(),
            other => Err(Error::decode(format!(
                "expected a JSON array from {path_or_url}, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(ref token) = self.config.bearer_token {
            req = req.bearer_auth(token);
        }

        req
    }

    fn wait_for(&self, reason: RetryReason) -> Duration {
        match reason {
            RetryReason::RateLimited => self.config.retry.rate_limit_wait,
            RetryReason::ServerError(_) | RetryReason::Transport => {
                self.config.retry.server_error_wait
            }
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("retry", &self.config.retry)
            .field("has_bearer_token", &self.config.bearer_token.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
