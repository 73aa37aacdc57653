// src/core/probe.rs

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE};
use reqwest::{redirect, Method};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, trace};
use url::Url;

use crate::config::ScanConfig;
use crate::core::error::ScanError;
use crate::core::models::{ProbeFailure, ProbeResult};
use crate::core::target::Target;

/// Bodies larger than this are cut off and flagged as truncated.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// Slack added on top of the per-request timeout for the outer guard.
const TIMEOUT_SLACK: Duration = Duration::from_secs(1);

// --- Concurrency Budget ---

/// Caps the number of probes in flight across every stage of a scan.
///
/// The budget also tracks the current and peak number of in-flight probes so
/// the bound can be observed from the outside.
#[derive(Debug)]
pub struct ConcurrencyBudget {
    semaphore: Semaphore,
    capacity: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Held while a probe is in flight. Dropping it returns the slot.
pub struct BudgetPermit<'a> {
    _permit: Option<SemaphorePermit<'a>>,
    budget: &'a ConcurrencyBudget,
}

impl ConcurrencyBudget {
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        Arc::new(Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    pub async fn acquire(&self) -> BudgetPermit<'_> {
        // The semaphore is never closed, so acquisition only fails if that changes.
        let permit = self.semaphore.acquire().await.ok();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        BudgetPermit { _permit: permit, budget: self }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Drop for BudgetPermit<'_> {
    fn drop(&mut self) {
        self.budget.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

// --- Requests ---

#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Overrides the client's default timeout for this request only.
    pub timeout: Option<Duration>,
}

impl ProbeRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: Vec::new(), body: None, timeout: None }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Client-wide settings, usually derived from a `ScanConfig`.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: Option<String>,
    pub proxy: Option<String>,
    pub verify_tls: bool,
    pub max_redirects: usize,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

impl ProbeOptions {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            timeout: config.timeout_duration(),
            user_agent: config.user_agent.clone(),
            headers: config.headers.clone(),
            cookies: config.cookies.clone(),
            proxy: config.proxy.clone(),
            verify_tls: config.verify_ssl,
            max_redirects: config.max_redirects,
        }
    }
}

// --- The Prober Seam ---

/// Anything that can turn a `ProbeRequest` into a `ProbeResult`.
///
/// Discovery engines, the crawler and the hunters only depend on this trait,
/// which keeps them testable without a network.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn request(&self, request: ProbeRequest) -> ProbeResult;

    /// Repeats the request while it fails with a timeout or connection error,
    /// up to `retries` extra attempts.
    async fn request_with_retry(&self, request: ProbeRequest, retries: u32) -> ProbeResult {
        let mut attempt = 0;
        loop {
            let result = self.request(request.clone()).await;
            if !result.is_transient_failure() || attempt >= retries {
                return result;
            }
            attempt += 1;
            debug!(url = %request.url, attempt, error = ?result.error, "Retrying probe.");
        }
    }
}

/// Gates another `Prober` behind a `ConcurrencyBudget`.
pub struct BudgetedProber {
    inner: Arc<dyn Prober>,
    budget: Arc<ConcurrencyBudget>,
}

impl BudgetedProber {
    pub fn new(inner: Arc<dyn Prober>, budget: Arc<ConcurrencyBudget>) -> Self {
        Self { inner, budget }
    }
}

#[async_trait]
impl Prober for BudgetedProber {
    async fn request(&self, request: ProbeRequest) -> ProbeResult {
        let _permit = self.budget.acquire().await;
        self.inner.request(request).await
    }
}

// --- The HTTP Client ---

/// A pooled HTTP client whose probes all draw from one `ConcurrencyBudget`.
#[derive(Clone)]
pub struct ProbeClient {
    client: reqwest::Client,
    budget: Arc<ConcurrencyBudget>,
    timeout: Duration,
}

impl ProbeClient {
    /// Builds the client. When `scope` is given, redirects leaving the
    /// target's scope are not followed and the redirect response itself is
    /// returned.
    pub fn new(options: &ProbeOptions, budget: Arc<ConcurrencyBudget>, scope: Option<Target>) -> Result<Self, ScanError> {
        let max_redirects = options.max_redirects;
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                return attempt.error("too many redirects");
            }
            match &scope {
                Some(target) if !target.in_scope(attempt.url()) => attempt.stop(),
                _ => attempt.follow(),
            }
        });

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        default_headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        // User-supplied headers replace the defaults above.
        for (name, value) in &options.headers {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ScanError::stage("probe client", format!("invalid header name '{name}': {e}")))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| ScanError::stage("probe client", format!("invalid header value: {e}")))?;
            default_headers.insert(name, value);
        }
        if let Some(cookies) = &options.cookies {
            let value = reqwest::header::HeaderValue::from_str(cookies)
                .map_err(|e| ScanError::stage("probe client", format!("invalid cookie string: {e}")))?;
            default_headers.insert(COOKIE, value);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .default_headers(default_headers)
            .redirect(policy)
            .timeout(options.timeout)
            .danger_accept_invalid_certs(!options.verify_tls)
            .pool_max_idle_per_host(budget.capacity());
        if let Some(proxy) = &options.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self { client: builder.build()?, budget, timeout: options.timeout })
    }

    pub fn budget(&self) -> &Arc<ConcurrencyBudget> {
        &self.budget
    }

    async fn execute(&self, request: ProbeRequest, timeout: Duration) -> Result<ProbeResult, ProbeFailure> {
        let url = request.url.to_string();
        let mut builder = self.client.request(request.method, request.url).timeout(timeout);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let mut response = builder.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let mut headers: HashMap<String, String> = HashMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        let declared_length = response.content_length();

        let mut body = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await.map_err(classify_error)? {
            let remaining = MAX_BODY_BYTES - body.len();
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        let mut result = ProbeResult::response(url, status, headers, String::from_utf8_lossy(&body).into_owned());
        result.truncated = truncated;
        result.content_length = declared_length.map(|len| len as usize).unwrap_or(body.len());
        Ok(result)
    }
}

#[async_trait]
impl Prober for ProbeClient {
    async fn request(&self, request: ProbeRequest) -> ProbeResult {
        let _permit = self.budget.acquire().await;
        let started = Instant::now();
        let timeout = request.timeout.unwrap_or(self.timeout);
        let url = request.url.to_string();
        trace!(url = %url, method = %request.method, "Dispatching probe.");

        let outcome = tokio::time::timeout(timeout + TIMEOUT_SLACK, self.execute(request, timeout)).await;
        let elapsed = started.elapsed();
        match outcome {
            Ok(Ok(mut result)) => {
                result.elapsed = elapsed;
                result
            }
            Ok(Err(kind)) => {
                debug!(url = %url, error = %kind, "Probe failed.");
                ProbeResult::failure(url, kind, elapsed)
            }
            Err(_) => {
                debug!(url = %url, "Probe exceeded its outer deadline.");
                ProbeResult::failure(url, ProbeFailure::Timeout, elapsed)
            }
        }
    }
}

/// Maps a reqwest error onto the three failure kinds a probe reports.
fn classify_error(error: reqwest::Error) -> ProbeFailure {
    if error.is_timeout() {
        return ProbeFailure::Timeout;
    }
    if error.is_connect() {
        return ProbeFailure::Connection;
    }
    if error.is_redirect() || error.is_decode() || error.is_builder() {
        return ProbeFailure::Protocol;
    }

    // Walk the source chain: an I/O error underneath means the connection
    // dropped, anything else means the peer spoke something other than HTTP.
    let mut source = std::error::Error::source(&error);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return if io.kind() == std::io::ErrorKind::TimedOut {
                ProbeFailure::Timeout
            } else {
                ProbeFailure::Connection
            };
        }
        source = inner.source();
    }
    if error.is_body() || error.is_request() {
        ProbeFailure::Protocol
    } else {
        ProbeFailure::Connection
    }
}
