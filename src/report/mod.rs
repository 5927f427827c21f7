//! Report delivery
//!
//! Snapshots leave the process as JSON over HTTP. Delivery is fire-and-forget:
//! [`Reporter::send`] spawns the request on the tokio runtime and returns at
//! once, and the outcome is only logged. There are no retries.
//!
//! # Endpoints
//!
//! | Route            | Used for                          | Default method |
//! |------------------|-----------------------------------|----------------|
//! | `command`        | one-shot command reports          | `POST`         |
//! | `monitor_batch`  | startup snapshot of watched cells | `PUT`          |
//! | `monitor_update` | debounced change of a watched cell | `PUT`         |

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, ReporterConfig};
use crate::error::{CellwatchErrorTrait, ErrorCategory};
use crate::metrics;

/// Which channel a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Command,
    MonitorBatch,
    MonitorUpdate,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::MonitorBatch => "monitor_batch",
            Self::MonitorUpdate => "monitor_update",
        }
    }

    /// Config key holding this route's method
    fn method_field(&self) -> &'static str {
        match self {
            Self::Command => "report_method",
            Self::MonitorBatch => "monitored_blocks.batch.method",
            Self::MonitorUpdate => "monitored_blocks.update.method",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved report destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub route: Route,
    pub url: String,
    pub method: Method,
}

impl Endpoint {
    /// Build an endpoint from a base URL, a path and a method name
    ///
    /// The method is upper-cased; the URL is the plain concatenation of base
    /// and path.
    pub fn new(route: Route, base: &str, path: &str, method: &str) -> Result<Self, ConfigError> {
        let upper = method.trim().to_ascii_uppercase();
        let method = Method::from_bytes(upper.as_bytes()).map_err(|_| ConfigError::InvalidMethod {
            field: route.method_field().to_string(),
            method: method.to_string(),
        })?;

        Ok(Self {
            route,
            url: format!("{base}{path}"),
            method,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// The three report destinations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub command: Endpoint,
    pub batch: Endpoint,
    pub update: Endpoint,
}

/// Delivery failures
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Connect, timeout or DNS failure
    #[error("Failed to send report to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-2xx status
    #[error("Report to {url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// Too many reports outstanding; this one was dropped
    #[error("Report queue full ({limit} pending), dropping report")]
    QueueFull { limit: usize },

    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl CellwatchErrorTrait for ReportError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::QueueFull { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Client(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } | Self::QueueFull { .. } => ErrorCategory::Network,
            Self::Status { .. } => ErrorCategory::HttpStatus,
            Self::Client(_) => ErrorCategory::Config,
        }
    }
}

/// A successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub status: u16,
    pub body: String,
}

/// Anything that accepts outgoing reports
///
/// `submit` must not block; the caller may be on the host's tick thread.
pub trait ReportSink: Send + Sync {
    fn submit(&self, endpoint: &Endpoint, body: String);
}

/// HTTP reporter with a bounded number of outstanding requests
pub struct Reporter {
    client: Client,
    runtime: Handle,
    permits: Arc<Semaphore>,
    max_pending: usize,
}

impl Reporter {
    /// Create a reporter that spawns deliveries on `runtime`
    pub fn new(config: &ReporterConfig, runtime: Handle) -> Result<Self, ReportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ReportError::Client)?;

        let max_pending = config.max_pending.clamp(1, u32::MAX as usize);

        Ok(Self {
            client,
            runtime,
            permits: Arc::new(Semaphore::new(max_pending)),
            max_pending,
        })
    }

    /// Dispatch a report without waiting for it
    ///
    /// Returns `None` when the report was dropped at the pending limit.
    pub fn send(&self, endpoint: &Endpoint, body: String) -> Option<JoinHandle<()>> {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                let err = ReportError::QueueFull {
                    limit: self.max_pending,
                };
                tracing::warn!(
                    route = %endpoint.route,
                    method = %endpoint.method,
                    url = %endpoint.url,
                    "{err}"
                );
                metrics::record_dropped(endpoint.route.as_str());
                return None;
            }
        };

        let client = self.client.clone();
        let endpoint = endpoint.clone();
        metrics::update_in_flight(1);

        Some(self.runtime.spawn(async move {
            let result = deliver_with(&client, &endpoint, body).await;
            log_outcome(&endpoint, &result);
            metrics::update_in_flight(-1);
            drop(permit);
        }))
    }

    /// Deliver a report and wait for the outcome
    ///
    /// Not subject to the pending limit.
    pub async fn deliver(&self, endpoint: &Endpoint, body: String) -> Result<Delivery, ReportError> {
        deliver_with(&self.client, endpoint, body).await
    }

    /// Wait until every dispatched report has completed
    pub async fn drain(&self) {
        let all = u32::try_from(self.max_pending).unwrap_or(u32::MAX);
        if let Ok(permits) = self.permits.acquire_many(all).await {
            drop(permits);
        }
    }

    /// Reports currently queued or in flight
    pub fn pending(&self) -> usize {
        self.max_pending - self.permits.available_permits()
    }
}

impl ReportSink for Reporter {
    fn submit(&self, endpoint: &Endpoint, body: String) {
        let _ = self.send(endpoint, body);
    }
}

async fn deliver_with(
    client: &Client,
    endpoint: &Endpoint,
    body: String,
) -> Result<Delivery, ReportError> {
    let _timer = metrics::start_report_timer(endpoint.route.as_str());

    let response = client
        .request(endpoint.method.clone(), &endpoint.url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|source| ReportError::Transport {
            url: endpoint.url.clone(),
            source,
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());

    if status.is_success() {
        Ok(Delivery {
            status: status.as_u16(),
            body,
        })
    } else {
        Err(ReportError::Status {
            url: endpoint.url.clone(),
            status: status.as_u16(),
            body,
        })
    }
}

fn log_outcome(endpoint: &Endpoint, result: &Result<Delivery, ReportError>) {
    let route = endpoint.route.as_str();
    match result {
        Ok(delivery) => {
            tracing::info!(
                route,
                method = %endpoint.method,
                url = %endpoint.url,
                status = delivery.status,
                response = %delivery.body,
                "Report delivered"
            );
            metrics::record_report(route, "success");
        }
        Err(e @ ReportError::Status { status, .. }) => {
            tracing::warn!(
                route,
                method = %endpoint.method,
                url = %endpoint.url,
                status,
                "{e}"
            );
            metrics::record_report(route, "http_status");
        }
        Err(e) => {
            tracing::error!(
                route,
                method = %endpoint.method,
                url = %endpoint.url,
                "{e}"
            );
            metrics::record_report(route, "transport");
        }
    }
}

/// A report captured by [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReport {
    pub endpoint: Endpoint,
    pub body: String,
}

impl SentReport {
    /// Parse the body as JSON
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

/// Sink that keeps every report in memory instead of sending it
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<SentReport>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything submitted so far
    pub fn reports(&self) -> Vec<SentReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything submitted so far
    pub fn take(&self) -> Vec<SentReport> {
        std::mem::take(&mut *self.reports.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportSink for RecordingSink {
    fn submit(&self, endpoint: &Endpoint, body: String) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentReport {
                endpoint: endpoint.clone(),
                body,
            });
    }
}
