//! Discovery-backed HTTP access to one named service.

use std::sync::Arc;
use std::time::Duration;

use discovery::ServiceDiscovery;
use reqwest::Response;

use crate::error::ClientError;

/// A remote service addressed by registry name.
#[derive(Clone)]
pub struct RemoteService {
    name: String,
    discovery: Arc<dyn ServiceDiscovery>,
    http: reqwest::Client,
}

impl RemoteService {
    /// Creates a handle with a bounded per-call timeout.
    ///
    /// Idle connections are not kept, so every call opens a fresh
    /// connection to whichever instance discovery picked.
    pub fn new(
        name: impl Into<String>,
        discovery: Arc<dyn ServiceDiscovery>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let name = name.into();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ClientError::ServiceCall {
                service: name.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            name,
            discovery,
            http,
        })
    }

    /// Returns the registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolves a fresh base URL for this call.
    pub async fn base_url(&self) -> Result<String, ClientError> {
        match self.discovery.resolve(&self.name).await? {
            Some(instance) => Ok(instance.base_url()),
            None => {
                self.record("unavailable");
                Err(ClientError::ServiceUnavailable(self.name.clone()))
            }
        }
    }

    /// Wraps a transport or protocol failure.
    pub fn call_error(&self, message: impl std::fmt::Display) -> ClientError {
        self.record("error");
        ClientError::ServiceCall {
            service: self.name.clone(),
            message: message.to_string(),
        }
    }

    /// Counts a finished call by outcome.
    pub fn record(&self, outcome: &'static str) {
        metrics::counter!(
            "remote_calls_total",
            "service" => self.name.clone(),
            "outcome" => outcome
        )
        .increment(1);
    }
}

/// Extracts the `detail` field of an error body, FastAPI style.
pub(crate) async fn error_detail(response: Response) -> String {
    const UNKNOWN: &str = "Unknown error";

    let Ok(body) = response.json::<serde_json::Value>().await else {
        return UNKNOWN.to_string();
    };

    match body.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(other) => other.to_string(),
        None => UNKNOWN.to_string(),
    }
}
