//! Consul-backed discovery and agent registration.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ServiceDiscovery;
use crate::error::{DiscoveryError, Result};
use crate::instance::ServiceInstance;
use crate::registration::Registration;
use crate::strategy::{SelectionStrategy, UniformRandom};

/// One entry of `GET /v1/health/service/{name}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthEntry {
    node: NodeEntry,
    service: ServiceEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeEntry {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceEntry {
    #[serde(default)]
    address: String,
    port: u16,
}

impl HealthEntry {
    /// The service-reported address wins over the node address.
    fn into_instance(self) -> ServiceInstance {
        let address = if self.service.address.is_empty() {
            self.node.address
        } else {
            self.service.address
        };
        ServiceInstance::new(address, self.service.port)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| DiscoveryError::Client(e.to_string()))
}

fn unreachable(url: &str, err: reqwest::Error) -> DiscoveryError {
    DiscoveryError::Unreachable {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// Resolves services through the Consul health API.
///
/// Only instances whose checks are passing are considered; the choice among
/// them is delegated to the selection strategy.
pub struct ConsulDiscovery<S = UniformRandom> {
    base_url: String,
    http: reqwest::Client,
    strategy: S,
}

impl ConsulDiscovery<UniformRandom> {
    /// Creates a discovery client for the agent at `base_url`
    /// (e.g. `http://consul:8500`) with uniformly random selection.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_strategy(base_url, timeout, UniformRandom)
    }
}

impl<S: SelectionStrategy> ConsulDiscovery<S> {
    /// Creates a discovery client with a custom selection strategy.
    pub fn with_strategy(base_url: impl Into<String>, timeout: Duration, strategy: S) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: build_client(timeout)?,
            strategy,
        })
    }

    /// Lists every healthy instance of `service_name`.
    pub async fn healthy_instances(&self, service_name: &str) -> Result<Vec<ServiceInstance>> {
        let url = format!("{}/v1/health/service/{}", self.base_url, service_name);

        let response = self
            .http
            .get(&url)
            .query(&[("passing", "true")])
            .send()
            .await
            .map_err(|e| unreachable(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::InvalidResponse(format!(
                "{url} answered {status}"
            )));
        }

        let entries: Vec<HealthEntry> = response
            .json()
            .await
            .map_err(|e| DiscoveryError::InvalidResponse(e.to_string()))?;

        Ok(entries.into_iter().map(HealthEntry::into_instance).collect())
    }
}

#[async_trait]
impl<S: SelectionStrategy> ServiceDiscovery for ConsulDiscovery<S> {
    #[tracing::instrument(skip(self))]
    async fn resolve(&self, service_name: &str) -> Result<Option<ServiceInstance>> {
        let instances = self.healthy_instances(service_name).await?;

        if instances.is_empty() {
            tracing::warn!(service = service_name, "no healthy instances found");
            return Ok(None);
        }

        let chosen = self.strategy.select(&instances).cloned();
        if let Some(ref instance) = chosen {
            tracing::debug!(
                service = service_name,
                %instance,
                candidates = instances.len(),
                "service resolved"
            );
        }
        Ok(chosen)
    }
}

/// Registers and deregisters the running service with the local agent.
#[derive(Clone)]
pub struct ConsulAgent {
    base_url: String,
    http: reqwest::Client,
}

impl ConsulAgent {
    /// Creates an agent client for the agent at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: build_client(timeout)?,
        })
    }

    /// `PUT /v1/agent/service/register`.
    #[tracing::instrument(skip(self, registration), fields(service_id = %registration.id))]
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        let url = format!("{}/v1/agent/service/register", self.base_url);
        self.put(&url, Some(registration)).await?;
        tracing::info!(service_id = %registration.id, "service registered with Consul");
        Ok(())
    }

    /// `PUT /v1/agent/service/deregister/{id}`.
    #[tracing::instrument(skip(self))]
    pub async fn deregister(&self, service_id: &str) -> Result<()> {
        let url = format!(
            "{}/v1/agent/service/deregister/{}",
            self.base_url, service_id
        );
        self.put::<()>(&url, None).await?;
        tracing::info!(service_id, "service deregistered from Consul");
        Ok(())
    }

    async fn put<T: serde::Serialize>(&self, url: &str, body: Option<&T>) -> Result<()> {
        let mut request = self.http.put(url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| unreachable(url, e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::InvalidResponse(format!(
                "{url} answered {status}: {text}"
            )));
        }
        Ok(())
    }
}
