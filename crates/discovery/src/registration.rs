//! Self-registration payloads for the Consul agent.

use common::ServiceConfig;
use serde::Serialize;

use crate::consul::ConsulAgent;

/// HTTP health check attached to a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    #[serde(rename = "HTTP")]
    pub http: String,
    pub interval: String,
    pub timeout: String,
    pub deregister_critical_service_after: String,
}

impl HealthCheck {
    /// Polls `url` every 10s with a 5s timeout; deregisters after 30s critical.
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            http: url.into(),
            interval: "10s".to_string(),
            timeout: "5s".to_string(),
            deregister_critical_service_after: "30s".to_string(),
        }
    }
}

/// Body of `PUT /v1/agent/service/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Registration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub check: HealthCheck,
}

impl Registration {
    /// Builds the registration for a service advertised at `host:port`.
    ///
    /// The instance id is `"{name}-{port}"` and the health check targets
    /// `http://{host}:{port}/health`.
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        let name = name.into();
        let host = host.into();
        Self {
            id: format!("{name}-{port}"),
            check: HealthCheck::http(format!("http://{host}:{port}/health")),
            name,
            address: host,
            port,
            tags: vec!["rust".to_string(), "microservice".to_string()],
        }
    }

    /// Builds the registration from service configuration, adding Traefik
    /// routing tags for `path_prefix`.
    pub fn for_service(config: &ServiceConfig, path_prefix: &str) -> Self {
        let name = &config.service_name;
        let mut registration = Self::new(name, &config.service_host, config.port);
        registration.tags.extend([
            "traefik.enable=true".to_string(),
            format!("traefik.http.routers.{name}.rule=PathPrefix(`{path_prefix}`)"),
            format!(
                "traefik.http.services.{name}.loadbalancer.server.port={}",
                config.port
            ),
        ]);
        registration
    }
}

/// A registration held by a running service, withdrawn on shutdown.
pub struct RegisteredService {
    agent: ConsulAgent,
    service_id: String,
}

impl RegisteredService {
    /// Registers the service described by `config` with its Consul agent.
    ///
    /// Failure is logged and yields `None`; the service keeps serving
    /// without a registration.
    pub async fn register(config: &ServiceConfig, path_prefix: &str) -> Option<Self> {
        if !config.register_with_consul {
            tracing::info!("Consul registration disabled");
            return None;
        }

        let registration = Registration::for_service(config, path_prefix);
        let agent = match ConsulAgent::new(config.consul_url(), config.remote_timeout) {
            Ok(agent) => agent,
            Err(e) => {
                tracing::warn!(error = %e, "failed to build Consul agent client");
                return None;
            }
        };

        match agent.register(&registration).await {
            Ok(()) => Some(Self {
                agent,
                service_id: registration.id,
            }),
            Err(e) => {
                tracing::warn!(error = %e, service_id = %registration.id, "failed to register with Consul");
                None
            }
        }
    }

    /// Returns the registered instance id.
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Withdraws the registration, logging failure.
    pub async fn deregister(self) {
        if let Err(e) = self.agent.deregister(&self.service_id).await {
            tracing::warn!(error = %e, service_id = %self.service_id, "failed to deregister from Consul");
        }
    }
}
