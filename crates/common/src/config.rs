//! Service configuration loaded from environment variables.

use std::time::Duration;

/// Configuration shared by every service, with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: per service)
/// - `SERVICE_NAME`: name registered with Consul (default: per service)
/// - `SERVICE_HOST`: address advertised to Consul (default: the service name)
/// - `CONSUL_HOST` / `CONSUL_PORT`: registry agent (default: `consul:8500`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset means in-memory storage
/// - `ENVIRONMENT`: free-form label (default: `"development"`)
/// - `REMOTE_TIMEOUT_MS`: per-call timeout for remote work (default: `5000`)
/// - `REGISTER_WITH_CONSUL`: `false` disables self-registration
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    pub service_host: String,
    pub host: String,
    pub port: u16,
    pub consul_host: String,
    pub consul_port: u16,
    pub database_url: Option<String>,
    pub environment: String,
    pub remote_timeout: Duration,
    pub register_with_consul: bool,
    pub log_level: String,
}

impl ServiceConfig {
    /// Default per-call timeout for remote work.
    pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_millis(5000);

    /// Builds the defaults for a service.
    pub fn defaults(service_name: &str, port: u16) -> Self {
        Self {
            service_name: service_name.to_string(),
            service_host: service_name.to_string(),
            host: "0.0.0.0".to_string(),
            port,
            consul_host: "consul".to_string(),
            consul_port: 8500,
            database_url: None,
            environment: "development".to_string(),
            remote_timeout: Self::DEFAULT_REMOTE_TIMEOUT,
            register_with_consul: true,
            log_level: "info".to_string(),
        }
    }

    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env(service_name: &str, default_port: u16) -> Self {
        Self::from_lookup(service_name, default_port, |key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, default_port: u16, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::defaults(service_name, default_port);
        let service_name = lookup("SERVICE_NAME").unwrap_or(defaults.service_name);

        Self {
            service_host: lookup("SERVICE_HOST").unwrap_or_else(|| service_name.clone()),
            service_name,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            consul_host: lookup("CONSUL_HOST").unwrap_or(defaults.consul_host),
            consul_port: lookup("CONSUL_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.consul_port),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            remote_timeout: lookup("REMOTE_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.remote_timeout),
            register_with_consul: lookup("REGISTER_WITH_CONSUL")
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(defaults.register_with_consul),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the base URL of the Consul agent.
    pub fn consul_url(&self) -> String {
        format!("http://{}:{}", self.consul_host, self.consul_port)
    }
}
