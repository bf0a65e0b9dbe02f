//! Billing service configuration loaded from environment variables.

use common::ServiceConfig;

/// Default registry name of the billing service.
pub const SERVICE_NAME: &str = "billing-service";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8083;

/// Where the billing service looks up its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryMode {
    /// Healthy instances from the Consul catalog.
    #[default]
    Consul,
    /// A fixed table from `STATIC_SERVICES`.
    Static,
}

/// Billing configuration: the shared service settings plus discovery.
///
/// Reads, in addition to [`ServiceConfig`]:
/// - `DISCOVERY_MODE`: `consul` (default) or `static`
/// - `STATIC_SERVICES`: `name=host:port[;host:port],name=...` for static mode
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub service: ServiceConfig,
    pub discovery_mode: DiscoveryMode,
    pub static_services: String,
}

impl BillingConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let discovery_mode = match lookup("DISCOVERY_MODE").as_deref() {
            Some(mode) if mode.eq_ignore_ascii_case("static") => DiscoveryMode::Static,
            _ => DiscoveryMode::Consul,
        };

        Self {
            discovery_mode,
            static_services: lookup("STATIC_SERVICES").unwrap_or_default(),
            service: ServiceConfig::from_lookup(SERVICE_NAME, DEFAULT_PORT, lookup),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::defaults(SERVICE_NAME, DEFAULT_PORT),
            discovery_mode: DiscoveryMode::default(),
            static_services: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_values() {
        let config = BillingConfig::default();
        assert_eq!(config.service.port, 8083);
        assert_eq!(config.service.service_name, "billing-service");
        assert_eq!(config.discovery_mode, DiscoveryMode::Consul);
        assert!(config.static_services.is_empty());
    }

    #[test]
    fn test_static_mode() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DISCOVERY_MODE", "STATIC"),
            ("STATIC_SERVICES", "customer-service=localhost:8081"),
            ("PORT", "9083"),
        ]);
        let config = BillingConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.discovery_mode, DiscoveryMode::Static);
        assert_eq!(config.static_services, "customer-service=localhost:8081");
        assert_eq!(config.service.addr(), "0.0.0.0:9083");
    }

    #[test]
    fn test_unknown_mode_falls_back_to_consul() {
        let config = BillingConfig::from_lookup(|key| {
            (key == "DISCOVERY_MODE").then(|| "zookeeper".to_string())
        });
        assert_eq!(config.discovery_mode, DiscoveryMode::Consul);
    }
}
