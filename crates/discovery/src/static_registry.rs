//! Fixed-table discovery for static deployments and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ServiceDiscovery;
use crate::error::{DiscoveryError, Result};
use crate::instance::ServiceInstance;
use crate::strategy::{SelectionStrategy, UniformRandom};

#[derive(Default)]
struct StaticState {
    services: RwLock<HashMap<String, Vec<ServiceInstance>>>,
    unreachable: AtomicBool,
    resolutions: AtomicUsize,
}

/// Discovery over an in-process table of instances.
///
/// Cloning shares the table, so a test can keep a handle to reconfigure
/// services while the code under test resolves through another clone.
#[derive(Clone)]
pub struct StaticDiscovery {
    state: Arc<StaticState>,
    strategy: Arc<dyn SelectionStrategy>,
}

impl Default for StaticDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticDiscovery {
    /// Creates an empty table with uniformly random selection.
    pub fn new() -> Self {
        Self::with_strategy(UniformRandom)
    }

    /// Creates an empty table with a custom selection strategy.
    pub fn with_strategy(strategy: impl SelectionStrategy + 'static) -> Self {
        Self {
            state: Arc::new(StaticState::default()),
            strategy: Arc::new(strategy),
        }
    }

    /// Creates a table from a prepared map.
    pub fn from_map(services: HashMap<String, Vec<ServiceInstance>>) -> Self {
        let discovery = Self::new();
        let state = Arc::new(StaticState {
            services: RwLock::new(services),
            ..StaticState::default()
        });
        Self { state, ..discovery }
    }

    /// Parses `name=host:port[;host:port],name=...`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut services: HashMap<String, Vec<ServiceInstance>> = HashMap::new();

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let invalid = |reason: &str| DiscoveryError::InvalidStaticEntry {
                entry: entry.to_string(),
                reason: reason.to_string(),
            };

            let (name, addresses) = entry
                .split_once('=')
                .ok_or_else(|| invalid("expected name=host:port"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid("empty service name"));
            }

            for address in addresses.split(';').map(str::trim).filter(|a| !a.is_empty()) {
                let (host, port) = address
                    .rsplit_once(':')
                    .ok_or_else(|| invalid("expected host:port"))?;
                let port = port.parse().map_err(|_| invalid("invalid port"))?;
                services
                    .entry(name.to_string())
                    .or_default()
                    .push(ServiceInstance::new(host, port));
            }
        }

        Ok(Self::from_map(services))
    }

    /// Replaces the instances of a service.
    pub async fn set_instances(&self, service_name: &str, instances: Vec<ServiceInstance>) {
        self.state
            .services
            .write()
            .await
            .insert(service_name.to_string(), instances);
    }

    /// Removes every instance of a service.
    pub async fn remove(&self, service_name: &str) {
        self.state.services.write().await.remove(service_name);
    }

    /// Makes every subsequent resolution fail as if the registry were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Returns how many resolutions were attempted.
    pub fn resolution_count(&self) -> usize {
        self.state.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn resolve(&self, service_name: &str) -> Result<Option<ServiceInstance>> {
        self.state.resolutions.fetch_add(1, Ordering::SeqCst);

        if self.state.unreachable.load(Ordering::SeqCst) {
            return Err(DiscoveryError::Unreachable {
                url: "static".to_string(),
                reason: "registry marked unreachable".to_string(),
            });
        }

        let services = self.state.services.read().await;
        let instances = services.get(service_name).map(Vec::as_slice).unwrap_or(&[]);
        Ok(self.strategy.select(instances).cloned())
    }
}
