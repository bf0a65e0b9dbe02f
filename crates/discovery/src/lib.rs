//! Client-side service discovery.
//!
//! Translates a logical service name into a reachable [`ServiceInstance`]:
//! - [`ConsulDiscovery`] queries the registry for healthy instances
//! - [`StaticDiscovery`] serves a fixed table (configuration or tests)
//!
//! Both delegate the choice among healthy instances to a pluggable
//! [`SelectionStrategy`], uniformly random by default. [`ConsulAgent`]
//! handles self-registration of a service with the local Consul agent.

pub mod consul;
pub mod error;
pub mod instance;
pub mod registration;
pub mod static_registry;
pub mod strategy;

use std::sync::Arc;

use async_trait::async_trait;

pub use consul::{ConsulAgent, ConsulDiscovery};
pub use error::DiscoveryError;
pub use instance::ServiceInstance;
pub use registration::{HealthCheck, RegisteredService, Registration};
pub use static_registry::StaticDiscovery;
pub use strategy::{RoundRobin, SelectionStrategy, UniformRandom};

/// Resolves logical service names to network addresses.
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// Picks one healthy instance of `service_name`.
    ///
    /// `Ok(None)` means the registry answered but knows no healthy instance;
    /// an unreachable registry is reported as [`DiscoveryError`].
    async fn resolve(&self, service_name: &str)
    -> Result<Option<ServiceInstance>, DiscoveryError>;
}

#[async_trait]
impl<T: ServiceDiscovery + ?Sized> ServiceDiscovery for Arc<T> {
    async fn resolve(
        &self,
        service_name: &str,
    ) -> Result<Option<ServiceInstance>, DiscoveryError> {
        (**self).resolve(service_name).await
    }
}
