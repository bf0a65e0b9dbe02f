//! Client-side load selection among healthy instances.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::seq::IndexedRandom;

use crate::instance::ServiceInstance;

/// Chooses one instance out of the healthy set returned by a registry.
pub trait SelectionStrategy: Send + Sync {
    /// Returns the chosen instance, or `None` for an empty set.
    fn select<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance>;
}

/// Uniformly random choice, no weighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRandom;

impl SelectionStrategy for UniformRandom {
    fn select<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        instances.choose(&mut rand::rng())
    }
}

/// Cycles through instances in the order the registry lists them.
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: AtomicUsize,
}

impl RoundRobin {
    /// Creates a round-robin strategy starting at the first instance.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn select<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        if instances.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % instances.len();
        instances.get(index)
    }
}
