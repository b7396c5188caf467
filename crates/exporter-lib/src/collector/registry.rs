//! Collector registry
//!
//! Maps a collector key to the factory that builds it. The registry is built
//! once at startup and only read afterwards.

use super::{
    dhcp, firewall, load_balancer, logical_port, logical_router, logical_router_port,
    logical_switch, system, transport_node, transport_zone, Collector,
};
use crate::client::NsxtApi;
use crate::observability::StructuredLogger;
use std::sync::Arc;
use tracing::debug;

/// Builds one collector from the shared API client and a logger tagged with
/// the collector key
pub type CollectorFactory<A> = fn(Arc<A>, StructuredLogger) -> anyhow::Result<Box<dyn Collector>>;

/// Ordered set of collector factories keyed by name
pub struct Registry<A: ?Sized> {
    entries: Vec<(String, CollectorFactory<A>)>,
}

impl<A: ?Sized> Default for Registry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> Registry<A> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a factory under `key`.
    ///
    /// Registering a key twice replaces the earlier factory but keeps its
    /// position.
    pub fn register(&mut self, key: impl Into<String>, factory: CollectorFactory<A>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => {
                debug!(collector = %key, "Replacing registered collector factory");
                entry.1 = factory;
            }
            None => self.entries.push((key, factory)),
        }
    }

    /// Keep only the collectors whose key satisfies `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(key, _)| keep(key));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, CollectorFactory<A>)> {
        self.entries.iter().map(|(key, factory)| (key.as_str(), *factory))
    }
}

/// Registry of every built-in collector, driven by the full NSX-T client
pub fn default_registry() -> Registry<dyn NsxtApi> {
    let mut registry: Registry<dyn NsxtApi> = Registry::new();

    registry.register(
        logical_port::NAME,
        logical_port::LogicalPortCollector::<dyn NsxtApi>::factory,
    );
    registry.register(
        logical_switch::NAME,
        logical_switch::LogicalSwitchCollector::<dyn NsxtApi>::factory,
    );
    registry.register(
        logical_router::NAME,
        logical_router::LogicalRouterCollector::<dyn NsxtApi>::factory,
    );
    registry.register(
        logical_router_port::NAME,
        logical_router_port::LogicalRouterPortCollector::<dyn NsxtApi>::factory,
    );
    registry.register(
        load_balancer::NAME,
        load_balancer::LoadBalancerCollector::<dyn NsxtApi>::factory,
    );
    registry.register(
        firewall::NAME,
        firewall::FirewallCollector::<dyn NsxtApi>::factory,
    );
    registry.register(dhcp::NAME, dhcp::DhcpCollector::<dyn NsxtApi>::factory);
    registry.register(
        transport_node::NAME,
        transport_node::TransportNodeCollector::<dyn NsxtApi>::factory,
    );
    registry.register(
        transport_zone::NAME,
        transport_zone::TransportZoneCollector::<dyn NsxtApi>::factory,
    );
    registry.register(system::NAME, system::SystemCollector::<dyn NsxtApi>::factory);

    registry
}
