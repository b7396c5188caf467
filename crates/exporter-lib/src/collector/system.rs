//! Cluster and manager appliance health
//!
//! Unlike the other families this collector has no primary list. It runs a
//! series of independent probes (cluster stability, per-node connectivity and
//! a fixed roster of appliance services); a failing probe is logged and emits
//! nothing, and the remaining probes still run.

use super::{CollectStats, Collector};
use crate::client::SystemApi;
use crate::error::{ApiResult, CollectError};
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{ClusterNode, ClusterNodeStatus, ClusterStatus};
use crate::observability::StructuredLogger;
use crate::status::matches_sentinel;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "system";

const STABLE: &str = "STABLE";
const CONNECTED: &str = "CONNECTED";
const RUNNING: &str = "RUNNING";

/// Manager appliance services whose runtime state is exported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeService {
    ApplianceManagement,
    MessageBus,
    Ntp,
    UpgradeAgent,
    Proton,
    Proxy,
    RabbitMq,
    Repository,
    Snmp,
    Ssh,
    Search,
    Syslog,
}

impl NodeService {
    pub const ALL: [NodeService; 12] = [
        NodeService::ApplianceManagement,
        NodeService::MessageBus,
        NodeService::Ntp,
        NodeService::UpgradeAgent,
        NodeService::Proton,
        NodeService::Proxy,
        NodeService::RabbitMq,
        NodeService::Repository,
        NodeService::Snmp,
        NodeService::Ssh,
        NodeService::Search,
        NodeService::Syslog,
    ];

    /// Path segment under `/node/services`
    pub fn api_name(self) -> &'static str {
        match self {
            NodeService::ApplianceManagement => "node-mgmt",
            NodeService::MessageBus => "nsx-message-bus",
            NodeService::Ntp => "ntp",
            NodeService::UpgradeAgent => "nsx-upgrade-agent",
            NodeService::Proton => "proton",
            NodeService::Proxy => "http",
            NodeService::RabbitMq => "mgmt-plane-bus",
            NodeService::Repository => "install-upgrade",
            NodeService::Snmp => "snmp",
            NodeService::Ssh => "ssh",
            NodeService::Search => "search",
            NodeService::Syslog => "syslog",
        }
    }

    /// Value of the `service` label
    pub fn label(self) -> &'static str {
        match self {
            NodeService::ApplianceManagement => "appliance_management",
            NodeService::MessageBus => "message_bus",
            NodeService::Ntp => "ntp",
            NodeService::UpgradeAgent => "upgrade_agent",
            NodeService::Proton => "proton",
            NodeService::Proxy => "proxy",
            NodeService::RabbitMq => "rabbitmq",
            NodeService::Repository => "repository",
            NodeService::Snmp => "snmp",
            NodeService::Ssh => "ssh",
            NodeService::Search => "search",
            NodeService::Syslog => "syslog",
        }
    }
}

/// Result of one service probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceHealth {
    pub service: NodeService,
    pub running: bool,
}

/// Cluster role a node connectivity sample refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Controller,
    Management,
}

impl NodeRole {
    fn label(self) -> &'static str {
        match self {
            NodeRole::Controller => "controller",
            NodeRole::Management => "management",
        }
    }
}

/// Both control and management cluster report `STABLE`
pub fn cluster_is_stable(status: &ClusterStatus) -> bool {
    matches_sentinel(&status.control_cluster_status.status, STABLE)
        && matches_sentinel(&status.mgmt_cluster_status.status, STABLE)
}

/// Connectivity of a node in the given role.
///
/// Controllers need both their control cluster membership and their
/// management connection to be `CONNECTED`; management nodes only their
/// management cluster membership.
pub fn node_is_connected(status: &ClusterNodeStatus, role: NodeRole) -> bool {
    match role {
        NodeRole::Controller => status.control_cluster_status.as_ref().is_some_and(|c| {
            matches_sentinel(&c.control_cluster_status, CONNECTED)
                && matches_sentinel(&c.mgmt_connection_status.connectivity_status, CONNECTED)
        }),
        NodeRole::Management => status
            .mgmt_cluster_status
            .as_ref()
            .is_some_and(|m| matches_sentinel(&m.mgmt_cluster_status, CONNECTED)),
    }
}

fn roles(node: &ClusterNode) -> impl Iterator<Item = NodeRole> {
    let controller = node.is_controller().then_some(NodeRole::Controller);
    let management = node.is_manager().then_some(NodeRole::Management);
    controller.into_iter().chain(management)
}

pub struct SystemCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    cluster_status: Arc<MetricDesc>,
    node_connected: Arc<MetricDesc>,
    service_running: Arc<MetricDesc>,
}

impl<A: SystemApi + ?Sized + 'static> SystemCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            cluster_status: MetricDesc::new(
                "cluster_status",
                "Whether both the control and the management cluster are stable",
                &[],
            )?,
            node_connected: MetricDesc::new(
                "cluster_node_connected",
                "Whether the cluster node is connected in the given role",
                &["id", "name", "role"],
            )?,
            service_running: MetricDesc::new(
                "node_service_running",
                "Whether the manager appliance service is running",
                &["service"],
            )?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }

    /// Probe one appliance service
    pub async fn probe_service(&self, service: NodeService) -> ApiResult<ServiceHealth> {
        let status = self.api.get_node_service_status(service.api_name()).await?;
        Ok(ServiceHealth {
            service,
            running: matches_sentinel(&status.runtime_state, RUNNING),
        })
    }

    async fn collect_cluster(&self, sink: &SampleSink) -> CollectStats {
        match self.api.get_cluster_status().await {
            Ok(status) => {
                sink.emit_bool(&self.cluster_status, cluster_is_stable(&status), &[] as &[&str]);
                CollectStats { objects: 1, skipped: 0 }
            }
            Err(e) => {
                self.logger.log_probe_failure("cluster status", &e);
                CollectStats { objects: 0, skipped: 1 }
            }
        }
    }

    async fn collect_nodes(&self, sink: &SampleSink) -> CollectStats {
        let mut stats = CollectStats::default();

        let nodes = match self.api.list_cluster_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                self.logger.log_probe_failure("cluster nodes", &e);
                stats.skipped += 1;
                return stats;
            }
        };

        for node in &nodes {
            let status = match self.api.get_cluster_node_status(&node.id).await {
                Ok(status) => status,
                Err(e) => {
                    self.logger.log_status_failure("cluster node", &node.id, &e);
                    stats.skipped += 1;
                    continue;
                }
            };

            for role in roles(node) {
                sink.emit_bool(
                    &self.node_connected,
                    node_is_connected(&status, role),
                    &[node.id.as_str(), node.display_name.as_str(), role.label()],
                );
            }
            stats.objects += 1;
        }

        stats
    }

    async fn collect_services(&self, sink: &SampleSink) -> CollectStats {
        let mut stats = CollectStats::default();

        for service in NodeService::ALL {
            match self.probe_service(service).await {
                Ok(health) => {
                    sink.emit_bool(&self.service_running, health.running, &[health.service.label()]);
                    stats.objects += 1;
                }
                Err(e) => {
                    self.logger.log_probe_failure(service.label(), &e);
                    stats.skipped += 1;
                }
            }
        }

        stats
    }
}

#[async_trait]
impl<A: SystemApi + ?Sized + 'static> Collector for SystemCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![
            self.cluster_status.clone(),
            self.node_connected.clone(),
            self.service_running.clone(),
        ]
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let mut stats = self.collect_cluster(sink).await;
        stats.merge(self.collect_nodes(sink).await);
        stats.merge(self.collect_services(sink).await);
        Ok(stats)
    }
}
