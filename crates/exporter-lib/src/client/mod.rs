//! Data access to the NSX-T manager API
//!
//! Each object family gets its own trait so a collector depends only on the
//! endpoints it reads. [`NsxtApi`] bundles them for the process-wide client.

mod http;

pub use http::{ClientConfig, HttpClient};

use crate::error::ApiResult;
use crate::models::*;
use async_trait::async_trait;

#[async_trait]
pub trait LogicalPortApi: Send + Sync {
    /// List one page of logical ports; an empty cursor requests the first page
    async fn list_logical_ports(&self, cursor: &str) -> ApiResult<Page<LogicalPort>>;

    async fn get_logical_port_status(&self, id: &str) -> ApiResult<LogicalPortStatus>;
}

#[async_trait]
pub trait LogicalSwitchApi: Send + Sync {
    async fn list_logical_switches(&self, cursor: &str) -> ApiResult<Page<LogicalSwitch>>;

    async fn get_logical_switch_state(&self, id: &str) -> ApiResult<LogicalSwitchState>;
}

#[async_trait]
pub trait LogicalRouterApi: Send + Sync {
    async fn list_logical_routers(&self) -> ApiResult<Vec<LogicalRouter>>;

    async fn get_nat_statistics(&self, router_id: &str) -> ApiResult<NatStatistics>;
}

#[async_trait]
pub trait LogicalRouterPortApi: Send + Sync {
    async fn list_logical_router_ports(&self) -> ApiResult<Vec<LogicalRouterPort>>;

    async fn get_logical_router_port_statistics(
        &self,
        id: &str,
    ) -> ApiResult<LogicalRouterPortStatistics>;
}

#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    async fn list_load_balancers(&self, cursor: &str) -> ApiResult<Page<LoadBalancerService>>;

    async fn get_load_balancer_status(&self, id: &str) -> ApiResult<LoadBalancerServiceStatus>;
}

#[async_trait]
pub trait FirewallApi: Send + Sync {
    async fn list_firewall_sections(&self) -> ApiResult<Vec<FirewallSection>>;

    async fn list_firewall_rules(&self, section_id: &str) -> ApiResult<Vec<FirewallRule>>;

    async fn get_firewall_rule_stats(
        &self,
        section_id: &str,
        rule_id: &str,
    ) -> ApiResult<FirewallRuleStats>;
}

#[async_trait]
pub trait DhcpApi: Send + Sync {
    async fn list_dhcp_servers(&self, cursor: &str) -> ApiResult<Page<DhcpServer>>;

    async fn get_dhcp_server_status(&self, id: &str) -> ApiResult<DhcpServerStatus>;
}

#[async_trait]
pub trait TransportNodeApi: Send + Sync {
    async fn list_transport_nodes(&self, cursor: &str) -> ApiResult<Page<TransportNode>>;

    async fn get_transport_node_status(&self, id: &str) -> ApiResult<TransportNodeStatus>;
}

#[async_trait]
pub trait TransportZoneApi: Send + Sync {
    async fn list_transport_zones(&self) -> ApiResult<Vec<TransportZone>>;

    async fn get_transport_zone_summary(&self, id: &str) -> ApiResult<TransportZoneSummary>;
}

#[async_trait]
pub trait SystemApi: Send + Sync {
    async fn get_cluster_status(&self) -> ApiResult<ClusterStatus>;

    async fn list_cluster_nodes(&self) -> ApiResult<Vec<ClusterNode>>;

    async fn get_cluster_node_status(&self, id: &str) -> ApiResult<ClusterNodeStatus>;

    /// Runtime state of a manager appliance service, by its API name
    async fn get_node_service_status(&self, service: &str) -> ApiResult<NodeServiceStatus>;
}

/// Every endpoint the exporter reads
pub trait NsxtApi:
    LogicalPortApi
    + LogicalSwitchApi
    + LogicalRouterApi
    + LogicalRouterPortApi
    + LoadBalancerApi
    + FirewallApi
    + DhcpApi
    + TransportNodeApi
    + TransportZoneApi
    + SystemApi
{
}

impl<T> NsxtApi for T where
    T: LogicalPortApi
        + LogicalSwitchApi
        + LogicalRouterApi
        + LogicalRouterPortApi
        + LoadBalancerApi
        + FirewallApi
        + DhcpApi
        + TransportNodeApi
        + TransportZoneApi
        + SystemApi
{
}
