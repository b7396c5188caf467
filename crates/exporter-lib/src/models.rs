//! Core data models returned by the NSX-T manager API
//!
//! Only the fields the collectors read are modelled; everything else in the
//! API payloads is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// One page of a cursor-paginated list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Empty when there are no more pages
    #[serde(default)]
    pub cursor: String,
}

impl<T> Page<T> {
    pub fn last(results: Vec<T>) -> Self {
        Self {
            results,
            cursor: String::new(),
        }
    }
}

/// Non-paginated list wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResult<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicalPort {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub logical_switch_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicalPortStatus {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicalSwitch {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub transport_zone_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicalSwitchState {
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicalRouter {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub router_type: String,
}

/// NAT rule statistics of a logical router
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NatStatistics {
    #[serde(default)]
    pub statistics_for_rules: Vec<NatRuleStatistics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NatRuleStatistics {
    #[serde(default)]
    pub rule_id: String,
    #[serde(default)]
    pub total_bytes: i64,
    #[serde(default)]
    pub total_packets: i64,
    #[serde(default)]
    pub active_sessions: i64,
}

impl NatStatistics {
    /// Sum of (packets, bytes, active sessions) over every rule
    pub fn totals(&self) -> (i64, i64, i64) {
        self.statistics_for_rules
            .iter()
            .fold((0, 0, 0), |(packets, bytes, sessions), rule| {
                (
                    packets.saturating_add(rule.total_packets),
                    bytes.saturating_add(rule.total_bytes),
                    sessions.saturating_add(rule.active_sessions),
                )
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicalRouterPort {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub logical_router_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicalRouterPortStatistics {
    #[serde(default)]
    pub per_node_statistics: Vec<PerNodeStatistics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerNodeStatistics {
    #[serde(default)]
    pub transport_node_id: String,
    #[serde(default)]
    pub rx: InterfaceCounters,
    #[serde(default)]
    pub tx: InterfaceCounters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceCounters {
    #[serde(default)]
    pub total_bytes: i64,
    #[serde(default)]
    pub total_packets: i64,
    #[serde(default)]
    pub dropped_packets: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadBalancerService {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadBalancerServiceStatus {
    #[serde(default)]
    pub service_status: String,
    #[serde(default)]
    pub pools: Vec<LoadBalancerPoolStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadBalancerPoolStatus {
    pub pool_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub members: Vec<LoadBalancerPoolMemberStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadBalancerPoolMemberStatus {
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirewallSection {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub rule_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirewallRuleStats {
    #[serde(default)]
    pub packet_count: i64,
    #[serde(default)]
    pub byte_count: i64,
    #[serde(default)]
    pub session_count: i64,
    #[serde(default)]
    pub hit_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DhcpServer {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DhcpServerStatus {
    #[serde(default)]
    pub service_status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportNode {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportNodeStatus {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportZone {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportZoneSummary {
    #[serde(default)]
    pub num_logical_ports: i64,
    #[serde(default)]
    pub num_logical_switches: i64,
    #[serde(default)]
    pub num_transport_nodes: i64,
}

/// Cluster-wide control and management plane status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterStatus {
    #[serde(default)]
    pub control_cluster_status: ClusterGroupStatus,
    #[serde(default)]
    pub mgmt_cluster_status: ClusterGroupStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterGroupStatus {
    #[serde(default)]
    pub status: String,
}

/// A controller and/or manager node of the cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterNode {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub controller_role: Option<serde_json::Value>,
    #[serde(default)]
    pub manager_role: Option<serde_json::Value>,
}

impl ClusterNode {
    pub fn is_controller(&self) -> bool {
        self.controller_role.is_some()
    }

    pub fn is_manager(&self) -> bool {
        self.manager_role.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterNodeStatus {
    #[serde(default)]
    pub control_cluster_status: Option<ControlClusterNodeStatus>,
    #[serde(default)]
    pub mgmt_cluster_status: Option<ManagementClusterNodeStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlClusterNodeStatus {
    #[serde(default)]
    pub control_cluster_status: String,
    #[serde(default)]
    pub mgmt_connection_status: ConnectivityStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectivityStatus {
    #[serde(default)]
    pub connectivity_status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagementClusterNodeStatus {
    #[serde(default)]
    pub mgmt_cluster_status: String,
}

/// Runtime state of a manager appliance service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeServiceStatus {
    #[serde(default)]
    pub runtime_state: String,
}
