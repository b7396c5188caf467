//! reqwest-based implementation of the NSX-T manager API
//!
//! Every call is a single GET against `/api/v1`; there are no retries and no
//! request timeouts; the caller's scrape is the only unit of work.

use super::*;
use crate::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

const API_PREFIX: &str = "api/v1";

/// Connection settings for the manager API
#[derive(Clone)]
pub struct ClientConfig {
    /// Manager base URL (e.g., "https://nsx-manager.example.com")
    pub host: String,
    pub username: String,
    pub password: String,
    /// Accept self-signed manager certificates
    pub insecure: bool,
}

/// HTTP client for the manager API
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let mut base_url = Url::parse(&config.host)?;
        // Keep a path prefix on the host (e.g. behind a reverse proxy)
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<T> {
        let url = self.base_url.join(&format!("{}{}", API_PREFIX, path))?;
        debug!(url = %url, "GET");

        let mut request = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password));
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_page<T: DeserializeOwned>(&self, path: &str, cursor: &str) -> ApiResult<Page<T>> {
        if cursor.is_empty() {
            self.get_json(path, &[]).await
        } else {
            self.get_json(path, &[("cursor", cursor)]).await
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let list: ListResult<T> = self.get_json(path, &[]).await?;
        Ok(list.results)
    }
}

#[async_trait]
impl LogicalPortApi for HttpClient {
    async fn list_logical_ports(&self, cursor: &str) -> ApiResult<Page<LogicalPort>> {
        self.get_page("/logical-ports", cursor).await
    }

    async fn get_logical_port_status(&self, id: &str) -> ApiResult<LogicalPortStatus> {
        self.get_json(&format!("/logical-ports/{}/status", id), &[])
            .await
    }
}

#[async_trait]
impl LogicalSwitchApi for HttpClient {
    async fn list_logical_switches(&self, cursor: &str) -> ApiResult<Page<LogicalSwitch>> {
        self.get_page("/logical-switches", cursor).await
    }

    async fn get_logical_switch_state(&self, id: &str) -> ApiResult<LogicalSwitchState> {
        self.get_json(&format!("/logical-switches/{}/state", id), &[])
            .await
    }
}

#[async_trait]
impl LogicalRouterApi for HttpClient {
    async fn list_logical_routers(&self) -> ApiResult<Vec<LogicalRouter>> {
        self.get_list("/logical-routers").await
    }

    async fn get_nat_statistics(&self, router_id: &str) -> ApiResult<NatStatistics> {
        self.get_json(
            &format!("/logical-routers/{}/nat/rules/statistics", router_id),
            &[],
        )
        .await
    }
}

#[async_trait]
impl LogicalRouterPortApi for HttpClient {
    async fn list_logical_router_ports(&self) -> ApiResult<Vec<LogicalRouterPort>> {
        self.get_list("/logical-router-ports").await
    }

    async fn get_logical_router_port_statistics(
        &self,
        id: &str,
    ) -> ApiResult<LogicalRouterPortStatistics> {
        self.get_json(&format!("/logical-router-ports/{}/statistics", id), &[])
            .await
    }
}

#[async_trait]
impl LoadBalancerApi for HttpClient {
    async fn list_load_balancers(&self, cursor: &str) -> ApiResult<Page<LoadBalancerService>> {
        self.get_page("/loadbalancer/services", cursor).await
    }

    async fn get_load_balancer_status(&self, id: &str) -> ApiResult<LoadBalancerServiceStatus> {
        self.get_json(&format!("/loadbalancer/services/{}/status", id), &[])
            .await
    }
}

#[async_trait]
impl FirewallApi for HttpClient {
    async fn list_firewall_sections(&self) -> ApiResult<Vec<FirewallSection>> {
        self.get_list("/firewall/sections").await
    }

    async fn list_firewall_rules(&self, section_id: &str) -> ApiResult<Vec<FirewallRule>> {
        self.get_list(&format!("/firewall/sections/{}/rules", section_id))
            .await
    }

    async fn get_firewall_rule_stats(
        &self,
        section_id: &str,
        rule_id: &str,
    ) -> ApiResult<FirewallRuleStats> {
        self.get_json(
            &format!("/firewall/sections/{}/rules/{}/stats", section_id, rule_id),
            &[],
        )
        .await
    }
}

#[async_trait]
impl DhcpApi for HttpClient {
    async fn list_dhcp_servers(&self, cursor: &str) -> ApiResult<Page<DhcpServer>> {
        self.get_page("/dhcp/servers", cursor).await
    }

    async fn get_dhcp_server_status(&self, id: &str) -> ApiResult<DhcpServerStatus> {
        self.get_json(&format!("/dhcp/servers/{}/status", id), &[])
            .await
    }
}

#[async_trait]
impl TransportNodeApi for HttpClient {
    async fn list_transport_nodes(&self, cursor: &str) -> ApiResult<Page<TransportNode>> {
        self.get_page("/transport-nodes", cursor).await
    }

    async fn get_transport_node_status(&self, id: &str) -> ApiResult<TransportNodeStatus> {
        self.get_json(&format!("/transport-nodes/{}/status", id), &[])
            .await
    }
}

#[async_trait]
impl TransportZoneApi for HttpClient {
    async fn list_transport_zones(&self) -> ApiResult<Vec<TransportZone>> {
        self.get_list("/transport-zones").await
    }

    async fn get_transport_zone_summary(&self, id: &str) -> ApiResult<TransportZoneSummary> {
        self.get_json(&format!("/transport-zones/{}/summary", id), &[])
            .await
    }
}

#[async_trait]
impl SystemApi for HttpClient {
    async fn get_cluster_status(&self) -> ApiResult<ClusterStatus> {
        self.get_json("/cluster/status", &[]).await
    }

    async fn list_cluster_nodes(&self) -> ApiResult<Vec<ClusterNode>> {
        self.get_list("/cluster/nodes").await
    }

    async fn get_cluster_node_status(&self, id: &str) -> ApiResult<ClusterNodeStatus> {
        self.get_json(&format!("/cluster/nodes/{}/status", id), &[])
            .await
    }

    async fn get_node_service_status(&self, service: &str) -> ApiResult<NodeServiceStatus> {
        self.get_json(&format!("/node/services/{}/status", service), &[])
            .await
    }
}
