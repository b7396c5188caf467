//! End-to-end tests of the collection pipeline
//!
//! A mock manager drives real collectors through the registry and the
//! aggregator, and one test goes through the HTTP client against mockito.

use async_trait::async_trait;
use exporter_lib::client::{LogicalPortApi, TransportNodeApi};
use exporter_lib::collector::{logical_port, transport_node};
use exporter_lib::models::{
    LogicalPort, LogicalPortStatus, Page, TransportNode, TransportNodeStatus,
};
use exporter_lib::{
    default_registry, Aggregator, ApiError, ApiResult, ClientConfig, CollectError, HttpClient,
    NsxtApi, Registry, Sample,
};
use std::sync::Arc;

struct MockManager {
    nodes_available: bool,
}

#[async_trait]
impl LogicalPortApi for MockManager {
    async fn list_logical_ports(&self, cursor: &str) -> ApiResult<Page<LogicalPort>> {
        let port = |id: &str| LogicalPort {
            id: id.to_string(),
            display_name: format!("port-{id}"),
            logical_switch_id: "ls-1".to_string(),
        };
        Ok(match cursor {
            "" => Page {
                results: vec![port("p1")],
                cursor: "next".to_string(),
            },
            _ => Page {
                results: vec![port("p2")],
                cursor: String::new(),
            },
        })
    }

    async fn get_logical_port_status(&self, id: &str) -> ApiResult<LogicalPortStatus> {
        let status = if id == "p1" { "UP" } else { "Down" };
        Ok(LogicalPortStatus {
            status: status.to_string(),
        })
    }
}

#[async_trait]
impl TransportNodeApi for MockManager {
    async fn list_transport_nodes(&self, _cursor: &str) -> ApiResult<Page<TransportNode>> {
        if !self.nodes_available {
            return Err(ApiError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(Page {
            results: vec![TransportNode {
                id: "tn-1".to_string(),
                display_name: "esx-01".to_string(),
            }],
            cursor: String::new(),
        })
    }

    async fn get_transport_node_status(&self, _id: &str) -> ApiResult<TransportNodeStatus> {
        Ok(TransportNodeStatus {
            status: "degraded".to_string(),
        })
    }
}

fn aggregator(api: MockManager) -> Aggregator {
    let mut registry: Registry<MockManager> = Registry::new();
    registry.register(
        logical_port::NAME,
        logical_port::LogicalPortCollector::<MockManager>::factory,
    );
    registry.register(
        transport_node::NAME,
        transport_node::TransportNodeCollector::<MockManager>::factory,
    );
    Aggregator::new(&registry, Arc::new(api)).unwrap()
}

fn value(samples: &[Sample], metric: &str, id: &str, status: &str) -> Option<f64> {
    samples
        .iter()
        .find(|s| {
            s.desc.fq_name() == metric && s.label("id") == Some(id) && s.label("status") == Some(status)
        })
        .map(|s| s.value)
}

#[tokio::test]
async fn test_scrape_emits_one_hot_status_for_every_family() {
    let report = aggregator(MockManager {
        nodes_available: true,
    })
    .collect()
    .await;

    assert_eq!(report.errors().count(), 0);
    // 2 ports x 3 statuses + 1 node x 4 states
    assert_eq!(report.samples.len(), 10);

    let port = "nsxt_logical_port_status";
    assert_eq!(value(&report.samples, port, "p1", "UP"), Some(1.0));
    assert_eq!(value(&report.samples, port, "p1", "DOWN"), Some(0.0));
    assert_eq!(value(&report.samples, port, "p2", "DOWN"), Some(1.0));
    assert_eq!(value(&report.samples, port, "p2", "UNKNOWN"), Some(0.0));

    let node = "nsxt_transport_node_status";
    assert_eq!(value(&report.samples, node, "tn-1", "DEGRADED"), Some(1.0));
    assert_eq!(value(&report.samples, node, "tn-1", "UP"), Some(0.0));
}

#[tokio::test]
async fn test_list_failure_is_isolated_to_its_family() {
    let report = aggregator(MockManager {
        nodes_available: false,
    })
    .collect()
    .await;

    assert_eq!(report.samples.len(), 6);
    assert!(report
        .samples
        .iter()
        .all(|s| s.desc.fq_name() == "nsxt_logical_port_status"));

    let errors: Vec<&CollectError> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        CollectError::List { collector, .. } if collector == "transport_node"
    ));

    let families = report.families();
    assert_eq!(families.len(), 1);
    assert_eq!(families[0].get_metric().len(), 6);
}

#[tokio::test]
async fn test_http_pipeline_against_manager() {
    let mut server = mockito::Server::new_async().await;

    let _ports = server
        .mock("GET", "/api/v1/logical-ports")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"results":[{"id":"p1","display_name":"web","logical_switch_id":"ls-1"}],"cursor":""}"#,
        )
        .create_async()
        .await;
    let _status = server
        .mock("GET", "/api/v1/logical-ports/p1/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"up"}"#)
        .create_async()
        .await;

    let client = HttpClient::new(&ClientConfig {
        host: server.url(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        insecure: false,
    })
    .unwrap();
    let api: Arc<dyn NsxtApi> = Arc::new(client);

    let mut registry = default_registry();
    registry.retain(|key| key == logical_port::NAME);
    let report = Aggregator::new(&registry, api).unwrap().collect().await;

    assert_eq!(report.errors().count(), 0);
    assert_eq!(
        value(&report.samples, "nsxt_logical_port_status", "p1", "UP"),
        Some(1.0)
    );
    assert_eq!(report.samples.len(), 3);
}
