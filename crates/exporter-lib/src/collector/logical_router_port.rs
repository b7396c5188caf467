//! Logical router port rx/tx counters, per transport node

use super::{join_details, list_failed, CollectStats, Collector};
use crate::client::LogicalRouterPortApi;
use crate::error::CollectError;
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{InterfaceCounters, LogicalRouterPort, LogicalRouterPortStatistics};
use crate::observability::StructuredLogger;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "logical_router_port";

const LABELS: &[&str] = &["id", "name", "logical_router_id", "transport_node_id"];

/// Bytes, packets and dropped packets for one direction
struct DirectionDescs {
    bytes: Arc<MetricDesc>,
    packets: Arc<MetricDesc>,
    dropped: Arc<MetricDesc>,
}

impl DirectionDescs {
    fn new(direction: &str, verb: &str) -> Result<Self> {
        Ok(Self {
            bytes: MetricDesc::new(
                &format!("logical_router_port_{direction}_bytes"),
                &format!("Bytes {verb} by the logical router port"),
                LABELS,
            )?,
            packets: MetricDesc::new(
                &format!("logical_router_port_{direction}_packets"),
                &format!("Packets {verb} by the logical router port"),
                LABELS,
            )?,
            dropped: MetricDesc::new(
                &format!("logical_router_port_{direction}_dropped_packets"),
                &format!("Packets dropped while {verb} by the logical router port"),
                LABELS,
            )?,
        })
    }

    fn emit(&self, sink: &SampleSink, counters: &InterfaceCounters, labels: &[&str]) {
        sink.emit(&self.bytes, counters.total_bytes as f64, labels);
        sink.emit(&self.packets, counters.total_packets as f64, labels);
        sink.emit(&self.dropped, counters.dropped_packets as f64, labels);
    }

    fn all(&self) -> [Arc<MetricDesc>; 3] {
        [self.bytes.clone(), self.packets.clone(), self.dropped.clone()]
    }
}

pub struct LogicalRouterPortCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    rx: DirectionDescs,
    tx: DirectionDescs,
}

impl<A: LogicalRouterPortApi + ?Sized + 'static> LogicalRouterPortCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            rx: DirectionDescs::new("rx", "received")?,
            tx: DirectionDescs::new("tx", "transmitted")?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }
}

#[async_trait]
impl<A: LogicalRouterPortApi + ?Sized + 'static> Collector for LogicalRouterPortCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        self.rx.all().into_iter().chain(self.tx.all()).collect()
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let api = &self.api;

        let ports = api
            .list_logical_router_ports()
            .await
            .map_err(|e| list_failed(&self.logger, "logical router ports", e))?;

        Ok(join_details(
            &self.logger,
            "logical router port",
            &ports,
            |port| port.id.as_str(),
            |id| async move { api.get_logical_router_port_statistics(&id).await },
            |port: &LogicalRouterPort, stats: LogicalRouterPortStatistics| {
                for node in &stats.per_node_statistics {
                    let labels = [
                        port.id.as_str(),
                        port.display_name.as_str(),
                        port.logical_router_id.as_str(),
                        node.transport_node_id.as_str(),
                    ];
                    self.rx.emit(sink, &node.rx, &labels);
                    self.tx.emit(sink, &node.tx, &labels);
                }
            },
        )
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult};
    use crate::models::PerNodeStatistics;

    struct MockRouterPorts;

    #[async_trait]
    impl LogicalRouterPortApi for MockRouterPorts {
        async fn list_logical_router_ports(&self) -> ApiResult<Vec<LogicalRouterPort>> {
            Ok(vec![LogicalRouterPort {
                id: "lrp-1".into(),
                display_name: "uplink".into(),
                logical_router_id: "t0".into(),
            }])
        }

        async fn get_logical_router_port_statistics(
            &self,
            _id: &str,
        ) -> ApiResult<LogicalRouterPortStatistics> {
            let counters = |base: i64| InterfaceCounters {
                total_bytes: base * 100,
                total_packets: base,
                dropped_packets: base / 10,
            };
            Ok(LogicalRouterPortStatistics {
                per_node_statistics: vec![
                    PerNodeStatistics { transport_node_id: "edge-1".into(), rx: counters(10), tx: counters(20) },
                    PerNodeStatistics { transport_node_id: "edge-2".into(), rx: counters(30), tx: counters(40) },
                ],
            })
        }
    }

    #[tokio::test]
    async fn test_counters_per_transport_node() {
        let collector =
            LogicalRouterPortCollector::new(Arc::new(MockRouterPorts), StructuredLogger::new(NAME))
                .unwrap();
        let (sink, mut rx) = SampleSink::channel();

        collector.collect(&sink).await.unwrap();
        drop(sink);

        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }

        // 2 nodes x 2 directions x 3 counters
        assert_eq!(samples.len(), 12);
        let edge2_tx_bytes = samples
            .iter()
            .find(|s| {
                s.desc.fq_name() == "nsxt_logical_router_port_tx_bytes"
                    && s.label("transport_node_id") == Some("edge-2")
            })
            .unwrap();
        assert_eq!(edge2_tx_bytes.value, 4000.0);
        assert_eq!(edge2_tx_bytes.label("logical_router_id"), Some("t0"));
        assert_eq!(collector.describe().len(), 6);
    }

    struct RouterPortsDown;

    #[async_trait]
    impl LogicalRouterPortApi for RouterPortsDown {
        async fn list_logical_router_ports(&self) -> ApiResult<Vec<LogicalRouterPort>> {
            Err(ApiError::Status { status: 500, body: "internal error".into() })
        }

        async fn get_logical_router_port_statistics(
            &self,
            _id: &str,
        ) -> ApiResult<LogicalRouterPortStatistics> {
            unreachable!("statistics fetched without ports")
        }
    }

    #[tokio::test]
    async fn test_router_port_list_failure() {
        let collector =
            LogicalRouterPortCollector::new(Arc::new(RouterPortsDown), StructuredLogger::new(NAME))
                .unwrap();
        let (sink, mut rx) = SampleSink::channel();

        let result = collector.collect(&sink).await;
        drop(sink);

        assert!(matches!(
            result,
            Err(CollectError::List { object: "logical router ports", .. })
        ));
        assert!(rx.recv().await.is_none());
    }
}
