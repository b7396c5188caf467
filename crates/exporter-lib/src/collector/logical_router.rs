//! Logical router NAT statistics

use super::{join_details, list_failed, CollectStats, Collector};
use crate::client::LogicalRouterApi;
use crate::error::CollectError;
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{LogicalRouter, NatStatistics};
use crate::observability::StructuredLogger;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "logical_router";

const LABELS: &[&str] = &["id", "name", "router_type"];

pub struct LogicalRouterCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    nat_packets: Arc<MetricDesc>,
    nat_bytes: Arc<MetricDesc>,
    nat_sessions: Arc<MetricDesc>,
}

impl<A: LogicalRouterApi + ?Sized + 'static> LogicalRouterCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            nat_packets: MetricDesc::new(
                "logical_router_nat_total_packets",
                "Packets matched by the NAT rules of the logical router",
                LABELS,
            )?,
            nat_bytes: MetricDesc::new(
                "logical_router_nat_total_bytes",
                "Bytes matched by the NAT rules of the logical router",
                LABELS,
            )?,
            nat_sessions: MetricDesc::new(
                "logical_router_nat_active_sessions",
                "Active sessions across the NAT rules of the logical router",
                LABELS,
            )?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }
}

#[async_trait]
impl<A: LogicalRouterApi + ?Sized + 'static> Collector for LogicalRouterCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![
            self.nat_packets.clone(),
            self.nat_bytes.clone(),
            self.nat_sessions.clone(),
        ]
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let api = &self.api;

        let routers = api
            .list_logical_routers()
            .await
            .map_err(|e| list_failed(&self.logger, "logical routers", e))?;

        Ok(join_details(
            &self.logger,
            "logical router",
            &routers,
            |router| router.id.as_str(),
            |id| async move { api.get_nat_statistics(&id).await },
            |router: &LogicalRouter, stats: NatStatistics| {
                let labels = [&router.id, &router.display_name, &router.router_type];
                let (packets, bytes, sessions) = stats.totals();
                sink.emit(&self.nat_packets, packets as f64, &labels);
                sink.emit(&self.nat_bytes, bytes as f64, &labels);
                sink.emit(&self.nat_sessions, sessions as f64, &labels);
            },
        )
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult};
    use crate::models::NatRuleStatistics;

    struct MockRouters;

    #[async_trait]
    impl LogicalRouterApi for MockRouters {
        async fn list_logical_routers(&self) -> ApiResult<Vec<LogicalRouter>> {
            Ok(vec![
                LogicalRouter { id: "t0".into(), display_name: "tier0".into(), router_type: "TIER0".into() },
                LogicalRouter { id: "t1".into(), display_name: "tier1".into(), router_type: "TIER1".into() },
            ])
        }

        async fn get_nat_statistics(&self, router_id: &str) -> ApiResult<NatStatistics> {
            if router_id == "t0" {
                return Err(ApiError::Other("NAT not supported".into()));
            }
            Ok(NatStatistics {
                statistics_for_rules: vec![
                    NatRuleStatistics { rule_id: "1".into(), total_bytes: 1000, total_packets: 10, active_sessions: 2 },
                    NatRuleStatistics { rule_id: "2".into(), total_bytes: 500, total_packets: 5, active_sessions: 1 },
                ],
            })
        }
    }

    #[tokio::test]
    async fn test_nat_totals_per_router() {
        let collector =
            LogicalRouterCollector::new(Arc::new(MockRouters), StructuredLogger::new(NAME)).unwrap();
        let (sink, mut rx) = SampleSink::channel();

        let stats = collector.collect(&sink).await.unwrap();
        drop(sink);

        let mut values = Vec::new();
        while let Some(sample) = rx.recv().await {
            assert_eq!(sample.label("id"), Some("t1"));
            assert_eq!(sample.label("router_type"), Some("TIER1"));
            values.push((sample.desc.fq_name().to_string(), sample.value));
        }

        assert_eq!(stats, CollectStats { objects: 1, skipped: 1 });
        assert_eq!(
            values,
            vec![
                ("nsxt_logical_router_nat_total_packets".to_string(), 15.0),
                ("nsxt_logical_router_nat_total_bytes".to_string(), 1500.0),
                ("nsxt_logical_router_nat_active_sessions".to_string(), 3.0),
            ]
        );
    }

    struct RoutersDown;

    #[async_trait]
    impl LogicalRouterApi for RoutersDown {
        async fn list_logical_routers(&self) -> ApiResult<Vec<LogicalRouter>> {
            Err(ApiError::Other("connection reset".into()))
        }

        async fn get_nat_statistics(&self, _router_id: &str) -> ApiResult<NatStatistics> {
            unreachable!("NAT fetched without routers")
        }
    }

    #[tokio::test]
    async fn test_router_list_failure() {
        let collector =
            LogicalRouterCollector::new(Arc::new(RoutersDown), StructuredLogger::new(NAME)).unwrap();
        let (sink, mut rx) = SampleSink::channel();

        let result = collector.collect(&sink).await;
        drop(sink);

        assert!(matches!(
            result,
            Err(CollectError::List { object: "logical routers", .. })
        ));
        assert!(rx.recv().await.is_none());
    }
}
