//! Transport zone object counts

use super::{join_details, list_failed, CollectStats, Collector};
use crate::client::TransportZoneApi;
use crate::error::CollectError;
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{TransportZone, TransportZoneSummary};
use crate::observability::StructuredLogger;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "transport_zone";

const LABELS: &[&str] = &["id", "name"];

pub struct TransportZoneCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    logical_ports: Arc<MetricDesc>,
    logical_switches: Arc<MetricDesc>,
    transport_nodes: Arc<MetricDesc>,
}

impl<A: TransportZoneApi + ?Sized + 'static> TransportZoneCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            logical_ports: MetricDesc::new(
                "transport_zone_logical_ports",
                "Number of logical ports in the transport zone",
                LABELS,
            )?,
            logical_switches: MetricDesc::new(
                "transport_zone_logical_switches",
                "Number of logical switches in the transport zone",
                LABELS,
            )?,
            transport_nodes: MetricDesc::new(
                "transport_zone_transport_nodes",
                "Number of transport nodes in the transport zone",
                LABELS,
            )?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }
}

#[async_trait]
impl<A: TransportZoneApi + ?Sized + 'static> Collector for TransportZoneCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![
            self.logical_ports.clone(),
            self.logical_switches.clone(),
            self.transport_nodes.clone(),
        ]
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let api = &self.api;

        let zones = api
            .list_transport_zones()
            .await
            .map_err(|e| list_failed(&self.logger, "transport zones", e))?;

        Ok(join_details(
            &self.logger,
            "transport zone",
            &zones,
            |zone| zone.id.as_str(),
            |id| async move { api.get_transport_zone_summary(&id).await },
            |zone: &TransportZone, summary: TransportZoneSummary| {
                let labels = [&zone.id, &zone.display_name];
                sink.emit(&self.logical_ports, summary.num_logical_ports as f64, &labels);
                sink.emit(&self.logical_switches, summary.num_logical_switches as f64, &labels);
                sink.emit(&self.transport_nodes, summary.num_transport_nodes as f64, &labels);
            },
        )
        .await)
    }
}
