//! Logical port operational status
//!
//! Pages through `/logical-ports` and reads `/logical-ports/{id}/status`
//! for every port.

use super::{join_details, list_failed, paginate, CollectStats, Collector};
use crate::client::LogicalPortApi;
use crate::error::CollectError;
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{LogicalPort, LogicalPortStatus};
use crate::observability::StructuredLogger;
use crate::status::{PortStatus, StatusVocabulary};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "logical_port";

/// Collector for logical port status
pub struct LogicalPortCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    status: Arc<MetricDesc>,
}

impl<A: LogicalPortApi + ?Sized + 'static> LogicalPortCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            status: MetricDesc::new(
                "logical_port_status",
                "Status of the logical port (one sample per possible status)",
                &["id", "name", "logical_switch_id", "status"],
            )?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }
}

#[async_trait]
impl<A: LogicalPortApi + ?Sized + 'static> Collector for LogicalPortCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![self.status.clone()]
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let api = &self.api;

        let ports = paginate(|cursor| async move { api.list_logical_ports(&cursor).await })
            .await
            .map_err(|e| list_failed(&self.logger, "logical ports", e))?;

        let stats = join_details(
            &self.logger,
            "logical port",
            &ports,
            |port| port.id.as_str(),
            |id| async move { api.get_logical_port_status(&id).await },
            |port: &LogicalPort, status: LogicalPortStatus| {
                sink.emit_one_hot(
                    &self.status,
                    &PortStatus::one_hot(&status.status),
                    &[&port.id, &port.display_name, &port.logical_switch_id],
                );
            },
        )
        .await;

        Ok(stats)
    }
}
