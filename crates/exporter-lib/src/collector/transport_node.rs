//! Transport node status

use super::{join_details, list_failed, paginate, CollectStats, Collector};
use crate::client::TransportNodeApi;
use crate::error::CollectError;
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{TransportNode, TransportNodeStatus};
use crate::observability::StructuredLogger;
use crate::status::{StatusVocabulary, TransportNodeState};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "transport_node";

pub struct TransportNodeCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    status: Arc<MetricDesc>,
}

impl<A: TransportNodeApi + ?Sized + 'static> TransportNodeCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            status: MetricDesc::new(
                "transport_node_status",
                "Status of the transport node (one sample per possible status)",
                &["id", "name", "status"],
            )?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }
}

#[async_trait]
impl<A: TransportNodeApi + ?Sized + 'static> Collector for TransportNodeCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![self.status.clone()]
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let api = &self.api;

        let nodes = paginate(|cursor| async move { api.list_transport_nodes(&cursor).await })
            .await
            .map_err(|e| list_failed(&self.logger, "transport nodes", e))?;

        Ok(join_details(
            &self.logger,
            "transport node",
            &nodes,
            |node| node.id.as_str(),
            |id| async move { api.get_transport_node_status(&id).await },
            |node: &TransportNode, status: TransportNodeStatus| {
                sink.emit_one_hot(
                    &self.status,
                    &TransportNodeState::one_hot(&status.status),
                    &[&node.id, &node.display_name],
                );
            },
        )
        .await)
    }
}
