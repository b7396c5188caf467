//! DHCP server service status

use super::{join_details, list_failed, paginate, CollectStats, Collector};
use crate::client::DhcpApi;
use crate::error::CollectError;
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{DhcpServer, DhcpServerStatus};
use crate::observability::StructuredLogger;
use crate::status::{DhcpStatus, StatusVocabulary};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "dhcp";

pub struct DhcpCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    status: Arc<MetricDesc>,
}

impl<A: DhcpApi + ?Sized + 'static> DhcpCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            status: MetricDesc::new(
                "dhcp_server_status",
                "Service status of the DHCP server (one sample per possible status)",
                &["id", "name", "status"],
            )?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }
}

#[async_trait]
impl<A: DhcpApi + ?Sized + 'static> Collector for DhcpCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![self.status.clone()]
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let api = &self.api;

        let servers = paginate(|cursor| async move { api.list_dhcp_servers(&cursor).await })
            .await
            .map_err(|e| list_failed(&self.logger, "DHCP servers", e))?;

        Ok(join_details(
            &self.logger,
            "DHCP server",
            &servers,
            |server| server.id.as_str(),
            |id| async move { api.get_dhcp_server_status(&id).await },
            |server: &DhcpServer, status: DhcpServerStatus| {
                sink.emit_one_hot(
                    &self.status,
                    &DhcpStatus::one_hot(&status.service_status),
                    &[&server.id, &server.display_name],
                );
            },
        )
        .await)
    }
}
