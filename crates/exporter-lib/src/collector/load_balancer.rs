//! Load balancer service, pool and pool member status
//!
//! One status call per load balancer service returns the whole tree: the
//! service status, its pools and each pool's members. Every tier is exported
//! as its own one-hot gauge, with labels accumulating the parent IDs.

use super::{join_details, list_failed, paginate, CollectStats, Collector};
use crate::client::LoadBalancerApi;
use crate::error::CollectError;
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::{LoadBalancerService, LoadBalancerServiceStatus};
use crate::observability::StructuredLogger;
use crate::status::{LoadBalancerStatus, PoolMemberStatus, PoolStatus, StatusVocabulary};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "load_balancer";

pub struct LoadBalancerCollector<A: ?Sized> {
    api: Arc<A>,
    logger: StructuredLogger,
    service_status: Arc<MetricDesc>,
    pool_status: Arc<MetricDesc>,
    member_status: Arc<MetricDesc>,
}

impl<A: LoadBalancerApi + ?Sized + 'static> LoadBalancerCollector<A> {
    pub fn new(api: Arc<A>, logger: StructuredLogger) -> Result<Self> {
        Ok(Self {
            api,
            logger,
            service_status: MetricDesc::new(
                "load_balancer_status",
                "Status of the load balancer service (one sample per possible status)",
                &["id", "name", "status"],
            )?,
            pool_status: MetricDesc::new(
                "load_balancer_pool_status",
                "Status of the load balancer pool (one sample per possible status)",
                &["id", "load_balancer_id", "status"],
            )?,
            member_status: MetricDesc::new(
                "load_balancer_pool_member_status",
                "Status of the load balancer pool member (one sample per possible status)",
                &["ip_address", "port", "pool_id", "load_balancer_id", "status"],
            )?,
        })
    }

    pub fn factory(api: Arc<A>, logger: StructuredLogger) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Self::new(api, logger)?))
    }

    fn emit_tree(&self, sink: &SampleSink, service: &LoadBalancerService, status: &LoadBalancerServiceStatus) {
        sink.emit_one_hot(
            &self.service_status,
            &LoadBalancerStatus::one_hot(&status.service_status),
            &[&service.id, &service.display_name],
        );

        for pool in &status.pools {
            sink.emit_one_hot(
                &self.pool_status,
                &PoolStatus::one_hot(&pool.status),
                &[&pool.pool_id, &service.id],
            );

            for member in &pool.members {
                sink.emit_one_hot(
                    &self.member_status,
                    &PoolMemberStatus::one_hot(&member.status),
                    &[&member.ip_address, &member.port, &pool.pool_id, &service.id],
                );
            }
        }
    }
}

#[async_trait]
impl<A: LoadBalancerApi + ?Sized + 'static> Collector for LoadBalancerCollector<A> {
    fn describe(&self) -> Vec<Arc<MetricDesc>> {
        vec![
            self.service_status.clone(),
            self.pool_status.clone(),
            self.member_status.clone(),
        ]
    }

    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
        let api = &self.api;

        let services = paginate(|cursor| async move { api.list_load_balancers(&cursor).await })
            .await
            .map_err(|e| list_failed(&self.logger, "load balancer services", e))?;

        Ok(join_details(
            &self.logger,
            "load balancer service",
            &services,
            |service| service.id.as_str(),
            |id| async move { api.get_load_balancer_status(&id).await },
            |service: &LoadBalancerService, status: LoadBalancerServiceStatus| {
                self.emit_tree(sink, service, &status)
            },
        )
        .await)
    }
}
