//! NSX-T object collectors
//!
//! One collector per object family. Every scrape each collector lists its
//! objects, fetches a detail record per object and emits gauge samples. A
//! failed list call drops the whole family for that scrape; a failed detail
//! call drops only that object.

mod aggregator;
mod registry;

pub mod dhcp;
pub mod firewall;
pub mod load_balancer;
pub mod logical_port;
pub mod logical_router;
pub mod logical_router_port;
pub mod logical_switch;
pub mod system;
pub mod transport_node;
pub mod transport_zone;


pub use aggregator::{Aggregator, CollectorOutcome, ScrapeReport};
pub use registry::{default_registry, CollectorFactory, Registry};

use crate::error::{ApiError, ApiResult, CollectError};
use crate::metrics::{MetricDesc, SampleSink};
use crate::models::Page;
use crate::observability::StructuredLogger;
use std::future::Future;
use std::sync::Arc;

pub use async_trait::async_trait;

/// Counters for one collector run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Objects that produced samples
    pub objects: usize,
    /// Objects dropped because their detail call failed
    pub skipped: usize,
}

impl CollectStats {
    pub fn merge(&mut self, other: CollectStats) {
        self.objects += other.objects;
        self.skipped += other.skipped;
    }
}

/// Trait for one object family's metrics
#[async_trait]
pub trait Collector: Send + Sync {
    /// Every descriptor this collector can emit; fixed for its lifetime
    fn describe(&self) -> Vec<Arc<MetricDesc>>;

    /// Fetch, normalize and emit all samples for one scrape
    async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError>;
}

/// Follow list cursors until the API returns an empty one.
///
/// All pages are accumulated before returning; any page failure fails the
/// whole listing.
pub async fn paginate<T, F, Fut>(mut fetch: F) -> ApiResult<Vec<T>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor = String::new();

    loop {
        let page = fetch(cursor).await?;
        items.extend(page.results);
        if page.cursor.is_empty() {
            return Ok(items);
        }
        cursor = page.cursor;
    }
}

/// Fetch one detail record per item, sequentially and in listing order.
///
/// `fetch` receives the item ID. Items whose fetch fails are logged and
/// skipped; the rest are handed to `emit` together with their detail.
pub async fn join_details<T, D, F, Fut>(
    logger: &StructuredLogger,
    object: &str,
    items: &[T],
    id_of: impl Fn(&T) -> &str,
    mut fetch: F,
    mut emit: impl FnMut(&T, D),
) -> CollectStats
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ApiResult<D>>,
{
    let mut stats = CollectStats::default();

    for item in items {
        let id = id_of(item);
        match fetch(id.to_string()).await {
            Ok(detail) => {
                emit(item, detail);
                stats.objects += 1;
            }
            Err(e) => {
                logger.log_status_failure(object, id, &e);
                stats.skipped += 1;
            }
        }
    }

    stats
}

/// Log a failed list call and turn it into the family's collect error
pub fn list_failed(logger: &StructuredLogger, object: &'static str, err: ApiError) -> CollectError {
    logger.log_list_failure(object, &err);
    CollectError::list(logger.collector(), object, err)
}
