//! Scrape fan-out
//!
//! Runs every registered collector as its own task against one shared sink
//! and waits for all of them before handing the samples back. A collector
//! that fails or panics only loses its own samples.

use super::{CollectStats, Collector, Registry};
use crate::error::CollectError;
use crate::metrics::{encode, MetricDesc, Sample, SampleSink};
use crate::observability::{ExporterMetrics, StructuredLogger};
use anyhow::{bail, Context, Result};
use prometheus::proto::MetricFamily;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// How one collector fared during a scrape
#[derive(Debug)]
pub struct CollectorOutcome {
    pub name: String,
    pub elapsed: Duration,
    pub result: Result<CollectStats, CollectError>,
}

/// Everything produced by one scrape
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub samples: Vec<Sample>,
    pub outcomes: Vec<CollectorOutcome>,
}

impl ScrapeReport {
    pub fn errors(&self) -> impl Iterator<Item = &CollectError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// Samples grouped into Prometheus metric families
    pub fn families(&self) -> Vec<MetricFamily> {
        encode(&self.samples)
    }
}

/// Fans one scrape out to every configured collector
pub struct Aggregator {
    collectors: Vec<(String, Arc<dyn Collector>)>,
    metrics: ExporterMetrics,
}

impl Aggregator {
    /// Build one collector per registry entry, in registry order
    pub fn new<A: ?Sized>(registry: &Registry<A>, api: Arc<A>) -> Result<Self> {
        let mut collectors = Vec::with_capacity(registry.len());

        for (key, factory) in registry.entries() {
            let collector = factory(Arc::clone(&api), StructuredLogger::new(key))
                .with_context(|| format!("Failed to build collector {key}"))?;
            collectors.push((key.to_string(), collector));
        }

        let aggregator = Self::from_collectors(collectors);
        let descs = aggregator.describe();

        let mut seen = HashSet::new();
        if let Some(dup) = descs.iter().find(|d| !seen.insert(d.fq_name())) {
            bail!("Metric {} is described by more than one collector", dup.fq_name());
        }

        info!(
            collectors = aggregator.collectors.len(),
            metrics = descs.len(),
            "Collector aggregator initialized"
        );

        Ok(aggregator)
    }

    /// Wrap already-built collectors
    pub fn from_collectors(collectors: Vec<(String, Box<dyn Collector>)>) -> Self {
        Self {
            collectors: collectors
                .into_iter()
                .map(|(name, collector)| (name, Arc::from(collector)))
                .collect(),
            metrics: ExporterMetrics::new(),
        }
    }

    pub fn collector_names(&self) -> impl Iterator<Item = &str> {
        self.collectors.iter().map(|(name, _)| name.as_str())
    }

    /// Concatenated descriptors of every collector, in registry order
    pub fn describe(&self) -> Vec<Arc<MetricDesc>> {
        self.collectors
            .iter()
            .flat_map(|(_, collector)| collector.describe())
            .collect()
    }

    /// Run every collector concurrently and wait for all of them
    pub async fn collect(&self) -> ScrapeReport {
        let start = Instant::now();
        let (sink, mut rx) = SampleSink::channel();

        let mut handles = Vec::with_capacity(self.collectors.len());
        for (name, collector) in &self.collectors {
            let collector = Arc::clone(collector);
            let sink = sink.clone();

            let handle = tokio::spawn(async move {
                let started = Instant::now();
                let result = collector.collect(&sink).await;
                (result, started.elapsed())
            });
            handles.push((name.clone(), handle));
        }

        // Only the task clones keep the channel open from here on
        drop(sink);

        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let (result, elapsed) = match handle.await {
                Ok(finished) => finished,
                Err(e) => {
                    error!(collector = %name, error = %e, "Collector task failed");
                    let err = CollectError::Panicked {
                        collector: name.clone(),
                        message: panic_message(e),
                    };
                    (Err(err), start.elapsed())
                }
            };

            self.record(&name, elapsed, &result);
            outcomes.push(CollectorOutcome {
                name,
                elapsed,
                result,
            });
        }

        debug!(
            collectors = outcomes.len(),
            samples = samples.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Scrape complete"
        );

        ScrapeReport { samples, outcomes }
    }

    fn record(&self, name: &str, elapsed: Duration, result: &Result<CollectStats, CollectError>) {
        self.metrics
            .observe_collector(name, elapsed.as_secs_f64(), result.is_ok());

        if let Ok(stats) = result {
            self.metrics.add_objects_skipped(name, stats.skipped);
            StructuredLogger::new(name).log_collected(
                stats.objects,
                stats.skipped,
                elapsed.as_millis(),
            );
        }
    }
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "unknown panic".to_string()),
        Err(err) => err.to_string(),
    }
}
