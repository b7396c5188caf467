//! NSX-T exporter library
//!
//! This crate provides the core functionality for:
//! - Reading the NSX-T manager REST API
//! - Normalizing object status strings into one-hot gauges
//! - Per-family collectors and their concurrent aggregation
//! - Health checks and observability

pub mod client;
pub mod collector;
pub mod error;
pub mod health;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod status;

pub use client::{ClientConfig, HttpClient, NsxtApi};
pub use collector::{default_registry, Aggregator, Collector, Registry, ScrapeReport};
pub use error::{ApiError, ApiResult, CollectError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use metrics::{MetricDesc, Sample, SampleSink};
pub use observability::{ExporterMetrics, StructuredLogger};
pub use status::{normalize, StatusVocabulary};
