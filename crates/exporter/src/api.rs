//! HTTP API for health checks and Prometheus metrics

use exporter_lib::{
    health::{ComponentStatus, HealthRegistry},
    Aggregator,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared application state
pub struct AppState {
    pub aggregator: Aggregator,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(aggregator: Aggregator, health_registry: HealthRegistry) -> Self {
        Self {
            aggregator,
            health_registry,
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint; every request is one scrape of the manager
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let report = state.aggregator.collect().await;
    state.health_registry.record_scrape(&report).await;

    let failed = report.errors().count();
    if failed > 0 {
        warn!(failed_collectors = failed, "Scrape completed with failed collectors");
    }

    let mut metric_families = report.families();
    metric_families.extend(prometheus::gather());

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use exporter_lib::{
        collector::{async_trait, CollectStats, Collector},
        CollectError, MetricDesc, SampleSink,
    };
    use tower::ServiceExt;

    struct StaticCollector {
        desc: Arc<MetricDesc>,
        panic: bool,
    }

    #[async_trait]
    impl Collector for StaticCollector {
        fn describe(&self) -> Vec<Arc<MetricDesc>> {
            vec![self.desc.clone()]
        }

        async fn collect(&self, sink: &SampleSink) -> Result<CollectStats, CollectError> {
            if self.panic {
                panic!("static collector failure");
            }
            sink.emit(&self.desc, 1.0, &["edge-1"]);
            Ok(CollectStats { objects: 1, skipped: 0 })
        }
    }

    async fn setup_test_app(panic: bool) -> (Router, Arc<AppState>) {
        let desc = MetricDesc::new(
            "test_transport_node_up",
            "Static test gauge",
            &["id"],
        )
        .unwrap();
        let aggregator = Aggregator::from_collectors(vec![(
            "static".to_string(),
            Box::new(StaticCollector { desc, panic }) as Box<dyn Collector>,
        )]);

        let health_registry = HealthRegistry::new();
        health_registry.register("static").await;
        health_registry.set_ready(true).await;

        let state = Arc::new(AppState::new(aggregator, health_registry));
        (create_router(state.clone()), state)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_endpoint_scrapes_collectors() {
        let (app, _) = setup_test_app(false).await;

        let (status, body) = get(app, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("# TYPE nsxt_test_transport_node_up gauge"));
        assert!(body.contains(r#"nsxt_test_transport_node_up{id="edge-1"} 1"#));
        assert!(body.contains("nsxt_exporter_collector_duration_seconds"));
    }

    #[tokio::test]
    async fn test_healthz_ok() {
        let (app, _) = setup_test_app(false).await;

        let (status, body) = get(app, "/healthz").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_panicking_collector_marks_unhealthy() {
        let (app, state) = setup_test_app(true).await;

        let (status, _) = get(app.clone(), "/metrics").await;
        assert_eq!(status, StatusCode::OK);

        let health = state.health_registry.health().await;
        assert_eq!(health.components["static"].status, ComponentStatus::Unhealthy);

        let (status, _) = get(app.clone(), "/healthz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let (status, _) = get(app, "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_readyz_before_startup() {
        let aggregator = Aggregator::from_collectors(Vec::new());
        let state = Arc::new(AppState::new(aggregator, HealthRegistry::new()));

        let (status, body) = get(create_router(state), "/readyz").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("not yet initialized"));
    }
}
