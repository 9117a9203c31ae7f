//! Web server module for the Snowflake exporter.
//!
//! Serves a landing page, the Prometheus telemetry path and a liveness probe.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use prometheus::Registry;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::collector::{Collector, gather};
use crate::config::HEALTH_PATH;
use crate::exposition::{self, TEXT_CONTENT_TYPE};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Source scraped on every telemetry request.
    pub collector: Arc<dyn Collector>,
    /// Exporter self-metrics (build info).
    pub registry: Registry,
    /// Path serving metrics (e.g. "/metrics").
    pub telemetry_path: String,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Landing page linking the telemetry path.
fn landing_page(telemetry_path: &str) -> String {
    format!(
        "<html>\n\
<head><title>Snowflake exporter</title></head>\n\
\t<body>\n\
\t\t<h1>Snowflake exporter</h1>\n\
\t\t<p><a href='{telemetry_path}'>Metrics</a></p>\n\
\t</body>\n\
</html>"
    )
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let telemetry_path = state.telemetry_path.clone();
    let app_state = Arc::new(state);

    Router::new()
        .route("/", get(landing_handler))
        .route(HEALTH_PATH, get(healthz_handler))
        .route(&telemetry_path, get(metrics_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(app_state)
}

/// Landing page handler.
async fn landing_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(landing_page(&state.telemetry_path))
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Run one scrape and render it in Prometheus text format.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let samples = gather(state.collector.as_ref()).await;

    match exposition::encode(&state.registry, &samples) {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}
