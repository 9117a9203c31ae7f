//! HTTP Integration Tests for the Snowflake exporter
//!
//! Serves the router on a random port, backed by in-memory connections.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use snowflake_exporter::collector::queries;
use snowflake_exporter::exposition::build_info_registry;
use snowflake_exporter::server::{AppState, create_router};
use snowflake_exporter::{SnowflakeCollector, SnowflakeConfig};
use tokio::net::TcpListener;
use tower::ServiceExt;

use common::{StaticConnection, StaticProvider, snowflake_config};

// =============================================================================
// Test Helpers
// =============================================================================

fn create_test_state(
    config: SnowflakeConfig,
    provider: StaticProvider,
    telemetry_path: &str,
) -> AppState {
    AppState {
        collector: Arc::new(SnowflakeCollector::with_provider(config, Arc::new(provider))),
        registry: build_info_registry().expect("Failed to build registry"),
        telemetry_path: telemetry_path.to_string(),
    }
}

/// Start test server and return base URL.
async fn start_test_server(state: AppState) -> String {
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn body_text(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Metrics Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_metrics_healthy_scrape() {
    let connection = Arc::new(StaticConnection::healthy());
    let provider = StaticProvider {
        connection: Some(connection.clone()),
    };
    let base_url = start_test_server(create_test_state(snowflake_config(), provider, "/metrics")).await;

    let resp = reqwest::get(format!("{}/metrics", base_url))
        .await
        .expect("Failed to send metrics request");
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "text/plain; version=0.0.4"
    );

    let text = resp.text().await.unwrap();
    assert!(text.contains("\nsnowflake_up 1\n"));
    assert!(text.contains("snowflake_storage_bytes 1028"));
    assert!(text.contains(r#"snowflake_database_bytes{name="mock_db",id="1"} 1028"#));
    assert!(text.contains(
        r#"snowflake_login_rate{client_type="mock_client_type",client_version="1.0.0"} 10"#
    ));
    assert!(text.contains("snowflake_table_deleted_tables 12"));
    assert!(text.contains("snowflake_exporter_build_info"));
    assert_eq!(connection.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_metrics_partial_failure() {
    // Only aggregate storage answers; every other group fails.
    let connection =
        StaticConnection::default().with(queries::STORAGE, vec![snowflake_exporter::row![
            "1028.0", "2048.0", "4096.0"
        ]]);
    let state = create_test_state(
        snowflake_config(),
        StaticProvider::new(connection),
        "/metrics",
    );

    let resp = create_router(state)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let text = body_text(resp.into_body()).await;
    assert!(text.contains("\nsnowflake_up 0\n"));
    assert!(text.contains("snowflake_stage_bytes 2048"));
    assert!(!text.contains("snowflake_database_bytes"));
}

#[tokio::test]
async fn test_metrics_unreachable_account() {
    let state = create_test_state(snowflake_config(), StaticProvider::unreachable(), "/metrics");

    let resp = create_router(state)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let text = body_text(resp.into_body()).await;
    assert!(text.contains("\nsnowflake_up 0\n"));
    assert!(!text.contains("snowflake_storage_bytes"));
}

#[tokio::test]
async fn test_metrics_exclude_deleted_tables() {
    let config = SnowflakeConfig {
        exclude_deleted_tables: true,
        ..snowflake_config()
    };
    let state = create_test_state(
        config,
        StaticProvider::new(StaticConnection::healthy()),
        "/metrics",
    );

    let resp = create_router(state)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let text = body_text(resp.into_body()).await;
    assert!(text.contains("\nsnowflake_up 1\n"));
    assert!(text.contains("snowflake_table_active_bytes"));
    assert!(!text.contains("snowflake_table_deleted_tables"));
}

#[tokio::test]
async fn test_custom_telemetry_path() {
    let state = create_test_state(
        snowflake_config(),
        StaticProvider::new(StaticConnection::healthy()),
        "/snowflake",
    );
    let base_url = start_test_server(state).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/snowflake", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("snowflake_up 1"));

    let resp = client
        .get(format!("{}/metrics", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client.get(&base_url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("<a href='/snowflake'>Metrics</a>")
    );
}

// =============================================================================
// Health Probe Tests
// =============================================================================

#[tokio::test]
async fn test_healthz() {
    let state = create_test_state(snowflake_config(), StaticProvider::unreachable(), "/metrics");
    let base_url = start_test_server(state).await;

    let resp = reqwest::get(format!("{}/healthz", base_url))
        .await
        .expect("Failed to send healthz request");
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse healthz response");
    assert_eq!(body["status"], "ok");
}
