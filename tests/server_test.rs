//! Server integration tests
//!
//! Serves the exporter router on localhost, backed by a fake inverter.

mod common;

use common::{FakeInverter, LINE_BODY, PASSWORD};
use solax_exporter::poller::Poller;
use solax_exporter::projection::{Materialization, Projection};
use solax_exporter::server::{router, setup_until_ready, AppState};
use solax_exporter::snapshot::SnapshotStore;
use solax_exporter::solax::ResponseFormat;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

fn app_state(inverter: &FakeInverter) -> AppState {
    let poller = Arc::new(Poller::new(
        inverter.client(ResponseFormat::Auto),
        SnapshotStore::new(),
    ));
    let projection = Arc::new(Projection::new(
        inverter.host(),
        Materialization::FirstSnapshot,
    ));
    AppState::new(poller, projection).expect("Failed to create app state")
}

async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.ok();
    });
    addr
}

async fn get(addr: SocketAddr, path: &str) -> (u16, String) {
    let response = reqwest::get(format!("http://{}{}", addr, path))
        .await
        .expect("Request failed");
    let status = response.status().as_u16();
    (status, response.text().await.expect("Body read failed"))
}

/// State after one successful setup cycle.
async fn ready_state(inverter: &FakeInverter) -> AppState {
    let state = app_state(inverter);
    let snapshot = state.poller.setup().await.expect("Setup failed");
    state.projection.materialize(&snapshot);
    state.apply(&Ok(snapshot));
    state
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    // Given: An exporter after a successful poll
    let inverter = FakeInverter::start(LINE_BODY).await;
    let addr = serve(ready_state(&inverter).await).await;

    // When: Scraping /metrics
    let (status, body) = get(addr, "/metrics").await;

    // Then: Output is Prometheus text with inverter readings
    assert_eq!(status, 200);
    assert!(body.contains("# HELP"));
    assert!(body.contains("# TYPE"));
    assert!(body.contains("solax_up 1"));
    assert!(body.contains("name=\"Solax Grid Power\""));
    assert!(body.contains("value=\"SX123456\""));
    assert!(body.contains("model=\"X1-Hybrid\""));
}

#[tokio::test]
async fn test_health_reflects_last_cycle() {
    // Given: A healthy exporter
    let inverter = FakeInverter::start(LINE_BODY).await;
    let state = ready_state(&inverter).await;
    let addr = serve(state.clone()).await;
    assert_eq!(get(addr, "/health").await.0, 200);

    // When: The next cycle fails
    inverter.respond(500, "");
    let result = state.poller.poll_once().await;
    state.apply(&result);

    // Then: Health reports unavailable
    let (status, body) = get(addr, "/health").await;
    assert_eq!(status, 503);
    assert!(body.contains("unreachable"));
}

#[tokio::test]
async fn test_points_endpoint_lists_data_points() {
    let inverter = FakeInverter::start(LINE_BODY).await;
    let addr = serve(ready_state(&inverter).await).await;

    let (status, body) = get(addr, "/api/points").await;
    let points: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, 200);
    let points = points.as_array().expect("array of points");
    assert_eq!(points.len(), 11);
    let voltage = points
        .iter()
        .find(|p| p["key"] == "Data_0")
        .expect("PV1 voltage present");
    assert_eq!(voltage["unique_id"], format!("{}_Data_0", inverter.host()));
    assert_eq!(voltage["value"], 230.5);
    assert_eq!(voltage["unit"], "V");
}

#[tokio::test]
async fn test_points_survive_failed_cycle() {
    // Given: An exporter with a good snapshot
    let inverter = FakeInverter::start(LINE_BODY).await;
    let state = ready_state(&inverter).await;
    let addr = serve(state.clone()).await;

    // When: A cycle fails with a non-200 status
    inverter.respond(401, "");
    let result = state.poller.poll_once().await;
    state.apply(&result);

    // Then: The previous readings are still served
    let (_, body) = get(addr, "/api/points").await;
    let points: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(points.as_array().map(Vec::len), Some(11));
}

#[tokio::test]
async fn test_points_empty_before_first_snapshot() {
    let inverter = FakeInverter::start(LINE_BODY).await;
    let addr = serve(app_state(&inverter)).await;

    let (status, body) = get(addr, "/api/points").await;

    assert_eq!(status, 200);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_device_endpoint() {
    let inverter = FakeInverter::start(LINE_BODY).await;
    let addr = serve(ready_state(&inverter).await).await;

    let (status, body) = get(addr, "/api/device").await;
    let device: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, 200);
    assert_eq!(device["manufacturer"], "Solax");
    assert_eq!(device["name"], "Solax Inverter");
    assert_eq!(device["model"], "X1-Hybrid");
    assert_eq!(device["sw_version"], "3.003.02");
}

#[tokio::test]
async fn test_device_endpoint_unavailable_before_first_snapshot() {
    let inverter = FakeInverter::start(LINE_BODY).await;
    let addr = serve(app_state(&inverter)).await;

    assert_eq!(get(addr, "/api/device").await.0, 503);
}

#[tokio::test]
async fn test_root_links_endpoints() {
    let inverter = FakeInverter::start(LINE_BODY).await;
    let addr = serve(app_state(&inverter)).await;

    let (status, body) = get(addr, "/").await;

    assert_eq!(status, 200);
    assert!(body.contains("/metrics"));
    assert!(body.contains("/api/points"));
}

#[tokio::test]
async fn test_setup_retries_until_inverter_answers() {
    // Given: An inverter whose first request times out
    let inverter = FakeInverter::start(LINE_BODY).await;
    inverter.slow_first(1, Duration::from_secs(2));
    let poller = Poller::new(
        inverter.client_with(PASSWORD, ResponseFormat::Auto, Duration::from_millis(200)),
        SnapshotStore::new(),
    );

    // When: Running setup with a short retry delay
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        setup_until_ready(&poller, Duration::from_millis(50)),
    )
    .await
    .expect("Setup did not finish");

    // Then: The second attempt succeeds
    let snapshot = result.expect("Setup failed");
    assert_eq!(snapshot.text("SN").as_deref(), Some("SX123456"));
    assert_eq!(inverter.requests(), 2);
}

#[tokio::test]
async fn test_setup_gives_up_on_rejected_credentials() {
    // Given: An inverter rejecting the request
    let inverter = FakeInverter::start(LINE_BODY).await;
    inverter.respond(401, "");
    let poller = Poller::new(inverter.client(ResponseFormat::Auto), SnapshotStore::new());

    // When: Running setup
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        setup_until_ready(&poller, Duration::from_millis(10)),
    )
    .await
    .expect("Setup did not finish");

    // Then: Setup fails after a single request
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Invalid credentials or setup"));
    assert_eq!(inverter.requests(), 1);
}
