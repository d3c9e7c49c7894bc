//! HTTP Server and Poll Loop
//!
//! This module implements the exporter HTTP server and wires it to the inverter
//! poll loop.
//!
//! # Startup
//!
//! 1. The first fetch ([`Poller::setup`]) validates host and credentials.
//!    - Transport failure: the inverter is not ready yet; retry after one poll interval.
//!    - Any other failure: credentials or setup are wrong; give up.
//! 2. The projection is materialized from that first snapshot.
//! 3. The poll loop and the HTTP server start.
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to the other endpoints
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - 200 if the last poll succeeded, 503 otherwise
//! - `GET /api/points` - Current data points as JSON
//! - `GET /api/device` - Inverter device description as JSON
//!
//! # Error Handling
//!
//! Failed poll cycles are logged as warnings and flip `solax_up` to 0. The last
//! good data points stay visible until the next successful cycle.

use crate::config::Config;
use crate::error::SetupError;
use crate::metrics::MetricsCollector;
use crate::poller::{PollResult, Poller};
use crate::projection::Projection;
use crate::snapshot::SnapshotStore;
use crate::solax::client::SolaxClient;
use crate::solax::types::RawSnapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub metrics: MetricsCollector,
    pub poller: Arc<Poller>,
    pub projection: Arc<Projection>,
}

impl AppState {
    pub fn new(poller: Arc<Poller>, projection: Arc<Projection>) -> anyhow::Result<Self> {
        Ok(Self {
            metrics: MetricsCollector::new()?,
            poller,
            projection,
        })
    }

    /// Refresh metrics from the outcome of one poll cycle.
    pub fn apply(&self, result: &PollResult) {
        match result {
            Ok(snapshot) => {
                let points = self.projection.read(snapshot);
                self.metrics.update_points(self.projection.host(), &points);
                self.metrics.update_device(&self.projection.device(snapshot));
                self.metrics.record_success(snapshot.len());
                info!("Updated {} data points", points.len());
            }
            Err(_) => self.metrics.record_failure(),
        }
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/api/points", get(points_handler))
        .route("/api/device", get(device_handler))
        .with_state(state)
}

/// Perform the first fetch, retrying every `retry_after` while the inverter is
/// merely unreachable. Any other failure ends setup.
pub async fn setup_until_ready(
    poller: &Poller,
    retry_after: Duration,
) -> anyhow::Result<Arc<RawSnapshot>> {
    loop {
        match poller.setup().await {
            Ok(snapshot) => return Ok(snapshot),
            Err(e @ SetupError::NotReady(_)) => {
                warn!("{}; retrying in {}s", e, retry_after.as_secs());
                tokio::time::sleep(retry_after).await;
            }
            Err(e @ SetupError::InvalidSetup(_)) => {
                error!("{}", e);
                return Err(e.into());
            }
        }
    }
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let client = SolaxClient::from_config(&config.inverter);
    let poller = Arc::new(Poller::new(client, SnapshotStore::new()));
    let projection = Arc::new(Projection::new(
        config.inverter.host.clone(),
        config.metrics.materialization,
    ));
    let state = AppState::new(poller.clone(), projection)?;

    let first = setup_until_ready(&poller, config.metrics.scrape_interval()).await?;
    state.projection.materialize(&first);
    state.apply(&Ok(first));

    // Start background polling
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_state = state.clone();
    let poll_task = tokio::spawn(poller.clone().run(
        config.metrics.scrape_interval(),
        shutdown_rx,
        move |result| loop_state.apply(result),
    ));

    let app = router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await?;

    shutdown_tx.send_replace(true);
    if let Err(e) = poll_task.await {
        warn!("Poll loop ended abnormally: {}", e);
    }

    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>Solax Exporter</title></head>
<body>
<h1>Solax Inverter Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
<p><a href="/api/points">Data points</a></p>
<p><a href="/api/device">Device</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let up_value = state.metrics.up.get();

    if up_value > 0.0 {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Solax inverter unreachable")
    }
}

async fn points_handler(State(state): State<AppState>) -> Response {
    let points = state
        .poller
        .store()
        .current()
        .map(|snapshot| state.projection.read(&snapshot))
        .unwrap_or_default();
    Json(points).into_response()
}

async fn device_handler(State(state): State<AppState>) -> Response {
    match state.poller.store().current() {
        Some(snapshot) => Json(state.projection.device(&snapshot)).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "No snapshot yet").into_response(),
    }
}
