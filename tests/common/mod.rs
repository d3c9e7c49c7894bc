//! Fake Solax inverter for integration tests.
//!
//! Serves `/api/realTimeData.htm` on an ephemeral localhost port, checks HTTP
//! Basic credentials and records how many requests ran concurrently.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Router,
};
use solax_exporter::solax::{Connection, ResponseFormat, SolaxClient};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
/// `base64("admin:secret")`
const EXPECTED_AUTH: &str = "Basic YWRtaW46c2VjcmV0";

pub const LINE_BODY: &str = "method=uploadsn\n\
version=3.003.02\n\
type=X1-Hybrid\n\
SN=SX123456\n\
Status=Normal\n\
Data_0=230.5\n\
Data_1=1.2\n\
Data_6=240.1\n\
Data_8=-150\n\
Data_11=12.4\n\
Data_17=87\n";

pub const STRUCTURED_BODY: &str = r#"{"method":"uploadsn","version":"3.003.02","type":"X1-Hybrid","SN":"SX123456","Status":"Normal","Data":[230.5,1.2,,,276,0,240.1,1.1,-150,50.01,38,12.4,3456.7,52.1,-2.5,-130,24,87]}"#;

#[derive(Clone)]
struct Reply {
    status: u16,
    body: String,
    delay: Duration,
    /// The first `slow_first` requests are held for `slow_delay` instead.
    slow_first: usize,
    slow_delay: Duration,
}

struct Inner {
    reply: Mutex<Reply>,
    requests: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeInverter {
    inner: Arc<Inner>,
    pub addr: SocketAddr,
}

impl FakeInverter {
    pub async fn start(body: &str) -> Self {
        let inner = Arc::new(Inner {
            reply: Mutex::new(Reply {
                status: 200,
                body: body.to_string(),
                delay: Duration::ZERO,
                slow_first: 0,
                slow_delay: Duration::ZERO,
            }),
            requests: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/realTimeData.htm", get(realtime_handler))
            .with_state(inner.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake inverter");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { inner, addr }
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn respond(&self, status: u16, body: &str) {
        let mut reply = self.inner.reply.lock().unwrap();
        reply.status = status;
        reply.body = body.to_string();
    }

    pub fn set_delay(&self, delay: Duration) {
        self.inner.reply.lock().unwrap().delay = delay;
    }

    /// Hold the first `count` requests for `delay`, then answer normally.
    pub fn slow_first(&self, count: usize, delay: Duration) {
        let mut reply = self.inner.reply.lock().unwrap();
        reply.slow_first = count;
        reply.slow_delay = delay;
    }

    pub fn requests(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn client(&self, format: ResponseFormat) -> SolaxClient {
        self.client_with(PASSWORD, format, Duration::from_secs(2))
    }

    pub fn client_with(
        &self,
        password: &str,
        format: ResponseFormat,
        timeout: Duration,
    ) -> SolaxClient {
        SolaxClient::new(
            Connection::new(self.host(), USERNAME, password),
            format,
            timeout,
        )
    }
}

async fn realtime_handler(
    State(inner): State<Arc<Inner>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let index = inner.requests.fetch_add(1, Ordering::SeqCst);

    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(EXPECTED_AUTH);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string());
    }

    let running = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    inner.max_in_flight.fetch_max(running, Ordering::SeqCst);

    let reply = inner.reply.lock().unwrap().clone();
    let delay = if index < reply.slow_first {
        reply.slow_delay
    } else {
        reply.delay
    };
    tokio::time::sleep(delay).await;

    inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    let status = StatusCode::from_u16(reply.status).expect("valid status code");
    (status, reply.body)
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local addr");
    drop(listener);
    addr
}
