//! Solax Inverter HTTP Client
//!
//! Fetches real-time telemetry from the inverter's embedded web server.
//!
//! # Protocol
//!
//! - **Endpoint**: `GET http://<host>/api/realTimeData.htm`
//! - **Authentication**: HTTP Basic, credentials passed through unmodified
//! - **Timeout**: bounded per request (default 10 seconds)
//! - **Body**: one of the two wire formats handled by [`crate::solax::parser`]
//!
//! # Example
//!
//! ```no_run
//! use solax_exporter::solax::{Connection, ResponseFormat, SolaxClient};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let connection = Connection::new("192.168.1.50", "admin", "secret");
//! let client = SolaxClient::new(connection, ResponseFormat::Auto, Duration::from_secs(10));
//! let snapshot = client.fetch_realtime().await?;
//! println!("{} fields", snapshot.len());
//! # Ok(())
//! # }
//! ```

use crate::config::InverterConfig;
use crate::error::{ExporterError, Result};
use crate::solax::parser::ResponseFormat;
use crate::solax::types::RawSnapshot;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Path of the real-time data endpoint on the inverter.
pub const API_REALTIME_DATA: &str = "/api/realTimeData.htm";

/// Where the inverter lives and how to authenticate. Immutable once built.
#[derive(Clone)]
pub struct Connection {
    host: String,
    username: String,
    password: SecretString,
}

impl Connection {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn realtime_url(&self) -> String {
        format!("http://{}{}", self.host, API_REALTIME_DATA)
    }
}

impl From<&InverterConfig> for Connection {
    fn from(config: &InverterConfig) -> Self {
        Self {
            host: config.host.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Client for one inverter.
///
/// The underlying `reqwest::Client` is a connection pool and may be shared
/// between several inverters via [`SolaxClient::with_http_client`].
pub struct SolaxClient {
    http: reqwest::Client,
    connection: Arc<Connection>,
    format: ResponseFormat,
    timeout: Duration,
}

impl SolaxClient {
    pub fn new(connection: Connection, format: ResponseFormat, timeout: Duration) -> Self {
        Self::with_http_client(reqwest::Client::new(), connection, format, timeout)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        connection: Connection,
        format: ResponseFormat,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            connection: Arc::new(connection),
            format,
            timeout,
        }
    }

    pub fn from_config(config: &InverterConfig) -> Self {
        Self::new(Connection::from(config), config.format, config.timeout())
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Fetch the response body without interpreting it.
    ///
    /// Any status other than 200 is an [`ExporterError::Http`].
    pub async fn fetch_body(&self) -> Result<String> {
        let url = self.connection.realtime_url();
        debug!("Requesting {}", url);

        let response = self
            .http
            .get(&url)
            .basic_auth(
                &self.connection.username,
                Some(self.connection.password.expose_secret()),
            )
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ExporterError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Received response from {}", url);
        Ok(body)
    }

    /// Fetch and parse one snapshot.
    pub async fn fetch_realtime(&self) -> Result<RawSnapshot> {
        let body = self.fetch_body().await?;
        Ok(self.format.parse(&body)?)
    }
}
