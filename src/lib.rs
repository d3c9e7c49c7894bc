//! Solax Inverter Prometheus Exporter
//!
//! Polls the real-time data API of a Solax solar/battery inverter and republishes
//! every reading as an individually addressable, typed data point.
//!
//! # Overview
//!
//! The inverter's embedded web server answers `GET /api/realTimeData.htm` with one
//! of two loosely structured formats, depending on firmware. This exporter fetches
//! that body on a fixed interval, parses it tolerantly into a flat key → value
//! snapshot, and projects the snapshot through a static measurement catalog into
//! data points with units and measurement classes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   HTTP Basic auth    ┌─────────────────────────────┐
//! │   Solax     │ ◄─────────────────── │          Exporter           │
//! │  Inverter   │  realTimeData.htm    │                             │
//! └─────────────┘                      │  Poller ─► Parser ─► Store  │      HTTP      ┌────────────┐
//!                                      │                       │     │ ◄────────────► │ Prometheus │
//!                                      │  Catalog ─► Projection ◄┘    │   /metrics     └────────────┘
//!                                      └─────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`solax`] - HTTP client, response parser and raw snapshot types
//! - [`catalog`] - Measurement catalog and unit/class inference
//! - [`value`] - Best-effort numeric typing of raw readings
//! - [`snapshot`] - Store for the most recent snapshot
//! - [`poller`] - Poll state machine, setup probe and scheduled loop
//! - [`projection`] - Data points and device identity
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - HTTP server and startup sequence
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use solax_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod projection;
pub mod server;
pub mod snapshot;
pub mod solax;
pub mod value;
