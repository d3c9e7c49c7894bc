//! Prometheus Metrics Definitions
//!
//! This module defines all Prometheus metrics exposed by the Solax exporter.
//!
//! # Metric Categories
//!
//! ## Measurements
//! - Numeric data points (voltages, currents, power, energy, temperatures, charge)
//! - Textual data points (serial number, status, firmware version) as info series
//!
//! ## Device
//! - Manufacturer, model and firmware of the inverter
//!
//! ## Exporter Health
//! - Whether the last poll succeeded, when it last succeeded, and how often it failed
//!
//! All metrics use the `solax_` namespace prefix.

use crate::projection::{DataPoint, DeviceInfo};
use crate::value::TypedValue;
use prometheus::{
    Encoder, Gauge, GaugeVec, IntCounter, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const NAMESPACE: &str = "solax";

/// Metrics collector for Solax inverters
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    // Data points
    pub measurement: Arc<GaugeVec>,
    pub info: Arc<IntGaugeVec>,

    // Device
    pub device_info: Arc<IntGaugeVec>,

    // Exporter health
    pub up: Arc<Gauge>,
    pub last_success_timestamp_seconds: Arc<Gauge>,
    pub poll_failures_total: Arc<IntCounter>,
    pub snapshot_fields: Arc<IntGauge>,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let measurement = GaugeVec::new(
            Opts::new("measurement", "Numeric reading reported by the inverter")
                .namespace(NAMESPACE),
            &["host", "key", "name", "unit", "device_class", "state_class"],
        )?;

        let info = IntGaugeVec::new(
            Opts::new(
                "info",
                "Textual reading reported by the inverter (value is always 1)",
            )
            .namespace(NAMESPACE),
            &["host", "key", "name", "value"],
        )?;

        let device_info = IntGaugeVec::new(
            Opts::new("device_info", "Inverter identity (value is always 1)")
                .namespace(NAMESPACE),
            &["host", "manufacturer", "model", "sw_version"],
        )?;

        let up = Gauge::with_opts(
            Opts::new("up", "Whether the last poll of the inverter succeeded (1=yes, 0=no)")
                .namespace(NAMESPACE),
        )?;

        let last_success_timestamp_seconds = Gauge::with_opts(
            Opts::new(
                "last_success_timestamp_seconds",
                "Unix time of the last successful poll",
            )
            .namespace(NAMESPACE),
        )?;

        let poll_failures_total = IntCounter::with_opts(
            Opts::new("poll_failures_total", "Number of failed poll cycles").namespace(NAMESPACE),
        )?;

        let snapshot_fields = IntGauge::with_opts(
            Opts::new(
                "snapshot_fields",
                "Number of fields in the current inverter snapshot",
            )
            .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(measurement.clone()))?;
        registry.register(Box::new(info.clone()))?;
        registry.register(Box::new(device_info.clone()))?;
        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(last_success_timestamp_seconds.clone()))?;
        registry.register(Box::new(poll_failures_total.clone()))?;
        registry.register(Box::new(snapshot_fields.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            measurement: Arc::new(measurement),
            info: Arc::new(info),
            device_info: Arc::new(device_info),
            up: Arc::new(up),
            last_success_timestamp_seconds: Arc::new(last_success_timestamp_seconds),
            poll_failures_total: Arc::new(poll_failures_total),
            snapshot_fields: Arc::new(snapshot_fields),
        })
    }

    /// Replace all data point series with `points`.
    ///
    /// Series for keys that are no longer present disappear.
    pub fn update_points(&self, host: &str, points: &[DataPoint]) {
        self.measurement.reset();
        self.info.reset();

        for point in points {
            match &point.value {
                TypedValue::Number(number) => {
                    let unit = point.unit.map(|u| u.symbol()).unwrap_or_default();
                    let device_class = point.device_class.map(|c| c.as_str()).unwrap_or_default();
                    let state_class = point.state_class.map(|s| s.as_str()).unwrap_or_default();
                    self.measurement
                        .with_label_values(&[
                            host,
                            point.key,
                            point.name.as_str(),
                            unit,
                            device_class,
                            state_class,
                        ])
                        .set(*number);
                }
                TypedValue::Text(text) => {
                    self.info
                        .with_label_values(&[host, point.key, point.name.as_str(), text.as_str()])
                        .set(1);
                }
                TypedValue::Unavailable => {}
            }
        }
    }

    pub fn update_device(&self, device: &DeviceInfo) {
        self.device_info.reset();
        self.device_info
            .with_label_values(&[
                device.identifier.as_str(),
                device.manufacturer,
                device.model.as_str(),
                device.sw_version.as_str(),
            ])
            .set(1);
    }

    /// Record a successful poll.
    pub fn record_success(&self, fields: usize) {
        self.up.set(1.0);
        self.snapshot_fields.set(fields as i64);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.last_success_timestamp_seconds.set(now);
    }

    /// Record a failed poll. Data point series are left as they are.
    pub fn record_failure(&self) {
        self.up.set(0.0);
        self.poll_failures_total.inc();
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
