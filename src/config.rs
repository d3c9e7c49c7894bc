use crate::error::ExporterError;
use crate::projection::Materialization;
use crate::solax::parser::ResponseFormat;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inverter: InverterConfig,
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InverterConfig {
    pub host: String,
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub format: ResponseFormat,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval_seconds: u64,
    #[serde(default)]
    pub materialization: Materialization,
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9101
}

fn default_timeout() -> u64 {
    10
}

fn default_scrape_interval() -> u64 {
    30
}

impl InverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl MetricsConfig {
    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_seconds)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("SOLAX_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Reject settings the poll loop cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.inverter.host.trim().is_empty() {
            return Err(ExporterError::Config(
                "inverter.host must not be empty".to_string(),
            ));
        }
        if self.inverter.username.trim().is_empty() {
            return Err(ExporterError::Config(
                "inverter.username must not be empty".to_string(),
            ));
        }
        if self.inverter.timeout_seconds == 0 {
            return Err(ExporterError::Config(
                "inverter.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.metrics.scrape_interval_seconds == 0 {
            return Err(ExporterError::Config(
                "metrics.scrape_interval_seconds must be greater than zero".to_string(),
            ));
        }
        // A fetch has to finish before the next tick is due.
        if self.inverter.timeout_seconds > self.metrics.scrape_interval_seconds {
            return Err(ExporterError::Config(format!(
                "inverter.timeout_seconds ({}) exceeds metrics.scrape_interval_seconds ({})",
                self.inverter.timeout_seconds, self.metrics.scrape_interval_seconds
            )));
        }
        Ok(())
    }
}
