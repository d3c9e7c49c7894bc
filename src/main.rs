use anyhow::Result;
use clap::Parser;
use solax_exporter::{config::Config, server};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Inverter host or IP address (overrides config)
    #[arg(long, env = "SOLAX_HOST")]
    inverter_host: Option<String>,

    /// Inverter username (overrides config)
    #[arg(long, env = "SOLAX_USERNAME")]
    inverter_username: Option<String>,

    /// Inverter password (overrides config)
    #[arg(long, env = "SOLAX_PASSWORD", hide_env_values = true)]
    inverter_password: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Solax Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(host) = args.inverter_host {
        config.inverter.host = host;
    }
    if let Some(username) = args.inverter_username {
        config.inverter.username = username;
    }
    if let Some(password) = args.inverter_password {
        config.inverter.password = secrecy::SecretString::from(password);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    info!("Configuration loaded successfully");
    info!("Inverter host: {}", config.inverter.host);
    info!(
        "Poll interval: {}s, timeout: {}s, format: {:?}",
        config.metrics.scrape_interval_seconds,
        config.inverter.timeout_seconds,
        config.inverter.format
    );
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    // Start the metrics server
    if let Err(e) = server::start(config).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
