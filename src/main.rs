//! Health-aware HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                  LOAD BALANCER                   │
//!                         │                                                  │
//!     Client Request      │  ┌─────────┐   ┌────────────┐   ┌────────────┐   │
//!     ────────────────────┼─▶│  http   │──▶│ selection  │──▶│  failover  │───┼──▶ Upstream A
//!                         │  │ server  │   │  policy    │   │   engine   │───┼──▶ Upstream B
//!                         │  └─────────┘   └─────┬──────┘   └─────┬──────┘   │
//!                         │       │              │ reads          │ writes   │
//!                         │       │ status       ▼                ▼          │
//!                         │       └────────▶┌──────────────────────────┐     │
//!                         │                 │    upstream registry     │     │
//!                         │                 └──────────────────────────┘     │
//!                         │                              ▲ writes            │
//!                         │                 ┌──────────────────────────┐     │
//!                         │                 │  health monitor (probes) │─────┼──▶ GET /health
//!                         │                 └──────────────────────────┘     │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use failover_proxy::config::{self, ConfigError, ProxyConfig, UpstreamConfig};
use failover_proxy::observability::{logging, metrics};
use failover_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "failover-proxy")]
#[command(about = "Health-aware HTTP load balancer with failover", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Upstream address; repeat to list several. Replaces configured upstreams.
    #[arg(short, long = "upstream")]
    upstreams: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if !self.upstreams.is_empty() {
            config.upstreams = self.upstreams.into_iter().map(UpstreamConfig::new).collect();
        }

        config::validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!("failover-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstreams = ?config.upstreams.iter().map(|u| u.address.as_str()).collect::<Vec<_>>(),
        health_interval_secs = config.health_check.interval_secs,
        retry_interval_secs = config.failover.retry_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    error = %e,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let status_path = config.status.html_path.clone();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    tracing::info!(path = %status_path, "Upstream status page available");
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
