//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every upstream's liveness endpoint
//! - Update upstream liveness based on results
//! - Emit recovery and failure events on state changes

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{self, Instant as TokioInstant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::state::Transition;
use crate::load_balancer::{Upstream, UpstreamRegistry};
use crate::observability::metrics;
use crate::resilience::timeouts::{bounded, AttemptError};

/// Why a liveness probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error(transparent)]
    Attempt(#[from] AttemptError),
}

/// Result of probing one upstream.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub address: String,
    pub result: Result<(), ProbeError>,
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct HealthMonitor {
    registry: Arc<UpstreamRegistry>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<UpstreamRegistry>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        Self {
            registry,
            config,
            client,
        }
    }

    /// Probe on every interval until shutdown. Never gives up on an upstream.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let interval = self.config.interval();

        tracing::info!(
            interval_secs = self.config.interval_secs,
            timeout_ms = self.config.timeout_ms,
            path = %self.config.path,
            upstreams = self.registry.len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval_at(TokioInstant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every upstream concurrently and apply each result as it lands.
    ///
    /// A hanging upstream only delays its own result, bounded by the probe timeout.
    pub async fn check_all(&self) -> Vec<ProbeOutcome> {
        let mut probes = JoinSet::new();

        for upstream in self.registry.all() {
            let upstream = upstream.clone();
            let client = self.client.clone();
            let path = self.config.path.clone();
            let timeout = self.config.timeout();

            probes.spawn(async move {
                let result = probe(&client, &upstream, &path, timeout).await;
                apply(&upstream, &result);
                ProbeOutcome {
                    address: upstream.address().to_string(),
                    result,
                }
            });
        }

        let mut outcomes = Vec::with_capacity(probes.len());
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(error = %e, "Health probe task failed"),
            }
        }
        outcomes
    }
}

/// `GET <upstream><path>`; healthy only on 200.
pub async fn probe(
    client: &Client<HttpConnector, Body>,
    upstream: &Upstream,
    path: &str,
    timeout: std::time::Duration,
) -> Result<(), ProbeError> {
    let request = Request::builder()
        .method("GET")
        .uri(upstream.uri_for(path))
        .header("user-agent", "failover-proxy-health-check")
        .body(Body::empty())
        .map_err(AttemptError::from)?;

    let response = bounded(timeout, client.request(request)).await?;
    if response.status() == StatusCode::OK {
        Ok(())
    } else {
        Err(ProbeError::Status(response.status()))
    }
}

fn apply(upstream: &Upstream, result: &Result<(), ProbeError>) {
    let address = upstream.address();

    match result {
        Ok(()) => {
            if upstream.mark_healthy() == Transition::Recovered {
                tracing::info!(upstream = %address, "Health check: upstream recovered and active again");
            }
        }
        Err(e) => match upstream.mark_unhealthy(std::time::Instant::now()) {
            Transition::WentDown => {
                tracing::warn!(upstream = %address, error = %e, "Health check: upstream detected as down");
            }
            _ => {
                tracing::debug!(upstream = %address, error = %e, "Health check: upstream still down");
            }
        },
    }

    metrics::record_upstream_health(address, upstream.is_healthy());
}
