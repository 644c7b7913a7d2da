//! Startup orchestration.
//!
//! # Responsibilities
//! - Probe every upstream once before traffic is accepted
//! - Record upstreams that do not answer as down from the start

use crate::health::HealthMonitor;

/// Probe all upstreams once and log who answered. Returns the healthy count.
pub async fn verify_upstreams(monitor: &HealthMonitor) -> usize {
    tracing::info!("Verifying upstreams at startup");

    let outcomes = monitor.check_all().await;
    let mut healthy = 0;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(()) => {
                healthy += 1;
                tracing::info!(upstream = %outcome.address, "Upstream active");
            }
            Err(e) => {
                tracing::warn!(upstream = %outcome.address, error = %e, "Upstream not responding at startup");
            }
        }
    }

    tracing::info!(healthy, total = outcomes.len(), "Startup verification complete");
    healthy
}
