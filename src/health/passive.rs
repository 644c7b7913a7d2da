//! Passive health checking.
//!
//! # Responsibilities
//! - Observe forwarding outcomes
//! - Recover upstreams that answered a real request
//! - Mark upstreams down on transport failures and timeouts
//!
//! # Design Decisions
//! - Any HTTP status counts as a success; only transport errors fail
//! - A failed attempt restarts the upstream's retry window

use std::time::Instant;

use crate::health::state::Transition;
use crate::load_balancer::Upstream;
use crate::observability::metrics;
use crate::resilience::timeouts::AttemptError;

/// An upstream answered a forwarded request.
pub fn observe_delivery(upstream: &Upstream) {
    if upstream.mark_healthy() == Transition::Recovered {
        tracing::info!(upstream = %upstream.address(), "Upstream recovered and active again");
        metrics::record_upstream_health(upstream.address(), true);
    }
}

/// A forward attempt to `upstream` failed at `at`.
pub fn observe_attempt_failure(upstream: &Upstream, at: Instant, error: &AttemptError) {
    let transition = upstream.mark_attempt_failed(at);

    tracing::error!(
        upstream = %upstream.address(),
        error = %error,
        timeout = error.is_timeout(),
        "Error connecting to upstream"
    );
    metrics::record_attempt_failure(upstream.address());

    if transition == Transition::WentDown {
        metrics::record_upstream_health(upstream.address(), false);
    }
}
