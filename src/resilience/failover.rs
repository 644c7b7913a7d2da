//! Request forwarding with failover.
//!
//! # Responsibilities
//! - Walk a candidate list strictly in order, one attempt per upstream
//! - Bound every attempt with the per-attempt timeout
//! - Feed each outcome back into the upstream's liveness
//!
//! # Design Decisions
//! - Any HTTP response (4xx/5xx included) counts as delivered; only
//!   transport errors and timeouts advance to the next candidate
//! - Redirects are never followed (the legacy hyper client does not)
//! - No attempt fans out in parallel and no upstream is retried twice

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{request::Parts, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::health::passive;
use crate::http::headers::HeaderPolicy;
use crate::http::request::upstream_request;
use crate::load_balancer::{CandidateList, Upstream};
use crate::resilience::timeouts::{bounded, AttemptError};

/// One failed attempt.
#[derive(Debug)]
pub struct AttemptFailure {
    pub address: String,
    pub error: AttemptError,
}

/// A response obtained from one upstream.
#[derive(Debug)]
pub struct Delivered {
    pub upstream: Arc<Upstream>,
    pub response: Response<Incoming>,
    /// Candidates that failed before this one answered.
    pub failures: Vec<AttemptFailure>,
}

/// Result of forwarding one request.
#[derive(Debug)]
pub enum ForwardOutcome {
    Delivered(Delivered),
    /// Every candidate failed (or there were none).
    Exhausted { failures: Vec<AttemptFailure> },
}

/// Forwards requests to upstreams, failing over down a candidate list.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    attempt_timeout: Duration,
    headers: HeaderPolicy,
}

impl Forwarder {
    pub fn new(attempt_timeout: Duration, headers: HeaderPolicy) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            attempt_timeout,
            headers,
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Deliver the request to the first candidate that answers.
    pub async fn forward(
        &self,
        parts: &Parts,
        body: Bytes,
        candidates: &CandidateList,
    ) -> ForwardOutcome {
        let mut failures = Vec::new();

        for upstream in candidates.iter() {
            match self.attempt(upstream, parts, body.clone()).await {
                Ok(response) => {
                    passive::observe_delivery(upstream);
                    return ForwardOutcome::Delivered(Delivered {
                        upstream: upstream.clone(),
                        response,
                        failures,
                    });
                }
                Err(error) => {
                    passive::observe_attempt_failure(upstream, Instant::now(), &error);
                    failures.push(AttemptFailure {
                        address: upstream.address().to_string(),
                        error,
                    });
                }
            }
        }

        ForwardOutcome::Exhausted { failures }
    }

    async fn attempt(
        &self,
        upstream: &Upstream,
        parts: &Parts,
        body: Bytes,
    ) -> Result<Response<Incoming>, AttemptError> {
        let request = upstream_request(upstream, parts, body, &self.headers)?;
        bounded(self.attempt_timeout, self.client.request(request)).await
    }
}
