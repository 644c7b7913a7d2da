//! Upstream abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Own the upstream's liveness state behind its own lock
//! - Build upstream URIs from the configured base URL

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

use crate::health::state::{Liveness, Transition};

/// A single upstream server.
#[derive(Debug)]
pub struct Upstream {
    /// Address as configured. Used as the registry key and in the upstream header.
    address: String,
    /// Parsed base URL.
    base_url: Url,
    /// Current liveness. Never held across I/O.
    liveness: Mutex<Liveness>,
}

impl Upstream {
    /// Create a new, healthy upstream.
    pub fn new(address: impl Into<String>, base_url: Url) -> Self {
        Self {
            address: address.into(),
            base_url,
            liveness: Mutex::new(Liveness::Healthy),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Absolute URI string for `path_and_query` on this upstream.
    pub fn uri_for(&self, path_and_query: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path_and_query.starts_with('/') {
            format!("{}{}", base, path_and_query)
        } else {
            format!("{}/{}", base, path_and_query)
        }
    }

    // --- Health Logic ---

    /// Copy of the current liveness.
    pub fn liveness(&self) -> Liveness {
        *self.lock()
    }

    pub fn is_healthy(&self) -> bool {
        self.lock().is_healthy()
    }

    pub fn is_eligible(&self, now: Instant, retry_interval: Duration) -> bool {
        self.lock().is_eligible(now, retry_interval)
    }

    /// Report a successful probe or delivered request.
    pub fn mark_healthy(&self) -> Transition {
        self.lock().recover()
    }

    /// Report a failure observed at `at`. Keeps the first timestamp of an episode.
    pub fn mark_unhealthy(&self, at: Instant) -> Transition {
        self.lock().fail(at)
    }

    /// Report a failed forward attempt at `at`, restarting the retry window.
    pub fn mark_attempt_failed(&self, at: Instant) -> Transition {
        self.lock().fail_and_rearm(at)
    }

    fn lock(&self) -> MutexGuard<'_, Liveness> {
        // Liveness is a plain Copy value; a poisoned guard still holds a valid one.
        self.liveness.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
