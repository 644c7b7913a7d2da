//! Upstream liveness state.
//!
//! # States
//! - Healthy: upstream receives traffic
//! - Unhealthy: upstream skipped until its retry window opens
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: probe failure or failed forward attempt (records `since`)
//! Unhealthy → Healthy: probe success or delivered forward (clears `since`)
//! ```
//!
//! The timestamp lives inside the `Unhealthy` variant, so "timestamp set iff
//! unhealthy" holds by construction.

use std::time::{Duration, Instant};

/// Liveness of a single upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Liveness {
    #[default]
    Healthy,
    Unhealthy {
        /// When the upstream was marked down.
        since: Instant,
    },
}

/// Result of applying an observation to a [`Liveness`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Unhealthy → Healthy.
    Recovered,
    /// Healthy → Unhealthy.
    WentDown,
    /// No state change (metadata may still have been updated).
    Unchanged,
}

impl Liveness {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Liveness::Healthy)
    }

    /// Time the upstream was marked down, if it is down.
    pub fn since(&self) -> Option<Instant> {
        match self {
            Liveness::Healthy => None,
            Liveness::Unhealthy { since } => Some(*since),
        }
    }

    /// Healthy, or unhealthy for strictly longer than `retry_interval`.
    pub fn is_eligible(&self, now: Instant, retry_interval: Duration) -> bool {
        match self {
            Liveness::Healthy => true,
            Liveness::Unhealthy { since } => now.saturating_duration_since(*since) > retry_interval,
        }
    }

    /// How long the upstream has been down.
    pub fn downtime(&self, now: Instant) -> Option<Duration> {
        self.since().map(|since| now.saturating_duration_since(since))
    }

    /// Time left until the retry window opens. Zero once it is open.
    pub fn retry_in(&self, now: Instant, retry_interval: Duration) -> Option<Duration> {
        self.downtime(now)
            .map(|down| retry_interval.saturating_sub(down))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Liveness::Healthy => "UP",
            Liveness::Unhealthy { .. } => "DOWN",
        }
    }

    /// Apply a success observation.
    pub fn recover(&mut self) -> Transition {
        match self {
            Liveness::Healthy => Transition::Unchanged,
            Liveness::Unhealthy { .. } => {
                *self = Liveness::Healthy;
                Transition::Recovered
            }
        }
    }

    /// Apply a failure observation. An already-unhealthy state keeps the
    /// timestamp of the first failure in the episode.
    pub fn fail(&mut self, at: Instant) -> Transition {
        match self {
            Liveness::Healthy => {
                *self = Liveness::Unhealthy { since: at };
                Transition::WentDown
            }
            Liveness::Unhealthy { .. } => Transition::Unchanged,
        }
    }

    /// Apply a failure observation and restart the retry window at `at`.
    pub fn fail_and_rearm(&mut self, at: Instant) -> Transition {
        let was_healthy = self.is_healthy();
        *self = Liveness::Unhealthy { since: at };
        if was_healthy {
            Transition::WentDown
        } else {
            Transition::Unchanged
        }
    }
}
