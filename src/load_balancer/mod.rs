//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → pool.rs (registry of upstreams and their liveness)
//!     → selection policy (selection.rs: shuffle of eligible upstreams)
//!     → CandidateList (ordered, per request)
//!     → resilience::failover walks the list
//! ```
//!
//! # Design Decisions
//! - Selection is stateless; it recomputes from the registry on every call
//! - Selection performs no I/O
//! - Per-upstream state lives in backend.rs behind its own lock

pub mod backend;
pub mod pool;
pub mod selection;

use std::sync::Arc;
use std::time::Instant;

pub use backend::Upstream;
pub use pool::{RegistryError, UpstreamRegistry, UpstreamSnapshot};
pub use selection::RandomEligible;

/// Produces the ordered list of upstreams to try for one request.
pub trait SelectionPolicy: Send + Sync + std::fmt::Debug {
    fn candidates(&self, upstreams: &[Arc<Upstream>], now: Instant) -> CandidateList;
}

/// Ordered upstreams to attempt for a single request.
#[derive(Debug, Clone)]
pub struct CandidateList {
    upstreams: Vec<Arc<Upstream>>,
    fallback: bool,
}

impl CandidateList {
    pub fn new(upstreams: Vec<Arc<Upstream>>, fallback: bool) -> Self {
        Self {
            upstreams,
            fallback,
        }
    }

    /// True when nothing was eligible and the whole pool was returned.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Upstream>> {
        self.upstreams.iter()
    }

    pub fn len(&self) -> usize {
        self.upstreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.upstreams.iter().map(|u| u.address().to_string()).collect()
    }
}
