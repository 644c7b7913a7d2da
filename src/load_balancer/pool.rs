//! Upstream registry.
//!
//! # Responsibilities
//! - Own the fixed, ordered set of upstreams created at startup
//! - Look upstreams up by address
//! - Apply liveness updates atomically per upstream
//! - Produce consistent snapshots for selection and status reporting

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::health::state::{Liveness, Transition};
use crate::load_balancer::backend::Upstream;

/// Errors raised while building or addressing the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid upstream address `{address}`: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("upstream `{0}` registered twice")]
    Duplicate(String),

    #[error("no upstream registered as `{0}`")]
    Unknown(String),
}

/// Point-in-time copy of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSnapshot {
    pub address: String,
    pub liveness: Liveness,
}

/// The process-wide set of upstreams.
///
/// Entries are never added or removed after construction. Each entry guards
/// its own state, so updates to different upstreams never contend.
#[derive(Debug)]
pub struct UpstreamRegistry {
    upstreams: Vec<Arc<Upstream>>,
    by_address: HashMap<String, usize>,
}

impl UpstreamRegistry {
    /// Build the registry from configuration, preserving configured order.
    pub fn new(configs: &[UpstreamConfig]) -> Result<Self, RegistryError> {
        let mut upstreams = Vec::with_capacity(configs.len());
        let mut by_address = HashMap::with_capacity(configs.len());

        for config in configs {
            let base_url = config
                .base_url()
                .map_err(|source| RegistryError::InvalidAddress {
                    address: config.address.clone(),
                    source,
                })?;

            if by_address.contains_key(&config.address) {
                return Err(RegistryError::Duplicate(config.address.clone()));
            }
            by_address.insert(config.address.clone(), upstreams.len());
            upstreams.push(Arc::new(Upstream::new(config.address.clone(), base_url)));
        }

        Ok(Self {
            upstreams,
            by_address,
        })
    }

    /// All upstreams in configured order.
    pub fn all(&self) -> &[Arc<Upstream>] {
        &self.upstreams
    }

    pub fn len(&self) -> usize {
        self.upstreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }

    /// Shared handle to the upstream registered as `address`.
    pub fn upstream(&self, address: &str) -> Option<&Arc<Upstream>> {
        self.by_address.get(address).map(|&i| &self.upstreams[i])
    }

    /// Snapshot of the upstream registered as `address`.
    pub fn get(&self, address: &str) -> Option<UpstreamSnapshot> {
        self.upstream(address).map(|u| snapshot_of(u))
    }

    pub fn set_healthy(&self, address: &str) -> Result<Transition, RegistryError> {
        Ok(self.require(address)?.mark_healthy())
    }

    pub fn set_unhealthy(&self, address: &str, at: Instant) -> Result<Transition, RegistryError> {
        Ok(self.require(address)?.mark_unhealthy(at))
    }

    /// Ordered copy of every entry.
    pub fn snapshot(&self) -> Vec<UpstreamSnapshot> {
        self.upstreams.iter().map(|u| snapshot_of(u)).collect()
    }

    fn require(&self, address: &str) -> Result<&Arc<Upstream>, RegistryError> {
        self.upstream(address)
            .ok_or_else(|| RegistryError::Unknown(address.to_string()))
    }
}

fn snapshot_of(upstream: &Upstream) -> UpstreamSnapshot {
    UpstreamSnapshot {
        address: upstream.address().to_string(),
        liveness: upstream.liveness(),
    }
}
