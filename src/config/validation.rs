//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate upstreams
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no upstreams configured")]
    NoUpstreams,

    #[error("upstream `{address}` is not a valid address: {reason}")]
    InvalidUpstream { address: String, reason: String },

    #[error("upstream `{0}` is configured more than once")]
    DuplicateUpstream(String),

    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),

    #[error("`{0}` is not a valid HTTP header name")]
    InvalidHeaderName(String),

    #[error("`{field}` must start with '/', got `{value}`")]
    InvalidPath { field: &'static str, value: String },

    #[error("status.html_path and status.json_path must differ")]
    StatusPathsCollide,

    #[error("`{field}` is not a valid socket address: `{value}`")]
    InvalidSocketAddr { field: &'static str, value: String },
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstreams.is_empty() {
        errors.push(ValidationError::NoUpstreams);
    }

    let mut seen = HashSet::new();
    for upstream in &config.upstreams {
        match upstream.base_url() {
            Ok(url) if url.scheme() != "http" => errors.push(ValidationError::InvalidUpstream {
                address: upstream.address.clone(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            }),
            Ok(url) if url.host_str().is_none() => errors.push(ValidationError::InvalidUpstream {
                address: upstream.address.clone(),
                reason: "missing host".to_string(),
            }),
            Ok(url) => {
                if !seen.insert(url.to_string()) {
                    errors.push(ValidationError::DuplicateUpstream(upstream.address.clone()));
                }
            }
            Err(e) => errors.push(ValidationError::InvalidUpstream {
                address: upstream.address.clone(),
                reason: e.to_string(),
            }),
        }
    }

    let non_zero = [
        ("health_check.interval_secs", config.health_check.interval_secs),
        ("health_check.timeout_ms", config.health_check.timeout_ms),
        ("failover.retry_interval_secs", config.failover.retry_interval_secs),
        ("failover.attempt_timeout_ms", config.failover.attempt_timeout_ms),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("failover.max_body_bytes", config.failover.max_body_bytes as u64),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if HeaderName::from_bytes(config.failover.upstream_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            config.failover.upstream_header.clone(),
        ));
    }

    let paths = [
        ("health_check.path", &config.health_check.path),
        ("status.html_path", &config.status.html_path),
        ("status.json_path", &config.status.json_path),
    ];
    for (field, value) in paths {
        if !value.starts_with('/') {
            errors.push(ValidationError::InvalidPath {
                field,
                value: value.clone(),
            });
        }
    }
    if config.status.html_path == config.status.json_path {
        errors.push(ValidationError::StatusPathsCollide);
    }

    let addrs = [
        ("listener.bind_address", &config.listener.bind_address),
        ("observability.metrics_address", &config.observability.metrics_address),
    ];
    for (field, value) in addrs {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidSocketAddr {
                field,
                value: value.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
