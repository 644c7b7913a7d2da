//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream servers, in configured order.
    pub upstreams: Vec<UpstreamConfig>,

    /// Health monitor settings.
    pub health_check: HealthCheckConfig,

    /// Selection and forwarding settings.
    pub failover: FailoverConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Status endpoint settings.
    pub status: StatusConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstreams: default_upstreams(),
            health_check: HealthCheckConfig::default(),
            failover: FailoverConfig::default(),
            timeouts: TimeoutConfig::default(),
            status: StatusConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Configuration with the given upstream addresses and defaults elsewhere.
    pub fn with_upstreams<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            upstreams: addresses.into_iter().map(UpstreamConfig::new).collect(),
            ..Self::default()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A single upstream server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Base URL (`http://host:port`) or bare `host:port`.
    pub address: String,
}

impl UpstreamConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Parse the address into a base URL, assuming `http` when no scheme is given.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let address = self.address.trim();
        if address.contains("://") {
            Url::parse(address)
        } else {
            Url::parse(&format!("http://{}", address))
        }
    }
}

fn default_upstreams() -> Vec<UpstreamConfig> {
    vec![
        UpstreamConfig::new("http://localhost:5001"),
        UpstreamConfig::new("http://localhost:5002"),
    ]
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the background health monitor.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Path to probe on every upstream.
    pub path: String,

    /// Probe every upstream once before accepting traffic.
    pub probe_on_startup: bool,
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5,
            timeout_ms: 2_000,
            path: "/health".to_string(),
            probe_on_startup: true,
        }
    }
}

/// Selection and forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Seconds an unhealthy upstream waits before it is tried again.
    pub retry_interval_secs: u64,

    /// Timeout for one forward attempt in milliseconds.
    pub attempt_timeout_ms: u64,

    /// Response header naming the upstream that served the request.
    pub upstream_header: String,

    /// Maximum buffered request body size in bytes.
    pub max_body_bytes: usize,
}

impl FailoverConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: 30,
            attempt_timeout_ms: 3_000,
            upstream_header: "x-upstream-server".to_string(),
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Seconds allowed to receive the client's request body.
    ///
    /// Forwarding is not covered; each attempt has its own deadline.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Status endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Serve the status endpoints.
    pub enabled: bool,

    /// Path of the HTML status page.
    pub html_path: String,

    /// Path of the JSON status report.
    pub json_path: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            html_path: "/status".to_string(),
            json_path: "/status.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.health_check.interval(), Duration::from_secs(5));
        assert_eq!(config.health_check.timeout(), Duration::from_secs(2));
        assert_eq!(config.failover.retry_interval(), Duration::from_secs(30));
        assert_eq!(config.failover.attempt_timeout(), Duration::from_secs(3));
        assert_eq!(config.upstreams, default_upstreams());
    }

    #[test]
    fn test_parse_upstreams() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [[upstreams]]
            address = "http://10.0.0.1:5001"

            [[upstreams]]
            address = "10.0.0.2:5002"

            [failover]
            retry_interval_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.upstreams.len(), 2);
        assert_eq!(config.failover.retry_interval_secs, 10);
        assert_eq!(config.failover.attempt_timeout_ms, 3_000);
    }

    #[test]
    fn test_bare_address_assumes_http() {
        let url = UpstreamConfig::new("10.0.0.2:5002").base_url().unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("10.0.0.2"));
        assert_eq!(url.port(), Some(5002));
    }
}
