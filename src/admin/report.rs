//! Read-only status projection of the upstream registry.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::load_balancer::UpstreamSnapshot;

/// Per-upstream status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamStatus {
    pub address: String,
    /// "UP" or "DOWN".
    pub status: String,
    /// Whether the next request may be sent here.
    pub eligible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downtime_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_in_secs: Option<u64>,
}

/// Status of the whole pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub total: usize,
    pub healthy: usize,
    pub eligible: usize,
    pub retry_interval_secs: u64,
    pub upstreams: Vec<UpstreamStatus>,
}

impl StatusReport {
    pub fn from_snapshot(
        snapshot: &[UpstreamSnapshot],
        now: Instant,
        retry_interval: Duration,
    ) -> Self {
        let upstreams: Vec<UpstreamStatus> = snapshot
            .iter()
            .map(|entry| UpstreamStatus {
                address: entry.address.clone(),
                status: entry.liveness.label().to_string(),
                eligible: entry.liveness.is_eligible(now, retry_interval),
                downtime_secs: entry.liveness.downtime(now).map(|d| d.as_secs()),
                retry_in_secs: entry
                    .liveness
                    .retry_in(now, retry_interval)
                    .map(|d| d.as_secs()),
            })
            .collect();

        Self {
            total: upstreams.len(),
            healthy: snapshot.iter().filter(|e| e.liveness.is_healthy()).count(),
            eligible: upstreams.iter().filter(|u| u.eligible).count(),
            retry_interval_secs: retry_interval.as_secs(),
            upstreams,
        }
    }

    /// Self-refreshing HTML page.
    pub fn render_html(&self) -> String {
        let mut html = String::from(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Load Balancer Status</title>
    <meta http-equiv="refresh" content="5">
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; }
        h1 { color: #333; }
        .server { margin-bottom: 10px; padding: 10px; border-radius: 5px; }
        .up { background-color: #d4edda; color: #155724; }
        .down { background-color: #f8d7da; color: #721c24; }
        .summary { margin-top: 20px; font-weight: bold; }
    </style>
</head>
<body>
    <h1>Upstream Status</h1>
"#,
        );

        for upstream in &self.upstreams {
            let address = escape_html(&upstream.address);
            match (upstream.downtime_secs, upstream.retry_in_secs) {
                (Some(down), Some(retry)) => html.push_str(&format!(
                    "    <div class=\"server down\">{}: DOWN (for {} seconds, retry in {} seconds)</div>\n",
                    address, down, retry
                )),
                _ => html.push_str(&format!(
                    "    <div class=\"server up\">{}: ACTIVE</div>\n",
                    address
                )),
            }
        }

        html.push_str(&format!(
            "    <div class=\"summary\">Active upstreams: {} of {}</div>\n</body>\n</html>\n",
            self.healthy, self.total
        ));
        html
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
