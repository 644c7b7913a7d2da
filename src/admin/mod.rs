//! Operational status endpoints.
//!
//! Read-only: nothing here mutates the registry. Only GET (and HEAD) is
//! answered here; other methods on these paths are forwarded upstream.

pub mod handlers;
pub mod report;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::config::StatusConfig;
use crate::http::server::{proxy_handler, AppState};

pub use report::{StatusReport, UpstreamStatus};

/// Status routes; merged ahead of the forwarding catch-all.
pub fn status_router(config: &StatusConfig) -> Router<AppState> {
    Router::new()
        .route(&config.html_path, get(get_status_page).fallback(proxy_handler))
        .route(&config.json_path, get(get_status_json).fallback(proxy_handler))
}
