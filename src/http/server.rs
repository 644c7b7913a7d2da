//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with status routes and the forwarding catch-all
//! - Wire up middleware (tracing, request ID)
//! - Run the startup probe and spawn the health monitor
//! - Dispatch each request through selection and failover

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use axum::http::header::InvalidHeaderName;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin;
use crate::config::ProxyConfig;
use crate::health::HealthMonitor;
use crate::http::headers::FORWARDING;
use crate::http::request::{self, MakeRequestUuidV4};
use crate::http::response;
use crate::lifecycle::startup;
use crate::load_balancer::{RandomEligible, RegistryError, SelectionPolicy, UpstreamRegistry};
use crate::observability::metrics;
use crate::resilience::failover::{ForwardOutcome, Forwarder};

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid upstream header name: {0}")]
    UpstreamHeader(#[from] InvalidHeaderName),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<UpstreamRegistry>,
    pub policy: Arc<dyn SelectionPolicy>,
    pub forwarder: Arc<Forwarder>,
    pub upstream_header: HeaderName,
    pub retry_interval: Duration,
    pub max_body_bytes: usize,
    /// Deadline for receiving the client body.
    pub body_timeout: Duration,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    registry: Arc<UpstreamRegistry>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let registry = Arc::new(UpstreamRegistry::new(&config.upstreams)?);
        let upstream_header = HeaderName::from_bytes(config.failover.upstream_header.as_bytes())?;
        let retry_interval = config.failover.retry_interval();

        let state = AppState {
            registry: registry.clone(),
            policy: Arc::new(RandomEligible::new(retry_interval)),
            forwarder: Arc::new(Forwarder::new(config.failover.attempt_timeout(), FORWARDING)),
            upstream_header,
            retry_interval,
            max_body_bytes: config.failover.max_body_bytes,
            body_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            registry,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// No whole-request timeout: it would cut failover short. Body reads and
    /// every upstream attempt carry their own deadlines.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new();
        if config.status.enabled {
            router = router.merge(admin::status_router(&config.status));
        }

        router
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        let monitor = HealthMonitor::new(self.registry.clone(), self.config.health_check.clone());
        if self.config.health_check.probe_on_startup {
            startup::verify_upstreams(&monitor).await;
        }

        if self.config.health_check.enabled {
            let monitor_shutdown = shutdown.resubscribe();
            tokio::spawn(monitor.run(monitor_shutdown));
        } else {
            tracing::info!("Active health checks disabled");
        }

        tracing::info!(
            address = %addr,
            upstreams = self.registry.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The shared upstream registry.
    pub fn registry(&self) -> Arc<UpstreamRegistry> {
        self.registry.clone()
    }
}

/// Main proxy handler.
/// Selects candidates, forwards with failover, relays the answer.
pub(crate) async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(request.headers()).to_string();
    let method = request.method().to_string();

    let (parts, body) = request.into_parts();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %parts.uri,
        "Proxying request"
    );

    let read = time::timeout(
        state.body_timeout,
        axum::body::to_bytes(body, state.max_body_bytes),
    )
    .await;
    let body = match read {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            let rejection = response::unreadable_body(&e);
            metrics::record_request(&method, rejection.status().as_u16(), "none", start_time);
            return rejection;
        }
        Err(_) => {
            tracing::warn!(
                request_id = %request_id,
                timeout_secs = state.body_timeout.as_secs(),
                "Timed out reading request body"
            );
            metrics::record_request(&method, StatusCode::REQUEST_TIMEOUT.as_u16(), "none", start_time);
            return response::body_timed_out();
        }
    };

    let candidates = state.policy.candidates(state.registry.all(), Instant::now());

    match state.forwarder.forward(&parts, body, &candidates).await {
        ForwardOutcome::Delivered(delivered) => {
            let address = delivered.upstream.address();
            let status = delivered.response.status();

            tracing::info!(
                request_id = %request_id,
                upstream = %address,
                status = %status,
                failed_attempts = delivered.failures.len(),
                "Request delivered"
            );
            metrics::record_request(&method, status.as_u16(), address, start_time);

            response::relay(
                address,
                &state.upstream_header,
                &FORWARDING,
                state.forwarder.attempt_timeout(),
                delivered.response,
            )
        }
        ForwardOutcome::Exhausted { failures } => {
            let last_error = failures
                .last()
                .map(|f| format!("{}: {}", f.address, f.error))
                .unwrap_or_else(|| "no upstreams configured".to_string());

            tracing::error!(
                severity = "critical",
                request_id = %request_id,
                attempts = failures.len(),
                last_error = %last_error,
                "All upstreams failed"
            );
            metrics::record_pool_exhausted();
            metrics::record_request(&method, StatusCode::SERVICE_UNAVAILABLE.as_u16(), "none", start_time);

            response::all_upstreams_failed()
        }
    }
}
